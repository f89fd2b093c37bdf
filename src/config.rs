//! Application configuration.
//!
//! Values come from environment variables with CLI flags taking
//! precedence; missing or non-positive numerics silently fall back to the
//! defaults. The environment is read through an injectable lookup so
//! tests never touch process globals.

use std::time::Duration;

use crate::cli::Cli;
use crate::error::{GophermartError, Result};

const DEFAULT_RUN_ADDRESS: &str = ":8080";
const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
const DEFAULT_ORDER_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_WORKER_POOL_SIZE: usize = 4;
const DEFAULT_POLL_BATCH_SIZE: usize = 32;
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub run_address: String,
    pub database_uri: String,
    pub accrual_system_address: String,
    pub jwt_secret: String,
    pub order_poll_interval: Duration,
    pub worker_pool_size: usize,
    pub poll_batch_size: usize,
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Loads configuration from the process environment and CLI flags.
    pub fn load(cli: Cli) -> Result<Self> {
        Self::load_with(cli, |key| std::env::var(key).ok())
    }

    /// Loads configuration with an injected environment lookup.
    pub fn load_with(cli: Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let run_address = cli
            .run_address
            .or_else(|| env("RUN_ADDRESS"))
            .unwrap_or_else(|| DEFAULT_RUN_ADDRESS.to_string());

        let database_uri = cli
            .database_uri
            .or_else(|| env("DATABASE_URI"))
            .ok_or_else(|| {
                GophermartError::Config("database URI must be provided".to_string())
            })?;

        let accrual_system_address = cli
            .accrual_system_address
            .or_else(|| env("ACCRUAL_SYSTEM_ADDRESS"))
            .ok_or_else(|| {
                GophermartError::Config("accrual system address must be provided".to_string())
            })?;

        let jwt_secret = match cli.jwt_secret {
            Some(secret) => secret,
            None => match env("JWT_SECRET_FILE") {
                Some(path) => std::fs::read_to_string(&path)
                    .map_err(|e| {
                        GophermartError::Config(format!("read jwt secret file {path}: {e}"))
                    })?
                    .trim()
                    .to_string(),
                None => env("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            },
        };

        let order_poll_interval = resolve_duration(
            cli.order_poll_interval,
            env("ORDER_POLL_INTERVAL"),
            DEFAULT_ORDER_POLL_INTERVAL,
        )?;
        let shutdown_timeout = resolve_duration(
            cli.shutdown_timeout,
            env("SHUTDOWN_TIMEOUT"),
            DEFAULT_SHUTDOWN_TIMEOUT,
        )?;

        let worker_pool_size =
            resolve_count(cli.worker_pool_size, env("WORKER_POOL_SIZE"), DEFAULT_WORKER_POOL_SIZE);
        let poll_batch_size =
            resolve_count(cli.poll_batch_size, env("POLL_BATCH_SIZE"), DEFAULT_POLL_BATCH_SIZE);

        Ok(Self {
            run_address,
            database_uri,
            accrual_system_address,
            jwt_secret,
            order_poll_interval,
            worker_pool_size,
            poll_batch_size,
            shutdown_timeout,
        })
    }

    /// Bindable listen address: a bare `:port` binds all interfaces.
    pub fn listen_addr(&self) -> String {
        if self.run_address.starts_with(':') {
            format!("0.0.0.0{}", self.run_address)
        } else {
            self.run_address.clone()
        }
    }
}

/// A flag value must parse; an env value that doesn't parse falls back to
/// the default, as do zero durations.
fn resolve_duration(
    flag: Option<String>,
    env: Option<String>,
    default: Duration,
) -> Result<Duration> {
    if let Some(raw) = flag {
        let parsed = parse_duration(&raw).ok_or_else(|| {
            GophermartError::Config(format!("invalid duration: {raw}"))
        })?;
        return Ok(if parsed.is_zero() { default } else { parsed });
    }

    Ok(env
        .and_then(|raw| parse_duration(&raw))
        .filter(|d| !d.is_zero())
        .unwrap_or(default))
}

fn resolve_count(flag: Option<i64>, env: Option<String>, default: usize) -> usize {
    let value = flag.or_else(|| env.and_then(|raw| raw.trim().parse::<i64>().ok()));
    match value {
        Some(n) if n > 0 => n as usize,
        _ => default,
    }
}

/// Parses `500ms`, `3s`, `2m`, `1h` or a bare number of seconds.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let unit_start = raw.find(|c: char| c.is_ascii_alphabetic())?;
    let value: f64 = raw[..unit_start].parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let seconds = match &raw[unit_start..] {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return None,
    };
    Some(Duration::from_secs_f64(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal_env() -> impl Fn(&str) -> Option<String> {
        env(&[
            ("DATABASE_URI", "postgres://localhost/gophermart"),
            ("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8081"),
        ])
    }

    #[test]
    fn defaults_applied() {
        let config = Config::load_with(Cli::default(), minimal_env()).unwrap();
        assert_eq!(config.run_address, ":8080");
        assert_eq!(config.jwt_secret, "change-me-in-production");
        assert_eq!(config.order_poll_interval, Duration::from_secs(3));
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.poll_batch_size, 32);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_database_uri_fails() {
        let result = Config::load_with(
            Cli::default(),
            env(&[("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8081")]),
        );
        assert!(matches!(result, Err(GophermartError::Config(_))));
    }

    #[test]
    fn missing_accrual_address_fails() {
        let result = Config::load_with(
            Cli::default(),
            env(&[("DATABASE_URI", "postgres://localhost/gophermart")]),
        );
        assert!(matches!(result, Err(GophermartError::Config(_))));
    }

    #[test]
    fn env_values_resolved() {
        let config = Config::load_with(
            Cli::default(),
            env(&[
                ("DATABASE_URI", "postgres://localhost/gophermart"),
                ("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8081"),
                ("RUN_ADDRESS", ":9090"),
                ("ORDER_POLL_INTERVAL", "500ms"),
                ("WORKER_POOL_SIZE", "8"),
                ("POLL_BATCH_SIZE", "16"),
            ]),
        )
        .unwrap();
        assert_eq!(config.run_address, ":9090");
        assert_eq!(config.order_poll_interval, Duration::from_millis(500));
        assert_eq!(config.worker_pool_size, 8);
        assert_eq!(config.poll_batch_size, 16);
    }

    #[test]
    fn flags_override_env() {
        let cli = Cli {
            run_address: Some(":7000".to_string()),
            worker_pool_size: Some(2),
            ..Cli::default()
        };
        let config = Config::load_with(
            cli,
            env(&[
                ("DATABASE_URI", "postgres://localhost/gophermart"),
                ("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8081"),
                ("RUN_ADDRESS", ":9090"),
                ("WORKER_POOL_SIZE", "8"),
            ]),
        )
        .unwrap();
        assert_eq!(config.run_address, ":7000");
        assert_eq!(config.worker_pool_size, 2);
    }

    #[test]
    fn non_positive_values_replaced_by_defaults() {
        let cli = Cli {
            worker_pool_size: Some(0),
            poll_batch_size: Some(-5),
            order_poll_interval: Some("0s".to_string()),
            ..Cli::default()
        };
        let config = Config::load_with(cli, minimal_env()).unwrap();
        assert_eq!(config.worker_pool_size, DEFAULT_WORKER_POOL_SIZE);
        assert_eq!(config.poll_batch_size, DEFAULT_POLL_BATCH_SIZE);
        assert_eq!(config.order_poll_interval, DEFAULT_ORDER_POLL_INTERVAL);
    }

    #[test]
    fn malformed_env_numeric_falls_back() {
        let config = Config::load_with(
            Cli::default(),
            env(&[
                ("DATABASE_URI", "postgres://localhost/gophermart"),
                ("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8081"),
                ("WORKER_POOL_SIZE", "many"),
                ("ORDER_POLL_INTERVAL", "soon"),
            ]),
        )
        .unwrap();
        assert_eq!(config.worker_pool_size, DEFAULT_WORKER_POOL_SIZE);
        assert_eq!(config.order_poll_interval, DEFAULT_ORDER_POLL_INTERVAL);
    }

    #[test]
    fn malformed_flag_duration_errors() {
        let cli = Cli {
            order_poll_interval: Some("soon".to_string()),
            ..Cli::default()
        };
        assert!(matches!(
            Config::load_with(cli, minimal_env()),
            Err(GophermartError::Config(_))
        ));
    }

    #[test]
    fn jwt_secret_file_preferred_over_env() {
        let path = std::env::temp_dir().join("gophermart-jwt-secret-test");
        std::fs::write(&path, "file-secret\n").unwrap();

        let config = Config::load_with(
            Cli::default(),
            env(&[
                ("DATABASE_URI", "postgres://localhost/gophermart"),
                ("ACCRUAL_SYSTEM_ADDRESS", "http://localhost:8081"),
                ("JWT_SECRET", "env-secret"),
                ("JWT_SECRET_FILE", path.to_str().unwrap()),
            ]),
        )
        .unwrap();
        assert_eq!(config.jwt_secret, "file-secret");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn parse_duration_forms() {
        assert_eq!(parse_duration("3s"), Some(Duration::from_secs(3)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("-3s"), None);
    }

    #[test]
    fn listen_addr_normalizes_bare_port() {
        let mut config = Config::load_with(Cli::default(), minimal_env()).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");

        config.run_address = "127.0.0.1:9999".to_string();
        assert_eq!(config.listen_addr(), "127.0.0.1:9999");
    }
}
