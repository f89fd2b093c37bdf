//! HTTP client for the external accrual calculator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::error;

use crate::domain::AccrualResult;
use crate::error::{GophermartError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Source of accrual verdicts, abstracted so worker tests can script
/// responses.
#[async_trait]
pub trait AccrualProvider: Send + Sync {
    /// Queries the calculator for one order number.
    ///
    /// `OrderNotRegistered` and `RateLimited` surface as error variants;
    /// the caller decides how long to back off.
    async fn fetch(&self, number: &str) -> Result<AccrualResult>;
}

/// Accrual client speaking the `GET /api/orders/<number>` protocol.
#[derive(Clone)]
pub struct AccrualHttpClient {
    http: Client,
    base_url: String,
}

impl AccrualHttpClient {
    /// Builds a client. The base URL must be absolute http(s).
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| GophermartError::Config(format!("parse accrual url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
            return Err(GophermartError::Config(
                "accrual url must be absolute".into(),
            ));
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AccrualProvider for AccrualHttpClient {
    async fn fetch(&self, number: &str) -> Result<AccrualResult> {
        let url = format!("{}/api/orders/{}", self.base_url, number);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => Ok(resp.json::<AccrualResult>().await?),
            StatusCode::NO_CONTENT => Err(GophermartError::OrderNotRegistered),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(parse_retry_after)
                    .unwrap_or(DEFAULT_RETRY_AFTER);
                Err(GophermartError::RateLimited { retry_after })
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "accrual request failed");
                Err(GophermartError::Accrual(format!(
                    "unexpected status {status}"
                )))
            }
        }
    }
}

/// Parses a `Retry-After` header value: integer seconds or an HTTP-date.
/// Anything unparseable falls back to the 5 second default.
fn parse_retry_after(header: &str) -> Duration {
    let header = header.trim();
    if header.is_empty() {
        return DEFAULT_RETRY_AFTER;
    }

    if let Ok(seconds) = header.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(when) = chrono::DateTime::parse_from_rfc2822(header) {
        let delta = when.signed_duration_since(chrono::Utc::now());
        return delta.to_std().unwrap_or(DEFAULT_RETRY_AFTER);
    }

    DEFAULT_RETRY_AFTER
}
