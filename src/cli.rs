use clap::Parser;

/// Loyalty points backend for the storefront.
///
/// Every flag has an environment-variable counterpart; flags win when
/// both are set.
#[derive(Parser, Debug, Default)]
#[command(name = "gophermart", about = "Loyalty points backend")]
pub struct Cli {
    /// HTTP server listen address
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,

    /// PostgreSQL DSN
    #[arg(short = 'd', long = "database-uri")]
    pub database_uri: Option<String>,

    /// Accrual system base URL (absolute)
    #[arg(short = 'r', long = "accrual-address")]
    pub accrual_system_address: Option<String>,

    /// Secret for signing auth tokens
    #[arg(long = "jwt-secret")]
    pub jwt_secret: Option<String>,

    /// Interval between accrual polls (e.g. 3s, 500ms)
    #[arg(long = "poll-interval")]
    pub order_poll_interval: Option<String>,

    /// Number of concurrent order workers
    #[arg(long = "worker-pool")]
    pub worker_pool_size: Option<i64>,

    /// Maximum orders per polling batch
    #[arg(long = "poll-batch")]
    pub poll_batch_size: Option<i64>,

    /// Graceful shutdown timeout (e.g. 10s)
    #[arg(long = "shutdown-timeout")]
    pub shutdown_timeout: Option<String>,
}
