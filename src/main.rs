use clap::Parser;
use tracing_subscriber::EnvFilter;

use gophermart::{app, Cli, Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli)?;

    app::run(config).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gophermart=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
