//! Composition root.
//!
//! Constructs the components in dependency order, runs until a shutdown
//! signal, then drives the two-phase teardown: cancel the root signal,
//! join the worker pool, bound the HTTP drain, close the pool last.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::adapters::{AccrualHttpClient, AccrualProvider, PostgresStore};
use crate::api::{self, AppState};
use crate::auth::{PasswordHasher, TokenService};
use crate::config::Config;
use crate::domain::{AccrualResult, Order, OrderStatus};
use crate::error::{GophermartError, Result};
use crate::repository::{
    BalanceRepository, OrderRepository, UserRepository, WithdrawalRepository,
};
use crate::usecase::{AuthUseCase, BalanceUseCase, OrderUseCase};
use crate::worker::{LoyaltyFacade, OrderProcessor, ProcessorConfig};

const DB_MAX_CONNECTIONS: u32 = 5;

/// Worker-facing facade over the order use case and the accrual client.
pub struct ReconciliationFacade {
    orders: Arc<OrderUseCase>,
    accruals: Arc<dyn AccrualProvider>,
}

impl ReconciliationFacade {
    pub fn new(orders: Arc<OrderUseCase>, accruals: Arc<dyn AccrualProvider>) -> Self {
        Self { orders, accruals }
    }
}

#[async_trait]
impl LoyaltyFacade for ReconciliationFacade {
    async fn orders_for_processing(&self, limit: i64) -> Result<Vec<Order>> {
        self.orders.select_batch_for_processing(limit).await
    }

    async fn check_accrual(&self, number: &str) -> Result<AccrualResult> {
        self.accruals.fetch(number).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        accrual: Option<f64>,
    ) -> Result<()> {
        self.orders.update_status(order_id, status, accrual).await
    }
}

/// Runs the application until SIGINT/SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let store = Arc::new(
        PostgresStore::connect(&config.database_uri, DB_MAX_CONNECTIONS).await?,
    );
    store.health_check().await?;

    let users: Arc<dyn UserRepository> = store.clone();
    let orders_repo: Arc<dyn OrderRepository> = store.clone();
    let balances_repo: Arc<dyn BalanceRepository> = store.clone();
    let withdrawals_repo: Arc<dyn WithdrawalRepository> = store.clone();

    let auth = Arc::new(AuthUseCase::new(
        users,
        PasswordHasher::default(),
        TokenService::new(&config.jwt_secret, None),
    ));
    let orders = Arc::new(OrderUseCase::new(orders_repo));
    let balance = Arc::new(BalanceUseCase::new(balances_repo, withdrawals_repo));

    let accruals: Arc<dyn AccrualProvider> =
        Arc::new(AccrualHttpClient::new(&config.accrual_system_address)?);

    let facade = Arc::new(ReconciliationFacade::new(orders.clone(), accruals));
    let mut processor = OrderProcessor::new(
        facade,
        ProcessorConfig::new(
            config.order_poll_interval,
            config.poll_batch_size,
            config.worker_pool_size,
        ),
    );
    processor.start();

    let state = AppState::new(auth, orders, balance);
    let router = api::create_router(state);
    let listener = TcpListener::bind(config.listen_addr()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(api::server::serve(listener, router, shutdown_rx));

    shutdown_signal().await;
    info!("shutdown signal received");

    // Phase one: cancel the root signal and join the worker pool.
    let _ = shutdown_tx.send(true);
    processor.stop().await;

    // Phase two: bound the HTTP drain, then close the pool.
    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => {
            return Err(GophermartError::Internal(format!("server task failed: {e}")));
        }
        Err(_) => warn!(
            timeout = ?config.shutdown_timeout,
            "graceful shutdown timed out"
        ),
    }

    store.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
