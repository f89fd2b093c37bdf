//! Accrual reconciliation worker pool.
//!
//! One dispatcher task leases batches of unfinished orders on a fixed
//! interval and hands them to `worker_count` worker tasks over a bounded
//! channel. Workers consult the accrual service and commit status
//! transitions; every transient failure leaves the order to be re-leased
//! on a later tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{AccrualResult, Order, OrderStatus};
use crate::error::{GophermartError, Result};

/// The slice of application functionality the worker needs.
#[async_trait]
pub trait LoyaltyFacade: Send + Sync {
    /// Leases up to `limit` unfinished orders, transitioning them to
    /// `PROCESSING`.
    async fn orders_for_processing(&self, limit: i64) -> Result<Vec<Order>>;

    /// Queries the accrual service for one order number.
    async fn check_accrual(&self, number: &str) -> Result<AccrualResult>;

    /// Commits a status transition with its optional accrual.
    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        accrual: Option<f64>,
    ) -> Result<()>;
}

/// Worker pool configuration. Non-positive values fall back to 1.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub worker_count: usize,
}

impl ProcessorConfig {
    pub fn new(poll_interval: Duration, batch_size: usize, worker_count: usize) -> Self {
        Self {
            poll_interval,
            batch_size: batch_size.max(1),
            worker_count: worker_count.max(1),
        }
    }
}

/// Background order processor: dispatcher plus worker pool.
pub struct OrderProcessor {
    facade: Arc<dyn LoyaltyFacade>,
    config: ProcessorConfig,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl OrderProcessor {
    pub fn new(facade: Arc<dyn LoyaltyFacade>, config: ProcessorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            facade,
            config,
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Launches the dispatcher and worker tasks.
    pub fn start(&mut self) {
        let capacity = self.config.batch_size * self.config.worker_count;
        let (tx, rx) = mpsc::channel::<Order>(capacity);
        let rx = Arc::new(Mutex::new(rx));

        info!(
            workers = self.config.worker_count,
            batch_size = self.config.batch_size,
            poll_interval = ?self.config.poll_interval,
            "starting order processor"
        );

        for _ in 0..self.config.worker_count {
            let facade = self.facade.clone();
            let rx = rx.clone();
            let poll_interval = self.config.poll_interval;
            self.handles.push(tokio::spawn(async move {
                worker_loop(facade, rx, poll_interval).await;
            }));
        }

        let facade = self.facade.clone();
        let config = self.config.clone();
        let shutdown = self.shutdown.subscribe();
        self.handles.push(tokio::spawn(async move {
            dispatch_loop(facade, config, tx, shutdown).await;
        }));
    }

    /// Cancels the dispatcher and joins every task. Workers drain the
    /// orders already handed off before exiting.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
        info!("order processor stopped");
    }
}

async fn dispatch_loop(
    facade: Arc<dyn LoyaltyFacade>,
    config: ProcessorConfig,
    tx: mpsc::Sender<Order>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let orders = match facade.orders_for_processing(config.batch_size as i64).await {
                    Ok(orders) => orders,
                    Err(e) => {
                        error!(error = %e, "fetch orders for processing failed");
                        continue;
                    }
                };

                for order in orders {
                    tokio::select! {
                        _ = shutdown.changed() => return,
                        sent = tx.send(order) => {
                            if sent.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
    // Dropping the sender closes the channel; workers drain and exit.
}

async fn worker_loop(
    facade: Arc<dyn LoyaltyFacade>,
    rx: Arc<Mutex<mpsc::Receiver<Order>>>,
    poll_interval: Duration,
) {
    loop {
        // The lock is held only while waiting for a handoff, never while
        // processing, so peers keep draining the channel.
        let order = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };

        match order {
            Some(order) => handle_order(facade.as_ref(), order, poll_interval).await,
            None => break,
        }
    }
}

async fn handle_order(facade: &dyn LoyaltyFacade, order: Order, poll_interval: Duration) {
    let result = match facade.check_accrual(&order.number).await {
        Ok(result) => result,
        Err(GophermartError::RateLimited { retry_after }) => {
            warn!(order = %order.number, ?retry_after, "accrual rate limited");
            // Back-pressure by sleeping in this worker; the order was not
            // updated and will be re-leased on a later tick.
            tokio::time::sleep(retry_after).await;
            return;
        }
        Err(GophermartError::OrderNotRegistered) => {
            tokio::time::sleep(poll_interval).await;
            return;
        }
        Err(e) => {
            error!(order = %order.number, error = %e, "accrual fetch failed");
            return;
        }
    };

    let status = result.status.order_status();
    if let Err(e) = facade
        .update_order_status(order.id, status, result.accrual)
        .await
    {
        error!(order = %order.number, error = %e, "update order status failed");
    }
}
