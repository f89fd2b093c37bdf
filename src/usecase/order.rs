use std::sync::Arc;

use crate::domain::{Order, OrderStatus};
use crate::error::{GophermartError, Result};
use crate::repository::OrderRepository;
use crate::validation::validate_order_number;

/// Order lifecycle operations.
pub struct OrderUseCase {
    orders: Arc<dyn OrderRepository>,
}

impl OrderUseCase {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Registers a new order for processing.
    ///
    /// Returns whether the order was newly created; a repeated upload by the
    /// same user returns the existing row with `false`.
    pub async fn register(&self, user_id: i64, number: &str) -> Result<(Order, bool)> {
        if !validate_order_number(number) {
            return Err(GophermartError::InvalidOrderNumber);
        }
        self.orders.create(user_id, number).await
    }

    /// Orders for a user, newest upload first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        self.orders.list_by_user(user_id).await
    }

    /// Leases a batch of unfinished orders for the reconciliation worker.
    pub async fn select_batch_for_processing(&self, limit: i64) -> Result<Vec<Order>> {
        self.orders.select_batch_for_processing(limit).await
    }

    /// Commits a status transition with its optional accrual.
    pub async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        accrual: Option<f64>,
    ) -> Result<()> {
        self.orders.update_status(order_id, status, accrual).await
    }
}
