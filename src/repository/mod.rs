//! Repository abstractions over persistent storage.
//!
//! The use cases and the reconciliation worker speak only these traits;
//! `adapters::postgres` provides the production implementation and tests
//! substitute in-memory doubles.

use async_trait::async_trait;

use crate::domain::{BalanceSummary, Order, OrderStatus, User, Withdrawal};
use crate::error::Result;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a user; a login collision surfaces as `AlreadyExists`.
    async fn create(&self, login: &str, password_hash: &str) -> Result<User>;

    async fn get_by_login(&self, login: &str) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<User>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts an order with conflict detection on the number.
    ///
    /// Returns `(order, true)` for a fresh insert, `(existing, false)` when
    /// the same user re-uploads the number, and `AlreadyExists` when the
    /// number belongs to another user.
    async fn create(&self, user_id: i64, number: &str) -> Result<(Order, bool)>;

    async fn get_by_number(&self, number: &str) -> Result<Order>;

    /// Orders for a user, newest upload first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>>;

    /// Atomically leases up to `limit` unfinished orders.
    ///
    /// Rows locked by a concurrent claim are skipped, so parallel callers
    /// receive disjoint sets. Every returned order has been transitioned to
    /// `PROCESSING`.
    async fn select_batch_for_processing(&self, limit: i64) -> Result<Vec<Order>>;

    /// Commits a status transition, crediting the owner's balance in the
    /// same transaction when the order first reaches `PROCESSED` with a
    /// positive accrual. Re-committing `PROCESSED` never credits twice.
    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        accrual: Option<f64>,
    ) -> Result<()>;
}

#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Balance summary; users without a ledger row get the zero summary.
    async fn get_summary(&self, user_id: i64) -> Result<BalanceSummary>;

    /// Debits `sum` points and appends the withdrawal record atomically.
    /// Fails with `InsufficientBalance` when the row is missing or too low.
    async fn withdraw(&self, user_id: i64, order_number: &str, sum: f64) -> Result<()>;
}

#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    /// Withdrawal history, newest first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>>;
}
