use std::sync::Arc;

use crate::domain::{BalanceSummary, Withdrawal};
use crate::error::{GophermartError, Result};
use crate::repository::{BalanceRepository, WithdrawalRepository};
use crate::validation::validate_order_number;

/// Ledger operations: summary, withdrawal, history.
pub struct BalanceUseCase {
    balances: Arc<dyn BalanceRepository>,
    withdrawals: Arc<dyn WithdrawalRepository>,
}

impl BalanceUseCase {
    pub fn new(
        balances: Arc<dyn BalanceRepository>,
        withdrawals: Arc<dyn WithdrawalRepository>,
    ) -> Self {
        Self {
            balances,
            withdrawals,
        }
    }

    /// Aggregated balance for a user; zero summary when no ledger row exists.
    pub async fn summary(&self, user_id: i64) -> Result<BalanceSummary> {
        self.balances.get_summary(user_id).await
    }

    /// Withdraws points against a future order number.
    pub async fn withdraw(&self, user_id: i64, order_number: &str, sum: f64) -> Result<()> {
        if !validate_order_number(order_number) {
            return Err(GophermartError::InvalidOrderNumber);
        }
        if sum <= 0.0 {
            return Err(GophermartError::InvalidAmount);
        }
        self.balances.withdraw(user_id, order_number, sum).await
    }

    /// Withdrawal history, newest first.
    pub async fn withdrawals_history(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        self.withdrawals.list_by_user(user_id).await
    }
}
