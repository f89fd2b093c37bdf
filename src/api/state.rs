use std::sync::Arc;

use crate::usecase::{AuthUseCase, BalanceUseCase, OrderUseCase};

/// Shared handler state: one Arc per use case, so each handler family
/// depends only on the capability it needs.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthUseCase>,
    pub orders: Arc<OrderUseCase>,
    pub balance: Arc<BalanceUseCase>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthUseCase>,
        orders: Arc<OrderUseCase>,
        balance: Arc<BalanceUseCase>,
    ) -> Self {
        Self {
            auth,
            orders,
            balance,
        }
    }
}
