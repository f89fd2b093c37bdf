pub mod accrual;
pub mod balance;
pub mod order;
pub mod user;
pub mod withdrawal;

pub use accrual::{AccrualResult, AccrualStatus};
pub use balance::BalanceSummary;
pub use order::{Order, OrderStatus};
pub use user::User;
pub use withdrawal::Withdrawal;
