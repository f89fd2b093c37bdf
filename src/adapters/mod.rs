pub mod accrual;
pub mod postgres;

pub use accrual::{AccrualHttpClient, AccrualProvider};
pub use postgres::PostgresStore;
