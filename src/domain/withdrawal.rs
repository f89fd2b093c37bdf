use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loyalty-point withdrawal transaction. Append-only; written in the same
/// transaction as the balance debit it records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub sum: f64,
    pub processed_at: DateTime<Utc>,
}
