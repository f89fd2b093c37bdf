use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered customer of the loyalty program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
