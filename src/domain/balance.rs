use serde::{Deserialize, Serialize};

/// Aggregated loyalty-point balance for a user.
///
/// A user without a ledger row has the zero summary; the repositories never
/// report a missing row as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub current: f64,
    pub withdrawn: f64,
}
