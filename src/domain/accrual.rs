use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Calculation status reported by the external accrual service.
///
/// The service may grow new states; anything unrecognized deserializes to
/// `Unknown` and keeps the order in rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
    #[serde(other)]
    Unknown,
}

impl AccrualStatus {
    /// Maps the accrual verdict onto the order state machine.
    pub fn order_status(&self) -> OrderStatus {
        match self {
            AccrualStatus::Registered | AccrualStatus::Processing | AccrualStatus::Unknown => {
                OrderStatus::Processing
            }
            AccrualStatus::Invalid => OrderStatus::Invalid,
            AccrualStatus::Processed => OrderStatus::Processed,
        }
    }
}

/// Accrual calculation details for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualResult {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
}
