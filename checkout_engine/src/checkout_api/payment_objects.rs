use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, PaymentStatus};

/// What a customer gets back when asking to pay: where to go, and how long the session lasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub order_id: OrderId,
    pub redirect_url: String,
    pub gateway_ref: String,
    pub expires_at: DateTime<Utc>,
    pub reused: bool,
}

/// The result of checking the provider's browser redirect. Purely informational: nothing is changed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnInspection {
    pub signature_valid: bool,
    pub gateway_ref: Option<String>,
    pub response_code: Option<String>,
    /// What the provider's codes say happened. Only meaningful if the signature is valid.
    pub outcome: PaymentStatus,
}

impl ReturnInspection {
    pub fn succeeded(&self) -> bool {
        self.signature_valid && self.outcome == PaymentStatus::Succeeded
    }
}

/// Totals from one restock pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockSummary {
    pub restocked: u64,
    pub skipped: u64,
    pub failed: u64,
}
