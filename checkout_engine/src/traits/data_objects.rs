use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderId, Payment, PaymentResultUpdate, PaymentStatus, UserId};

/// Everything the backend needs to open (or reuse) a gateway session inside one transaction.
#[derive(Debug, Clone)]
pub struct PaymentSessionRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub provider: String,
    /// The currency the provider is configured to charge in.
    pub currency: String,
    /// Used only if a new payment has to be created.
    pub gateway_ref: String,
    pub client_ip: String,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentSessionRecord {
    pub order: Order,
    pub payment: Payment,
    /// True if `payment` was an existing live session rather than a freshly inserted one.
    pub reused: bool,
    /// Number of stale sessions that were expired while opening this one.
    pub expired: usize,
}

/// A provider callback that passed signature and merchant checks, normalised for the backend.
#[derive(Debug, Clone)]
pub struct PaymentNotification {
    pub gateway_ref: String,
    /// The amount the provider reports, in minor units. `None` if the reported value was not a plain integer.
    pub amount: Option<Money>,
    /// The status the provider result maps to.
    pub outcome: PaymentStatus,
    pub result: PaymentResultUpdate,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum NotificationOutcome {
    PaymentNotFound,
    /// The amount did not match the payment. Nothing was changed.
    InvalidAmount { payment: Payment },
    /// The payment is already in a terminal state that this callback may not change. Nothing was changed.
    AlreadyConfirmed { payment: Payment },
    /// The callback was applied. `order_changed` is true if the order's status moved as a result.
    Applied { payment: Payment, order: Order, order_changed: bool },
}

/// Keyset position in the restock scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockCursor {
    pub expires_at: DateTime<Utc>,
    pub id: OrderId,
}

impl From<&Order> for RestockCursor {
    fn from(order: &Order) -> Self {
        Self { expires_at: order.expires_at, id: order.id }
    }
}

#[derive(Debug, Clone)]
pub enum RestockOutcome {
    /// The order was failed and its stock released. The returned order carries its line items.
    Restocked(Order),
    Skipped(RestockSkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockSkipReason {
    /// The order was paid, failed, restocked or extended since it was selected.
    NoLongerEligible,
    /// A payment session for the order is still live, so the provider may yet complete it.
    PaymentInFlight,
}
