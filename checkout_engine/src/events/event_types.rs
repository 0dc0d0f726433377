use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// Published once an order moves to `Paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnulmentReason {
    /// The provider reported a failed or suspicious payment.
    PaymentFailed,
    /// Nobody paid before the reservation window closed. The order's stock has been released.
    Expired,
}

/// Published once an order moves to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub reason: AnnulmentReason,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order, reason: AnnulmentReason) -> Self {
        Self { order, reason }
    }
}
