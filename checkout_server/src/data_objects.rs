use std::fmt::Display;

use checkout_engine::{db_types::Order, order_objects::OrderItemRequest};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub address_id: i64,
    pub items: Vec<OrderItemRequest>,
}

/// An order as returned to its owner. The total is also given as a decimal string in the order's currency.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub total: String,
}

impl OrderResponse {
    pub fn new(order: Order, currency_scale: u32) -> Self {
        let total = order.total_amount.format_with_scale(currency_scale);
        Self { order, total }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
