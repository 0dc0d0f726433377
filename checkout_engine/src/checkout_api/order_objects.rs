use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{checkout_api::errors::CheckoutApiError, db_types::ProductId};

/// One line of a customer's order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderItemRequest {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

/// Rejects empty requests, repeated products and non-positive quantities.
pub fn validate_items(items: &[OrderItemRequest]) -> Result<(), CheckoutApiError> {
    if items.is_empty() {
        return Err(CheckoutApiError::Validation("An order needs at least one item".into()));
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(CheckoutApiError::Validation(format!(
                "Quantity for product {} must be positive, but was {}",
                item.product_id, item.quantity
            )));
        }
        if !seen.insert(item.product_id) {
            return Err(CheckoutApiError::Validation(format!(
                "Product {} appears more than once",
                item.product_id
            )));
        }
    }
    Ok(())
}
