use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db_types::OrderId;

/// Creates a fresh gateway reference for a payment attempt on `order_id`.
///
/// The format is `{order_id}{yyMMddHHmmss}{nnnn}`: digits only and well below the provider's 100 character limit. The
/// timestamp and the random suffix make collisions between attempts for the same order very unlikely; the unique
/// index on `payments.gateway_ref` catches the rest.
pub fn new_gateway_ref(order_id: OrderId, now: DateTime<Utc>) -> String {
    let suffix = rand::thread_rng().gen_range(0..10_000u32);
    format!("{order_id}{}{suffix:04}", now.format("%y%m%d%H%M%S"))
}
