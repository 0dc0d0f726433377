//! Pure decisions made while reconciling a provider callback.
use crate::db_types::{Money, OrderStatusType, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDecision {
    Apply,
    AlreadyConfirmed,
}

/// Decides whether a callback reporting `outcome` may change a payment that is currently `current`.
///
/// Non-terminal payments always accept the result. Terminal payments only accept a late success on top of `Failed` or
/// `Expired`. Everything else, including any callback for a `Succeeded` payment, is a replay.
pub fn decide_callback(current: PaymentStatus, outcome: PaymentStatus) -> CallbackDecision {
    if current.can_transition_to(outcome) {
        CallbackDecision::Apply
    } else {
        CallbackDecision::AlreadyConfirmed
    }
}

/// The order status that follows from a payment outcome.
pub fn order_status_for(outcome: PaymentStatus) -> OrderStatusType {
    match outcome {
        PaymentStatus::Succeeded => OrderStatusType::Paid,
        _ => OrderStatusType::Failed,
    }
}

/// Reads a provider amount: a plain, unsigned integer count of minor units. Anything else is `None`.
pub fn parse_minor_units(raw: Option<&str>) -> Option<Money> {
    let raw = raw?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok().map(Money::from)
}
