//! Deciding what to do when a customer asks to pay for an order.
use chrono::{DateTime, Utc};
use log::warn;

use crate::{
    db_types::{Order, OrderStatusType, Payment, PaymentStatus, UserId},
    traits::CheckoutDbError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Hand out the existing live session again.
    Reuse(Payment),
    /// Open a brand-new session.
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    /// `Initiated` sessions whose window has passed. They must be expired before acting.
    pub expire: Vec<Payment>,
    pub action: SessionAction,
}

/// Checks the payment preconditions for `order` and decides between reusing a session and creating one.
///
/// `payments` are the order's `Initiated` and `Succeeded` payments. The backend calls this inside the transaction that
/// carries out the plan.
pub fn plan_payment_session(
    order: &Order,
    user_id: UserId,
    provider_currency: &str,
    payments: &[Payment],
    now: DateTime<Utc>,
) -> Result<SessionPlan, CheckoutDbError> {
    if order.user_id != user_id {
        return Err(CheckoutDbError::NotOrderOwner(order.id));
    }
    if order.status != OrderStatusType::Pending {
        return Err(CheckoutDbError::OrderNotPayable { order_id: order.id, status: order.status });
    }
    if order.currency != provider_currency {
        return Err(CheckoutDbError::CurrencyMismatch {
            order_id: order.id,
            expected: provider_currency.to_string(),
            found: order.currency.clone(),
        });
    }
    if !order.total_amount.is_positive() {
        return Err(CheckoutDbError::NonPositiveAmount(order.id));
    }
    if payments.iter().any(|p| p.status == PaymentStatus::Succeeded) {
        return Err(CheckoutDbError::OrderAlreadyPaid(order.id));
    }
    let (expire, live): (Vec<Payment>, Vec<Payment>) = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Initiated)
        .cloned()
        .partition(|p| p.is_expired_at(now));
    if live.len() > 1 {
        warn!("💳️ Order #{} has {} live payment sessions. Reusing the newest one.", order.id, live.len());
    }
    let action = match live.into_iter().max_by_key(|p| (p.created_at, p.id)) {
        Some(p) => SessionAction::Reuse(p),
        None if order.is_expired_at(now) => return Err(CheckoutDbError::ReservationExpired(order.id)),
        None => SessionAction::Create,
    };
    Ok(SessionPlan { expire, action })
}
