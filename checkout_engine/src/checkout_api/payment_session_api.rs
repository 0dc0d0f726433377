use std::fmt::Debug;

use log::*;

use crate::{
    checkout_api::{errors::CheckoutApiError, payment_objects::PaymentSession},
    db_types::{OrderId, UserId},
    helpers::{self, new_gateway_ref},
    provider::{build_payment_url, ProviderConfig},
    traits::{CheckoutDatabase, CheckoutDbError, PaymentSessionRecord, PaymentSessionRequest},
};

/// Fresh gateway references are random; give up after this many collisions in a row.
const MAX_REFERENCE_ATTEMPTS: usize = 3;

/// `PaymentSessionApi` hands out the provider redirect for an order, keeping at most one live session per order.
pub struct PaymentSessionApi<B> {
    db: B,
    provider: ProviderConfig,
}

impl<B> Debug for PaymentSessionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentSessionApi ({})", self.provider.name)
    }
}

impl<B> PaymentSessionApi<B> {
    pub fn new(db: B, provider: ProviderConfig) -> Self {
        Self { db, provider }
    }
}

impl<B> PaymentSessionApi<B>
where B: CheckoutDatabase
{
    /// Returns the signed redirect to the provider for `order_id`.
    ///
    /// If a session for the order is still live it is reused, and the same URL (same gateway reference, same
    /// timestamps) is rebuilt from it. Stale sessions are expired. Otherwise a new payment attempt is recorded.
    ///
    /// The caller must own the order, and the order must be `Pending`, unpaid, in the provider's currency and for a
    /// positive amount.
    pub async fn initiate_or_reuse(
        &self,
        order_id: OrderId,
        client_ip: &str,
        user_id: UserId,
    ) -> Result<PaymentSession, CheckoutApiError> {
        let now = helpers::now();
        let mut attempt = 0;
        let record = loop {
            attempt += 1;
            let request = PaymentSessionRequest {
                order_id,
                user_id,
                provider: self.provider.name.clone(),
                currency: self.provider.currency.clone(),
                gateway_ref: new_gateway_ref(order_id, now),
                client_ip: client_ip.to_string(),
                now,
            };
            match self.db.open_payment_session(request).await {
                Ok(record) => break record,
                Err(CheckoutDbError::PaymentAlreadyExists(r)) if attempt < MAX_REFERENCE_ATTEMPTS => {
                    warn!("💳️ Gateway reference {r} is already taken. Trying another one.");
                },
                Err(e) => return Err(e.into()),
            }
        };
        Ok(self.session_from(record))
    }

    fn session_from(&self, record: PaymentSessionRecord) -> PaymentSession {
        let PaymentSessionRecord { order, payment, reused, expired } = record;
        if expired > 0 {
            info!("💳️ {expired} stale payment sessions for order #{} were expired", order.id);
        }
        let redirect_url = build_payment_url(&self.provider, &payment);
        debug!(
            "💳️ Payment session [{}] for order #{} {}",
            payment.gateway_ref,
            order.id,
            if reused { "reused" } else { "created" }
        );
        PaymentSession {
            order_id: order.id,
            redirect_url,
            gateway_ref: payment.gateway_ref,
            expires_at: payment.expires_at,
            reused,
        }
    }
}
