use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
};

use log::*;

use crate::{
    checkout_api::{errors::CheckoutApiError, payment_objects::ReturnInspection, reconciliation::parse_minor_units},
    db_types::{OrderStatusType, PaymentResultUpdate, PaymentStatus},
    events::{AnnulmentReason, EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    helpers::{self, signature},
    provider::{
        failure_code_for,
        map_provider_outcome,
        parse_provider_time,
        IpnResponse,
        IpnResponseCode,
        ProviderConfig,
        PARAM_AMOUNT,
        PARAM_BANK_CODE,
        PARAM_PAY_DATE,
        PARAM_PREFIX,
        PARAM_RESPONSE_CODE,
        PARAM_TMN_CODE,
        PARAM_TRANSACTION_NO,
        PARAM_TRANSACTION_STATUS,
        PARAM_TXN_REF,
    },
    traits::{CheckoutDatabase, NotificationOutcome, PaymentNotification},
};

/// `IpnApi` reconciles the payment provider's asynchronous callbacks with local payment and order state.
///
/// Callbacks are retried by the provider until it gets a well-formed answer, and may arrive more than once, late, or
/// out of order. Every call therefore ends in one of the provider's [`IpnResponseCode`]s, and replays are answered
/// with [`IpnResponseCode::AlreadyConfirmed`] without touching anything.
pub struct IpnApi<B> {
    db: B,
    provider: ProviderConfig,
    producers: EventProducers,
}

impl<B> Debug for IpnApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IpnApi ({})", self.provider.name)
    }
}

impl<B> IpnApi<B> {
    pub fn new(db: B, provider: ProviderConfig, producers: EventProducers) -> Self {
        Self { db, provider, producers }
    }

    /// Keeps only the provider's own parameters.
    fn provider_params(raw: HashMap<String, String>) -> BTreeMap<String, String> {
        raw.into_iter().filter(|(k, _)| k.starts_with(PARAM_PREFIX)).collect()
    }

    /// Checks the signature on the provider's browser redirect and reports what it claims. Nothing is written; the
    /// IPN is the only source of truth for payment state.
    pub fn inspect_return(&self, raw: HashMap<String, String>) -> ReturnInspection {
        let params = Self::provider_params(raw);
        let signature_valid = signature::verify(&params, self.provider.hash_secret.reveal());
        if !signature_valid {
            warn!("🔐️ Return URL hit with an invalid signature");
        }
        let response_code = params.get(PARAM_RESPONSE_CODE).cloned();
        let outcome = map_provider_outcome(
            response_code.as_deref(),
            params.get(PARAM_TRANSACTION_STATUS).map(String::as_str),
        );
        ReturnInspection { signature_valid, gateway_ref: params.get(PARAM_TXN_REF).cloned(), response_code, outcome }
    }
}

impl<B> IpnApi<B>
where B: CheckoutDatabase
{
    /// Processes one provider callback and returns the reply the provider expects. This never fails: internal errors
    /// are logged and answered with [`IpnResponseCode::UnknownError`], so that the provider retries.
    pub async fn process_provider_callback(&self, raw: HashMap<String, String>) -> IpnResponse {
        let code = match self.reconcile(raw).await {
            Ok(code) => code,
            Err(e) => {
                error!("💳️ Could not process payment callback: {e}");
                IpnResponseCode::UnknownError
            },
        };
        IpnResponse::from(code)
    }

    async fn reconcile(&self, raw: HashMap<String, String>) -> Result<IpnResponseCode, CheckoutApiError> {
        // Everything the provider sent is kept for audit, not just the signed fields.
        let received = signature::strip_hash_fields(&raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        let params = Self::provider_params(raw);
        if !signature::verify(&params, self.provider.hash_secret.reveal()) {
            warn!("🔐️ Payment callback with an invalid or missing signature was rejected");
            return Ok(IpnResponseCode::InvalidSignature);
        }
        let params = signature::strip_hash_fields(&params);
        let field = |name: &str| params.get(name).map(String::as_str).filter(|v| !v.trim().is_empty());
        if field(PARAM_TMN_CODE) != Some(self.provider.tmn_code.as_str()) {
            warn!("💳️ Payment callback for merchant {:?} does not match our merchant code", field(PARAM_TMN_CODE));
            return Ok(IpnResponseCode::OrderNotFound);
        }
        let Some(gateway_ref) = field(PARAM_TXN_REF) else {
            warn!("💳️ Signed payment callback without a transaction reference");
            return Ok(IpnResponseCode::UnknownError);
        };
        let response_code = field(PARAM_RESPONSE_CODE);
        let transaction_status = field(PARAM_TRANSACTION_STATUS);
        let outcome = map_provider_outcome(response_code, transaction_status);
        let paid_at = field(PARAM_PAY_DATE).and_then(|s| {
            let t = parse_provider_time(s, self.provider.utc_offset);
            if t.is_none() {
                debug!("💳️ Ignoring unreadable pay date '{s}' for payment [{gateway_ref}]");
            }
            t
        });
        let raw_params = serde_json::to_string(&received).map_err(|e| CheckoutApiError::Validation(e.to_string()))?;
        let notification = PaymentNotification {
            gateway_ref: gateway_ref.to_string(),
            amount: parse_minor_units(params.get(PARAM_AMOUNT).map(String::as_str)),
            outcome,
            result: PaymentResultUpdate {
                response_code: response_code.map(str::to_string),
                transaction_status: transaction_status.map(str::to_string),
                provider_txn_no: field(PARAM_TRANSACTION_NO).map(str::to_string),
                bank_code: field(PARAM_BANK_CODE).map(str::to_string),
                raw_params: Some(raw_params),
                failure_code: failure_code_for(outcome, response_code, transaction_status),
                paid_at: if outcome == PaymentStatus::Succeeded { paid_at } else { None },
            },
            received_at: helpers::now(),
        };
        let code = match self.db.apply_payment_notification(notification).await? {
            NotificationOutcome::PaymentNotFound => {
                info!("💳️ Payment callback for unknown reference [{gateway_ref}]");
                IpnResponseCode::OrderNotFound
            },
            NotificationOutcome::InvalidAmount { .. } => IpnResponseCode::InvalidAmount,
            NotificationOutcome::AlreadyConfirmed { payment } => {
                debug!("💳️ Payment [{gateway_ref}] was already {}", payment.status);
                IpnResponseCode::AlreadyConfirmed
            },
            NotificationOutcome::Applied { payment, order, order_changed } => {
                info!(
                    "💳️ Payment [{gateway_ref}] for order #{} is now {}. Order is {}",
                    order.id, payment.status, order.status
                );
                if order_changed {
                    match order.status {
                        OrderStatusType::Paid => {
                            self.producers.publish_order_paid(OrderPaidEvent::new(order, payment)).await;
                        },
                        OrderStatusType::Failed => {
                            let event = OrderAnnulledEvent::new(order, AnnulmentReason::PaymentFailed);
                            self.producers.publish_order_annulled(event).await;
                        },
                        OrderStatusType::Pending => {},
                    }
                }
                IpnResponseCode::Success
            },
        };
        Ok(code)
    }
}
