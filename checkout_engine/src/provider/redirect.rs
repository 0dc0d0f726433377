use std::collections::BTreeMap;

use crate::{
    db_types::Payment,
    helpers::signature::{canonicalize, sign, SECURE_HASH},
    provider::{
        format_provider_time,
        ProviderConfig,
        PARAM_AMOUNT,
        PARAM_BANK_CODE,
        PARAM_COMMAND,
        PARAM_CREATE_DATE,
        PARAM_CURRENCY,
        PARAM_EXPIRE_DATE,
        PARAM_IP_ADDR,
        PARAM_LOCALE,
        PARAM_ORDER_INFO,
        PARAM_ORDER_TYPE,
        PARAM_RETURN_URL,
        PARAM_TMN_CODE,
        PARAM_TXN_REF,
        PARAM_VERSION,
        PAY_COMMAND,
    },
};

/// The parameters sent to the provider's payment page for `payment`.
///
/// Everything is derived from the stored payment, so rebuilding the URL for a reused session gives the same gateway
/// reference, amount and timestamps as the first time.
pub fn payment_params(config: &ProviderConfig, payment: &Payment) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    let mut put = |k: &str, v: String| {
        params.insert(k.to_string(), v);
    };
    put(PARAM_VERSION, config.version.clone());
    put(PARAM_COMMAND, PAY_COMMAND.to_string());
    put(PARAM_TMN_CODE, config.tmn_code.clone());
    put(PARAM_AMOUNT, payment.amount.value().to_string());
    put(PARAM_CURRENCY, payment.currency.clone());
    put(PARAM_TXN_REF, payment.gateway_ref.clone());
    put(PARAM_ORDER_INFO, format!("Payment for order {}", payment.order_id));
    put(PARAM_ORDER_TYPE, config.order_type.clone());
    put(PARAM_LOCALE, config.locale.clone());
    put(PARAM_RETURN_URL, config.return_url.clone());
    put(PARAM_IP_ADDR, payment.client_ip.clone());
    put(PARAM_CREATE_DATE, format_provider_time(payment.created_at, config.utc_offset));
    put(PARAM_EXPIRE_DATE, format_provider_time(payment.expires_at, config.utc_offset));
    if let Some(bank) = &config.bank_code {
        put(PARAM_BANK_CODE, bank.clone());
    }
    params
}

/// Builds the signed redirect URL to the provider's payment page.
pub fn build_payment_url(config: &ProviderConfig, payment: &Payment) -> String {
    let params = payment_params(config, payment);
    let query = canonicalize(&params);
    let hash = sign(&params, config.hash_secret.reveal());
    let separator = if config.pay_url.contains('?') { '&' } else { '?' };
    format!("{}{separator}{query}&{SECURE_HASH}={hash}", config.pay_url)
}
