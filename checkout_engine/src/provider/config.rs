use chrono::{Duration, FixedOffset, Offset, Utc};
use checkout_common::{Secret, DEFAULT_CURRENCY_SCALE};

/// Merchant credentials and endpoints for the payment provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Stored on every payment row.
    pub name: String,
    /// The merchant (terminal) code issued by the provider.
    pub tmn_code: String,
    /// Shared secret for HMAC-SHA512 signatures in both directions.
    pub hash_secret: Secret<String>,
    /// The provider's hosted payment page.
    pub pay_url: String,
    /// Where the provider sends the customer's browser after payment.
    pub return_url: String,
    pub version: String,
    pub currency: String,
    pub locale: String,
    pub order_type: String,
    /// Preselects a bank or payment method on the provider's page, if set.
    pub bank_code: Option<String>,
    /// The provider's wall-clock timezone. `vnp_CreateDate`, `vnp_ExpireDate` and `vnp_PayDate` are local to it.
    pub utc_offset: FixedOffset,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "vnpay".to_string(),
            tmn_code: String::default(),
            hash_secret: Secret::default(),
            pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            return_url: "http://localhost:8360/payments/return".to_string(),
            version: "2.1.0".to_string(),
            currency: "VND".to_string(),
            locale: "vn".to_string(),
            order_type: "other".to_string(),
            bank_code: None,
            utc_offset: offset_from_hours(7),
        }
    }
}

/// A whole-hour offset east of UTC. Out-of-range values fall back to UTC.
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    hours.checked_mul(3600).and_then(FixedOffset::east_opt).unwrap_or_else(|| Utc.fix())
}

/// Checkout rules that are independent of the payment provider.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Currency every order is priced in. Products priced in another currency cannot be ordered.
    pub currency: String,
    /// Decimal places of one minor unit. Catalog prices are rounded (half away from zero) to this scale.
    pub currency_scale: u32,
    /// How long stock stays reserved for an unpaid order.
    pub reservation_window: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "VND".to_string(),
            currency_scale: DEFAULT_CURRENCY_SCALE,
            reservation_window: Duration::minutes(15),
        }
    }
}
