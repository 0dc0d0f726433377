//! The payment provider's wire protocol.
//!
//! The checkout engine speaks one provider protocol: a VNPAY-style hosted payment page. The customer is redirected to
//! the provider with a signed query string, and the provider reports the result with a signed server-to-server
//! callback (IPN) and a signed browser redirect back to the shop. Parameter names, result codes and timestamp formats
//! of that protocol are kept in this module; the rest of the engine only sees [`ProviderConfig`], [`IpnResponse`]
//! and the helpers exported here.
mod codes;
mod config;
mod redirect;
mod time;

pub use codes::{failure_code_for, map_provider_outcome, IpnResponse, IpnResponseCode};
pub use config::{offset_from_hours, CheckoutConfig, ProviderConfig};
pub use redirect::build_payment_url;
pub use time::{format_provider_time, parse_provider_time};

/// Every provider parameter starts with this prefix. Anything else in a callback is ignored.
pub const PARAM_PREFIX: &str = "vnp_";

pub const PARAM_VERSION: &str = "vnp_Version";
pub const PARAM_COMMAND: &str = "vnp_Command";
pub const PARAM_TMN_CODE: &str = "vnp_TmnCode";
pub const PARAM_AMOUNT: &str = "vnp_Amount";
pub const PARAM_CURRENCY: &str = "vnp_CurrCode";
pub const PARAM_TXN_REF: &str = "vnp_TxnRef";
pub const PARAM_ORDER_INFO: &str = "vnp_OrderInfo";
pub const PARAM_ORDER_TYPE: &str = "vnp_OrderType";
pub const PARAM_LOCALE: &str = "vnp_Locale";
pub const PARAM_RETURN_URL: &str = "vnp_ReturnUrl";
pub const PARAM_IP_ADDR: &str = "vnp_IpAddr";
pub const PARAM_CREATE_DATE: &str = "vnp_CreateDate";
pub const PARAM_EXPIRE_DATE: &str = "vnp_ExpireDate";
pub const PARAM_BANK_CODE: &str = "vnp_BankCode";
pub const PARAM_RESPONSE_CODE: &str = "vnp_ResponseCode";
pub const PARAM_TRANSACTION_STATUS: &str = "vnp_TransactionStatus";
pub const PARAM_TRANSACTION_NO: &str = "vnp_TransactionNo";
pub const PARAM_PAY_DATE: &str = "vnp_PayDate";

pub const PAY_COMMAND: &str = "pay";
