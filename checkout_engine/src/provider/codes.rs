use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::PaymentStatus;

const SUCCESS_RESPONSE_CODE: &str = "00";
const SUCCESS_TRANSACTION_STATUS: &str = "00";
/// "Debit succeeded, but the transaction is suspected of fraud".
const SUSPICIOUS_RESPONSE_CODE: &str = "07";

/// The reply vocabulary the provider expects from an IPN endpoint.
///
/// The provider retries a callback until it receives one of these, so every callback must end in exactly one of them,
/// whatever happens internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnResponseCode {
    Success,
    OrderNotFound,
    AlreadyConfirmed,
    InvalidAmount,
    InvalidSignature,
    UnknownError,
}

impl IpnResponseCode {
    pub fn code(&self) -> &'static str {
        match self {
            IpnResponseCode::Success => "00",
            IpnResponseCode::OrderNotFound => "01",
            IpnResponseCode::AlreadyConfirmed => "02",
            IpnResponseCode::InvalidAmount => "04",
            IpnResponseCode::InvalidSignature => "97",
            IpnResponseCode::UnknownError => "99",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            IpnResponseCode::Success => "Confirm Success",
            IpnResponseCode::OrderNotFound => "Order not found",
            IpnResponseCode::AlreadyConfirmed => "Order already confirmed",
            IpnResponseCode::InvalidAmount => "Invalid amount",
            IpnResponseCode::InvalidSignature => "Invalid signature",
            IpnResponseCode::UnknownError => "Unknown error",
        }
    }
}

impl Display for IpnResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnResponse {
    #[serde(rename = "RspCode")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl From<IpnResponseCode> for IpnResponse {
    fn from(code: IpnResponseCode) -> Self {
        Self { code: code.code().to_string(), message: code.message().to_string() }
    }
}

/// Maps the provider's result codes onto a payment status.
///
/// Only the exact success pair is a success. The designated fraud-suspicion code is `Suspicious`. Everything else,
/// including missing codes, is a failure.
pub fn map_provider_outcome(response_code: Option<&str>, transaction_status: Option<&str>) -> PaymentStatus {
    match (response_code, transaction_status) {
        (Some(SUCCESS_RESPONSE_CODE), Some(SUCCESS_TRANSACTION_STATUS)) => PaymentStatus::Succeeded,
        (Some(SUSPICIOUS_RESPONSE_CODE), _) => PaymentStatus::Suspicious,
        _ => PaymentStatus::Failed,
    }
}

/// The code recorded as the reason a payment did not succeed. The response code is preferred; if it claims success,
/// the transaction status is the one that explains the failure.
pub fn failure_code_for(
    outcome: PaymentStatus,
    response_code: Option<&str>,
    transaction_status: Option<&str>,
) -> Option<String> {
    if outcome == PaymentStatus::Succeeded {
        return None;
    }
    match response_code {
        Some(code) if code != SUCCESS_RESPONSE_CODE => Some(code.to_string()),
        _ => transaction_status.or(response_code).map(str::to_string),
    }
}
