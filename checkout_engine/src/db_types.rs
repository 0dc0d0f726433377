//! Data types that are persisted by the checkout engine backends and returned from its public API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
pub use checkout_common::Money;
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub type ProductId = i64;
pub type OrderId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        Product        ---------------------------------------------------------
/// A catalog entry as seen by checkout. Prices are decimal amounts in major units of `currency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub initial_stock: i64,
}

//--------------------------------------    InventoryRecord    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Address        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub user_id: UserId,
    pub recipient: String,
    pub line1: String,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: UserId,
    pub recipient: String,
    pub line1: String,
    pub city: String,
    pub country: String,
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order holds reserved stock and is waiting for payment.
    Pending,
    /// A payment for the order succeeded.
    Paid,
    /// Payment failed, or the reservation window lapsed.
    Failed,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Paid => write!(f, "PAID"),
            OrderStatusType::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to PENDING");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: i64,
    pub status: OrderStatusType,
    pub total_amount: Money,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub restocked: bool,
    /// Line items are stored in their own table and are attached by the backend after loading the order row.
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// True if the restock job may still release this order's stock at `now`.
    pub fn is_restock_candidate(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatusType::Pending && !self.restocked && self.is_expired_at(now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// The catalog price at the moment the stock was reserved, in minor units.
    pub unit_price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    /// `None` if the line total does not fit in [`Money`].
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// An order that has been validated and priced, but not yet persisted.
///
/// Items are always held in ascending product id order. Backends reserve stock in this order, so that two checkouts
/// touching the same products always lock them in the same sequence.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub address_id: i64,
    pub currency: String,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Sorts the lines and computes the order total. Fails if any line total, or the order total, overflows.
    pub fn new(
        user_id: UserId,
        address_id: i64,
        currency: impl Into<String>,
        mut items: Vec<NewOrderItem>,
        created_at: DateTime<Utc>,
        reservation_window: Duration,
    ) -> Result<Self, ConversionError> {
        items.sort_by_key(|i| i.product_id);
        let total_amount = items
            .iter()
            .try_fold(Money::default(), |total, item| item.line_total().and_then(|line| total.checked_add(line)))
            .ok_or_else(|| ConversionError("The order total is too large to be represented".to_string()))?;
        Ok(Self {
            user_id,
            address_id,
            currency: currency.into(),
            total_amount,
            created_at,
            expires_at: created_at + reservation_window,
            items,
        })
    }

    pub fn items(&self) -> &[NewOrderItem] {
        &self.items
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// A gateway session was opened and the customer has been redirected to the provider.
    Initiated,
    /// The provider acknowledged the attempt but has not settled it.
    Pending,
    Succeeded,
    Failed,
    /// The session window lapsed without any callback.
    Expired,
    /// The provider reported the debit as suspicious, or a second success arrived for an already paid order.
    Suspicious,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Initiated | PaymentStatus::Pending)
    }

    /// Status changes are monotonic. Nothing leaves `Succeeded`, and the only terminal-to-terminal move is a late
    /// success arriving for a `Failed` or `Expired` payment.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match self {
            PaymentStatus::Initiated | PaymentStatus::Pending => true,
            PaymentStatus::Failed | PaymentStatus::Expired => next == PaymentStatus::Succeeded,
            PaymentStatus::Succeeded | PaymentStatus::Suspicious => false,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Initiated => "INITIATED",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Succeeded => "SUCCEEDED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Expired => "EXPIRED",
            PaymentStatus::Suspicious => "SUSPICIOUS",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIATED" => Ok(Self::Initiated),
            "PENDING" => Ok(Self::Pending),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "EXPIRED" => Ok(Self::Expired),
            "SUSPICIOUS" => Ok(Self::Suspicious),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub provider: String,
    pub amount: Money,
    pub currency: String,
    /// Our reference for the attempt. The provider echoes it back in every callback.
    pub gateway_ref: String,
    pub provider_txn_no: Option<String>,
    pub response_code: Option<String>,
    pub transaction_status: Option<String>,
    pub failure_code: Option<String>,
    pub bank_code: Option<String>,
    /// JSON object of every parameter received with the last applied callback, sorted, signature removed.
    pub raw_params: Option<String>,
    pub client_ip: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Payment {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub provider: String,
    pub amount: Money,
    pub currency: String,
    pub gateway_ref: String,
    pub client_ip: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The provider-reported result that is written onto a payment when a callback is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentResultUpdate {
    pub response_code: Option<String>,
    pub transaction_status: Option<String>,
    pub provider_txn_no: Option<String>,
    pub bank_code: Option<String>,
    pub raw_params: Option<String>,
    pub failure_code: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}
