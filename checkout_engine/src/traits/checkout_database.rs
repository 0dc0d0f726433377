use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, ProductId},
    traits::{
        data_objects::{
            NotificationOutcome,
            PaymentNotification,
            PaymentSessionRecord,
            PaymentSessionRequest,
            RestockCursor,
            RestockOutcome,
        },
        AddressBook,
        CatalogManagement,
        OrderManagement,
        PaymentManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the checkout engine.
///
/// Every method is a single atomic unit of work. Implementations must run each one inside one database transaction and
/// re-validate every precondition inside that transaction before writing, so that concurrent callers, provider
/// retries and overlapping maintenance passes can never apply the same side effect twice.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: Clone + OrderManagement + PaymentManagement + CatalogManagement + AddressBook {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Reserves stock for every line of `order`, in the order the lines are held (ascending product id), and persists
    /// the order and its lines.
    ///
    /// If any reservation fails, nothing is written and [`CheckoutDbError::InsufficientStock`] names the first product
    /// that could not be reserved, together with its available quantity.
    async fn insert_order_with_reservations(&self, order: NewOrder) -> Result<Order, CheckoutDbError>;

    /// Opens a gateway session for an order, or reuses the one that is still live.
    ///
    /// Stale `Initiated` payments for the order are moved to `Expired` along the way. A new payment is only inserted
    /// (using the gateway reference in the request) if no live session exists.
    async fn open_payment_session(&self, request: PaymentSessionRequest)
        -> Result<PaymentSessionRecord, CheckoutDbError>;

    /// Reconciles a verified provider callback against the payment it refers to, and the payment's order.
    ///
    /// Signature and merchant checks happen before this call. Amount validation, the idempotency decision and all the
    /// resulting writes happen inside one transaction.
    async fn apply_payment_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<NotificationOutcome, CheckoutDbError>;

    /// Pending, not-yet-restocked orders whose reservation expired before `now`, soonest-expired first.
    ///
    /// Pass the cursor of the last order of the previous page to fetch the next one.
    async fn fetch_restock_candidates(
        &self,
        now: DateTime<Utc>,
        after: Option<RestockCursor>,
        limit: i64,
    ) -> Result<Vec<Order>, CheckoutDbError>;

    /// Fails an expired order and returns its stock to the inventory ledger, exactly once.
    ///
    /// The candidate is re-checked inside the transaction. If it no longer qualifies, the result is
    /// [`RestockOutcome::Skipped`] and nothing is written. An order that has vanished is an error.
    async fn restock_order(&self, order_id: OrderId, now: DateTime<Utc>) -> Result<RestockOutcome, CheckoutDbError>;

    /// Moves every `Initiated` payment whose session expired before `now` to `Expired`. Returns the number of payments
    /// changed.
    async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, CheckoutDbError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Stock quantities must be positive, but got {0}")]
    InvalidQuantity(i64),
    #[error("Insufficient stock for product {product_id}. Only {available} available")]
    InsufficientStock { product_id: ProductId, available: i64 },
    #[error("There is no inventory record for product {0}")]
    InventoryRecordNotFound(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} does not belong to the requesting user")]
    NotOrderOwner(OrderId),
    #[error("Order {order_id} cannot be paid for while it is {status}")]
    OrderNotPayable { order_id: OrderId, status: OrderStatusType },
    #[error("The stock reservation for order {0} has expired")]
    ReservationExpired(OrderId),
    #[error("Order {0} has already been paid")]
    OrderAlreadyPaid(OrderId),
    #[error("Order {order_id} is priced in {found}, but payments are only accepted in {expected}")]
    CurrencyMismatch { order_id: OrderId, expected: String, found: String },
    #[error("Order {0} does not have a positive amount to pay")]
    NonPositiveAmount(OrderId),
    #[error("Cannot insert payment, since it already exists with reference {0}")]
    PaymentAlreadyExists(String),
    #[error("Payment {0} was modified by someone else while it was being updated")]
    PaymentVersionConflict(i64),
    #[error("Illegal payment status change. {0}")]
    PaymentStatusUpdateError(String),
}

impl From<sqlx::Error> for CheckoutDbError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutDbError::DatabaseError(e.to_string())
    }
}
