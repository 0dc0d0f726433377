//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{catalog, db_url, inventory, new_pool, orders, payments};
use crate::{
    checkout_api::{
        reconciliation::{decide_callback, order_status_for, CallbackDecision},
        session_plan::{plan_payment_session, SessionAction},
    },
    db_types::{
        Address,
        InventoryRecord,
        NewAddress,
        NewOrder,
        NewPayment,
        NewProduct,
        Order,
        OrderId,
        Payment,
        PaymentResultUpdate,
        PaymentStatus,
        Product,
        ProductId,
        UserId,
    },
    helpers,
    traits::{
        AddressBook,
        CatalogManagement,
        CheckoutDatabase,
        CheckoutDbError,
        InventoryManagement,
        NotificationOutcome,
        OrderManagement,
        PaymentManagement,
        PaymentNotification,
        PaymentSessionRecord,
        PaymentSessionRequest,
        RestockCursor,
        RestockOutcome,
        RestockSkipReason,
    },
};

/// Failure code stored on a payment whose success arrived after another payment for the same order had already
/// succeeded. Such payments need a manual refund.
pub const DUPLICATE_SUCCESS_CODE: &str = "DUPLICATE_SUCCESS";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CKO_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Adds a product and its opening stock to the catalog. Catalog administration is otherwise out of scope for
    /// checkout; this exists for seeding and tests.
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        let product = catalog::insert_product(product, helpers::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Adds a shipping address. Address management is otherwise out of scope for checkout.
    pub async fn insert_address(&self, address: NewAddress) -> Result<Address, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let address = catalog::insert_address(address, helpers::now(), &mut conn).await?;
        Ok(address)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn reserve_stock(&self, product_id: ProductId, quantity: i64) -> Result<bool, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        inventory::reserve(product_id, quantity, helpers::now(), &mut conn).await
    }

    async fn release_stock(&self, product_id: ProductId, quantity: i64) -> Result<(), CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        inventory::release(product_id, quantity, helpers::now(), &mut conn).await
    }

    async fn fetch_stock(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let record = inventory::fetch_stock(product_id, &mut conn).await?;
        Ok(record)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_with_items(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn fetch_payment_by_gateway_ref(&self, gateway_ref: &str) -> Result<Option<Payment>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_by_gateway_ref(gateway_ref, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_products_by_ids(ids, &mut conn).await
    }
}

impl AddressBook for SqliteDatabase {
    async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let address = catalog::fetch_address(address_id, &mut conn).await?;
        Ok(address)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Reserves stock line by line and saves the order in a single transaction. The first line that cannot be
    /// reserved aborts the transaction, which rolls back every reservation made before it.
    async fn insert_order_with_reservations(&self, order: NewOrder) -> Result<Order, CheckoutDbError> {
        let now = order.created_at;
        let mut tx = self.pool.begin().await?;
        for item in order.items() {
            if !inventory::reserve(item.product_id, item.quantity, now, &mut tx).await? {
                let available = inventory::fetch_stock(item.product_id, &mut tx).await?.map(|r| r.quantity).unwrap_or(0);
                debug!(
                    "🗃️ Product {} has {available} in stock, but {} was requested. Rolling back order for user {}",
                    item.product_id, item.quantity, order.user_id
                );
                return Err(CheckoutDbError::InsufficientStock { product_id: item.product_id, available });
            }
        }
        let mut saved = orders::insert_order(&order, now, &mut tx).await?;
        saved.items = orders::insert_items(saved.id, order.items(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} saved with {} lines and stock reserved", saved.id, saved.items.len());
        Ok(saved)
    }

    async fn open_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<PaymentSessionRecord, CheckoutDbError> {
        let now = request.now;
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(request.order_id, &mut tx)
            .await?
            .ok_or(CheckoutDbError::OrderNotFound(request.order_id))?;
        let candidates = payments::fetch_initiated_or_succeeded(order.id, &mut tx).await?;
        let plan = plan_payment_session(&order, request.user_id, &request.currency, &candidates, now)?;
        for stale in &plan.expire {
            payments::expire_payment(stale, now, &mut tx).await?;
        }
        let expired = plan.expire.len();
        let (payment, reused) = match plan.action {
            SessionAction::Reuse(payment) => (payment, true),
            SessionAction::Create => {
                let new_payment = NewPayment {
                    order_id: order.id,
                    provider: request.provider,
                    amount: order.total_amount,
                    currency: order.currency.clone(),
                    gateway_ref: request.gateway_ref,
                    client_ip: request.client_ip,
                    created_at: now,
                    expires_at: order.expires_at,
                };
                (payments::insert_payment(new_payment, &mut tx).await?, false)
            },
        };
        tx.commit().await?;
        debug!(
            "🗃️ Payment session for order #{} [{}]: reused={reused}, {expired} stale sessions expired",
            order.id, payment.gateway_ref
        );
        Ok(PaymentSessionRecord { order, payment, reused, expired })
    }

    async fn apply_payment_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<NotificationOutcome, CheckoutDbError> {
        let now = notification.received_at;
        let mut tx = self.pool.begin().await?;
        let Some(payment) = payments::fetch_by_gateway_ref(&notification.gateway_ref, &mut tx).await? else {
            return Ok(NotificationOutcome::PaymentNotFound);
        };
        if notification.amount != Some(payment.amount) {
            warn!(
                "🗃️ Callback for payment [{}] reports amount {:?}, but {} was requested. Ignoring it.",
                payment.gateway_ref,
                notification.amount.map(|a| a.value()),
                payment.amount.value()
            );
            return Ok(NotificationOutcome::InvalidAmount { payment });
        }
        if decide_callback(payment.status, notification.outcome) == CallbackDecision::AlreadyConfirmed {
            debug!(
                "🗃️ Payment [{}] is already {}. Callback reporting {} is a replay.",
                payment.gateway_ref, payment.status, notification.outcome
            );
            return Ok(NotificationOutcome::AlreadyConfirmed { payment });
        }
        let order_id = payment.order_id;
        let outcome = notification.outcome;
        if outcome == PaymentStatus::Succeeded {
            if let Some(other) = payments::fetch_other_success(order_id, payment.id, &mut tx).await? {
                error!(
                    "🗃️ Payment [{}] succeeded, but payment [{}] already paid for order #{order_id}. Flagging it as \
                     suspicious. It must be refunded manually.",
                    payment.gateway_ref, other.gateway_ref
                );
                let result = PaymentResultUpdate {
                    failure_code: Some(DUPLICATE_SUCCESS_CODE.to_string()),
                    paid_at: None,
                    ..notification.result
                };
                let payment = payments::flag_duplicate_success(&payment, result, now, &mut tx).await?;
                let order = orders::fetch_order_with_items(order_id, &mut tx)
                    .await?
                    .ok_or(CheckoutDbError::OrderNotFound(order_id))?;
                tx.commit().await?;
                return Ok(NotificationOutcome::Applied { payment, order, order_changed: false });
            }
        }
        let payment = payments::apply_result(&payment, outcome, notification.result, now, &mut tx).await?;
        let changed = orders::update_status_unless_paid(order_id, order_status_for(outcome), now, &mut tx).await?;
        let order_changed = changed.is_some();
        let order = orders::fetch_order_with_items(order_id, &mut tx)
            .await?
            .ok_or(CheckoutDbError::OrderNotFound(order_id))?;
        if order_changed && order.restocked && outcome == PaymentStatus::Succeeded {
            warn!(
                "🗃️ Order #{order_id} was paid by [{}] after its stock had already been released. Stock levels need \
                 to be reconciled by hand.",
                payment.gateway_ref
            );
        }
        tx.commit().await?;
        Ok(NotificationOutcome::Applied { payment, order, order_changed })
    }

    async fn fetch_restock_candidates(
        &self,
        now: DateTime<Utc>,
        after: Option<RestockCursor>,
        limit: i64,
    ) -> Result<Vec<Order>, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let candidates = orders::fetch_restock_candidates(now, after, limit, &mut conn).await?;
        Ok(candidates)
    }

    async fn restock_order(&self, order_id: OrderId, now: DateTime<Utc>) -> Result<RestockOutcome, CheckoutDbError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(CheckoutDbError::OrderNotFound(order_id))?;
        if !order.is_restock_candidate(now) {
            trace!("🗃️ Order #{order_id} no longer needs restocking ({}, restocked={})", order.status, order.restocked);
            return Ok(RestockOutcome::Skipped(RestockSkipReason::NoLongerEligible));
        }
        if payments::has_live_session(order_id, now, &mut tx).await? {
            debug!("🗃️ Order #{order_id} has expired, but a payment session is still live. Leaving it for now.");
            return Ok(RestockOutcome::Skipped(RestockSkipReason::PaymentInFlight));
        }
        let Some(mut failed) = orders::fail_and_flag_restocked(order_id, now, &mut tx).await? else {
            return Ok(RestockOutcome::Skipped(RestockSkipReason::NoLongerEligible));
        };
        let items = orders::fetch_items(order_id, &mut tx).await?;
        for item in &items {
            inventory::release(item.product_id, item.quantity, now, &mut tx).await?;
        }
        failed.items = items;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} failed and {} lines returned to stock", failed.items.len());
        Ok(RestockOutcome::Restocked(failed))
    }

    async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, CheckoutDbError> {
        let mut conn = self.pool.acquire().await?;
        let count = payments::expire_stale(now, &mut conn).await?;
        Ok(count)
    }
}
