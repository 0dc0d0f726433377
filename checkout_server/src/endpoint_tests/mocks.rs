use chrono::{DateTime, Utc};
use checkout_engine::{
    db_types::{Address, NewOrder, Order, OrderId, Payment, Product, ProductId, UserId},
    traits::{
        AddressBook,
        CatalogManagement,
        CheckoutDatabase,
        CheckoutDbError,
        NotificationOutcome,
        OrderManagement,
        PaymentManagement,
        PaymentNotification,
        PaymentSessionRecord,
        PaymentSessionRequest,
        RestockCursor,
        RestockOutcome,
    },
};
use mockall::mock;

mock! {
    pub CheckoutDb {}
    impl Clone for CheckoutDb {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for CheckoutDb {
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, CheckoutDbError>;
        async fn fetch_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutDbError>;
    }
    impl PaymentManagement for CheckoutDb {
        async fn fetch_payment_by_gateway_ref(&self, gateway_ref: &str) -> Result<Option<Payment>, CheckoutDbError>;
        async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, CheckoutDbError>;
    }
    impl CatalogManagement for CheckoutDb {
        async fn fetch_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CheckoutDbError>;
    }
    impl AddressBook for CheckoutDb {
        async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, CheckoutDbError>;
    }
    impl CheckoutDatabase for CheckoutDb {
        fn url(&self) -> &str;
        async fn insert_order_with_reservations(&self, order: NewOrder) -> Result<Order, CheckoutDbError>;
        async fn open_payment_session(&self, request: PaymentSessionRequest) -> Result<PaymentSessionRecord, CheckoutDbError>;
        async fn apply_payment_notification(&self, notification: PaymentNotification) -> Result<NotificationOutcome, CheckoutDbError>;
        async fn fetch_restock_candidates(&self, now: DateTime<Utc>, after: Option<RestockCursor>, limit: i64) -> Result<Vec<Order>, CheckoutDbError>;
        async fn restock_order(&self, order_id: OrderId, now: DateTime<Utc>) -> Result<RestockOutcome, CheckoutDbError>;
        async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, CheckoutDbError>;
    }
}
