use chrono::Duration;
use checkout_engine::{
    db_types::{Money, OrderStatusType},
    order_objects::OrderItemRequest,
    test_utils::{
        prepare_env::tear_down,
        seed::{seed_address, seed_product},
    },
    CheckoutApiError,
    CheckoutDbError,
    ErrorKind,
    InventoryManagement,
};
use tokio::runtime::Runtime;

mod support;

use support::setup;

#[test]
fn order_is_priced_and_stock_reserved() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let sys = setup().await;
        let address = seed_address(&sys.db, 1).await;
        let p1 = seed_product(&sys.db, "Chopsticks", "5.50", 10).await;
        let p2 = seed_product(&sys.db, "Rice cooker", "100.00", 5).await;
        let items = vec![OrderItemRequest::new(p2.id, 3), OrderItemRequest::new(p1.id, 2)];
        let order = sys.orders.create_order(1, address.id, items).await.expect("Error creating order");
        assert_eq!(order.status, OrderStatusType::Pending);
        assert_eq!(order.total_amount, Money::from(31_100));
        assert_eq!(order.currency, "VND");
        assert_eq!(order.expires_at - order.created_at, Duration::minutes(15));
        assert!(!order.restocked);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_id, p1.id);
        assert_eq!(order.items[0].unit_price, Money::from(550));
        assert_eq!(order.items[1].line_total(), Money::from(30_000));

        let s1 = sys.db.fetch_stock(p1.id).await.unwrap().unwrap();
        let s2 = sys.db.fetch_stock(p2.id).await.unwrap().unwrap();
        assert_eq!(s1.quantity, 8);
        assert_eq!(s2.quantity, 2);

        let fetched = sys.orders.fetch_order_for_user(order.id, 1).await.expect("Error fetching order");
        assert_eq!(fetched.items, order.items);
        let err = sys.orders.fetch_order_for_user(order.id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        tear_down(sys.db).await;
    });
}

#[test]
fn insufficient_stock_rolls_back_every_line() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let sys = setup().await;
        let address = seed_address(&sys.db, 1).await;
        let plenty = seed_product(&sys.db, "Tea", "2.00", 10).await;
        let scarce = seed_product(&sys.db, "Teapot", "40.00", 1).await;
        let items = vec![OrderItemRequest::new(plenty.id, 4), OrderItemRequest::new(scarce.id, 2)];
        let err = sys.orders.create_order(1, address.id, items).await.unwrap_err();
        match err {
            CheckoutApiError::Storage(CheckoutDbError::InsufficientStock { product_id, available }) => {
                assert_eq!(product_id, scarce.id);
                assert_eq!(available, 1);
            },
            e => panic!("Unexpected error: {e}"),
        }
        assert_eq!(sys.db.fetch_stock(plenty.id).await.unwrap().unwrap().quantity, 10);
        assert_eq!(sys.db.fetch_stock(scarce.id).await.unwrap().unwrap().quantity, 1);
        assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
        tear_down(sys.db).await;
    });
}

#[test]
fn bad_requests_are_rejected_before_touching_stock() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let sys = setup().await;
        let mine = seed_address(&sys.db, 1).await;
        let theirs = seed_address(&sys.db, 2).await;
        let p = seed_product(&sys.db, "Lantern", "12.00", 3).await;

        let err = sys.orders.create_order(1, mine.id, vec![]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = sys.orders.create_order(1, mine.id, vec![OrderItemRequest::new(p.id, 0)]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let dupes = vec![OrderItemRequest::new(p.id, 1), OrderItemRequest::new(p.id, 1)];
        let err = sys.orders.create_order(1, mine.id, dupes).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = sys.orders.create_order(1, theirs.id, vec![OrderItemRequest::new(p.id, 1)]).await.unwrap_err();
        assert_eq!(err, CheckoutApiError::AddressNotOwned(theirs.id));
        let err = sys.orders.create_order(1, 9999, vec![OrderItemRequest::new(p.id, 1)]).await.unwrap_err();
        assert_eq!(err, CheckoutApiError::AddressNotFound(9999));

        let items = vec![OrderItemRequest::new(p.id, 1), OrderItemRequest::new(777, 1), OrderItemRequest::new(555, 1)];
        let err = sys.orders.create_order(1, mine.id, items).await.unwrap_err();
        assert_eq!(err, CheckoutApiError::ProductsNotFound(vec![555, 777]));

        assert_eq!(sys.db.fetch_stock(p.id).await.unwrap().unwrap().quantity, 3);
        tear_down(sys.db).await;
    });
}

#[test]
fn order_total_overflow_is_a_validation_error() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let sys = setup().await;
        let address = seed_address(&sys.db, 1).await;
        let p = seed_product(&sys.db, "Lantern", "12.00", 3).await;
        let items = vec![OrderItemRequest::new(p.id, i64::MAX / 100)];
        let err = sys.orders.create_order(1, address.id, items).await.unwrap_err();
        assert!(matches!(err, CheckoutApiError::Validation(_)), "Unexpected error: {err}");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(sys.db.fetch_stock(p.id).await.unwrap().unwrap().quantity, 3);
        assert!(sys.orders.orders_for_user(1).await.unwrap().is_empty());
        tear_down(sys.db).await;
    });
}
