use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, TimeZone, Utc};
use checkout_engine::{
    db_types::{Address, Money, NewOrder, Order, OrderItem, OrderStatusType, Product},
    provider::CheckoutConfig,
    traits::CheckoutDbError,
    OrderFlowApi,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request},
    mocks::MockCheckoutDb,
};
use crate::routes::{CreateOrderRoute, OrderByIdRoute};

const OWNER: i64 = 1;
const STRANGER: i64 = 2;

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let body = json!({"address_id": 5, "items": [{"product_id": 1, "quantity": 2}, {"product_id": 2, "quantity": 1}]});
    let (status, body) = post_request(Some(OWNER), "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["user_id"], OWNER);
    // 2 x 100.00 + 1 x 111.00
    assert_eq!(order["total_amount"], 31_100);
    assert_eq!(order["total"], "311.00");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn create_order_without_identity() {
    let _ = env_logger::try_init().ok();
    let body = json!({"address_id": 5, "items": [{"product_id": 1, "quantity": 1}]});
    let (status, _) = post_request(None, "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_order_with_bad_lines() {
    let _ = env_logger::try_init().ok();
    let body = json!({"address_id": 5, "items": []});
    let (status, body) = post_request(Some(OWNER), "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least one item"));

    let body = json!({"address_id": 5, "items": [{"product_id": 1, "quantity": 0}]});
    let (status, _) = post_request(Some(OWNER), "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_order_for_someone_elses_address() {
    let _ = env_logger::try_init().ok();
    let body = json!({"address_id": 5, "items": [{"product_id": 1, "quantity": 1}]});
    let (status, _) = post_request(Some(STRANGER), "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn create_order_with_insufficient_stock() {
    let _ = env_logger::try_init().ok();
    let body = json!({"address_id": 5, "items": [{"product_id": 1, "quantity": 50}]});
    let (status, body) = post_request(Some(OWNER), "/orders", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Insufficient stock for product 1"));
}

#[actix_web::test]
async fn fetch_own_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(Some(OWNER), "/orders/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["id"], 10);
    assert_eq!(order["total"], "311.00");
}

#[actix_web::test]
async fn fetch_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(Some(STRANGER), "/orders/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(Some(OWNER), "/orders/99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_address().returning(|id| Ok((id == 5).then(|| address(id, OWNER))));
    db.expect_fetch_products_by_ids().returning(|ids| Ok(ids.iter().filter_map(|id| product(*id)).collect()));
    db.expect_insert_order_with_reservations().returning(|order| {
        match order.items().iter().find(|i| i.quantity > 10) {
            Some(item) => Err(CheckoutDbError::InsufficientStock { product_id: item.product_id, available: 10 }),
            None => Ok(persisted(order, 11)),
        }
    });
    db.expect_fetch_order().returning(|id| Ok((id == 10).then(stored_order)));
    let api = OrderFlowApi::new(db, CheckoutConfig::default());
    cfg.service(CreateOrderRoute::<MockCheckoutDb>::new())
        .service(OrderByIdRoute::<MockCheckoutDb>::new())
        .app_data(web::Data::new(api));
}

fn address(id: i64, user_id: i64) -> Address {
    Address {
        id,
        user_id,
        recipient: "Nguyen Van A".into(),
        line1: "12 Ly Thuong Kiet".into(),
        city: "Hanoi".into(),
        country: "VN".into(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

fn product(id: i64) -> Option<Product> {
    let price = match id {
        1 => Decimal::new(10_000, 2),
        2 => Decimal::new(11_100, 2),
        _ => return None,
    };
    Some(Product { id, name: format!("Product {id}"), price, currency: "VND".into() })
}

fn persisted(order: NewOrder, id: i64) -> Order {
    let items = order
        .items()
        .iter()
        .enumerate()
        .map(|(n, i)| OrderItem {
            id: n as i64 + 1,
            order_id: id,
            product_id: i.product_id,
            quantity: i.quantity,
            unit_price: i.unit_price,
        })
        .collect();
    Order {
        id,
        user_id: order.user_id,
        address_id: order.address_id,
        status: OrderStatusType::Pending,
        total_amount: order.total_amount,
        currency: order.currency,
        created_at: order.created_at,
        expires_at: order.expires_at,
        updated_at: order.created_at,
        restocked: false,
        items,
    }
}

fn stored_order() -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let lines = vec![
        checkout_engine::db_types::NewOrderItem { product_id: 1, quantity: 2, unit_price: Money::from(10_000) },
        checkout_engine::db_types::NewOrderItem { product_id: 2, quantity: 1, unit_price: Money::from(11_100) },
    ];
    persisted(NewOrder::new(OWNER, 5, "VND", lines, created_at, Duration::minutes(15)).unwrap(), 10)
}
