use chrono::Duration;
use checkout_engine::{
    db_types::{Money, OrderStatusType, PaymentStatus},
    order_objects::OrderItemRequest,
    provider::PARAM_AMOUNT,
    test_utils::seed::{callback_params, sign_callback},
    traits::{OrderManagement, PaymentManagement},
    CheckoutApiError,
    CheckoutDbError,
    InventoryManagement,
};
use cucumber::{then, when};

use crate::cucumber::{checkout_world::CheckoutSystem, CheckoutWorld};

async fn place_order(sys: &mut CheckoutSystem, user_id: i64, lines: Vec<(i64, String)>) {
    let address_id = *sys.addresses.get(&user_id).expect("Customer has no address");
    let items = lines.into_iter().map(|(qty, name)| OrderItemRequest::new(sys.product(&name).id, qty)).collect();
    match sys.checkout.orders.create_order(user_id, address_id, items).await {
        Ok(order) => {
            sys.last_order = Some(order);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e),
    }
}

#[when(expr = "customer {int} orders {int} of {string}")]
async fn order_one_line(world: &mut CheckoutWorld, user_id: i64, qty: i64, name: String) {
    place_order(world.system(), user_id, vec![(qty, name)]).await;
}

#[when(expr = "customer {int} orders {int} of {string} and {int} of {string}")]
async fn order_two_lines(world: &mut CheckoutWorld, user_id: i64, q1: i64, n1: String, q2: i64, n2: String) {
    place_order(world.system(), user_id, vec![(q1, n1), (q2, n2)]).await;
}

#[when(expr = "customer {int} starts paying for the order")]
async fn start_payment(world: &mut CheckoutWorld, user_id: i64) {
    let sys = world.system();
    let order_id = sys.order().id;
    let session = sys.checkout.sessions.initiate_or_reuse(order_id, "127.0.0.1", user_id).await.expect("No session");
    sys.last_session = Some(session);
}

async fn send_callback(sys: &mut CheckoutSystem, response_code: &str, status: &str, amount: Option<String>) {
    let gateway_ref = sys.last_session.as_ref().expect("No payment session").gateway_ref.clone();
    let payment = sys.checkout.db.fetch_payment_by_gateway_ref(&gateway_ref).await.unwrap().expect("No payment");
    let mut params = callback_params(&payment, response_code, status);
    if let Some(amount) = amount {
        params.insert(PARAM_AMOUNT.to_string(), amount);
    }
    let response = sys.checkout.ipn.process_provider_callback(sign_callback(params)).await;
    sys.last_response = Some(response);
}

#[when(expr = "the provider reports response code {word} and transaction status {word}")]
async fn provider_reports(world: &mut CheckoutWorld, response_code: String, status: String) {
    send_callback(world.system(), &response_code, &status, None).await;
}

#[when(expr = "the provider reports an amount of {string}")]
async fn provider_reports_amount(world: &mut CheckoutWorld, amount: String) {
    send_callback(world.system(), "00", "00", Some(amount)).await;
}

#[when("the restock job runs after the reservation expires")]
async fn run_restock(world: &mut CheckoutWorld) {
    let sys = world.system();
    let now = sys.order().expires_at + Duration::seconds(1);
    sys.checkout.maintenance.restock_expired_orders(now).await.expect("Restock pass failed");
}

#[then(expr = "the order is {word} with a total of {int}")]
async fn order_status_and_total(world: &mut CheckoutWorld, status: String, total: i64) {
    let sys = world.system();
    let order = sys.checkout.db.fetch_order(sys.order().id).await.unwrap().unwrap();
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
    assert_eq!(order.total_amount, Money::from(total));
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut CheckoutWorld, status: String) {
    let sys = world.system();
    let order = sys.checkout.db.fetch_order(sys.order().id).await.unwrap().unwrap();
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
}

#[then(expr = "the order expires {int} minutes after it was created")]
async fn order_expiry(world: &mut CheckoutWorld, minutes: i64) {
    let order = world.system().order();
    assert_eq!(order.expires_at - order.created_at, Duration::minutes(minutes));
}

#[then(expr = "{string} has {int} in stock")]
async fn stock_level(world: &mut CheckoutWorld, name: String, expected: i64) {
    let sys = world.system();
    let record = sys.checkout.db.fetch_stock(sys.product(&name).id).await.unwrap().expect("No inventory record");
    assert_eq!(record.quantity, expected);
}

#[then(expr = "the order is rejected for lack of {string}")]
async fn rejected_for_stock(world: &mut CheckoutWorld, name: String) {
    let sys = world.system();
    let expected = sys.product(&name).id;
    match sys.last_error.as_ref() {
        Some(CheckoutApiError::Storage(CheckoutDbError::InsufficientStock { product_id, .. })) => {
            assert_eq!(*product_id, expected);
        },
        other => panic!("Expected an insufficient stock error, got {other:?}"),
    }
}

#[then(expr = "the provider is told {word}")]
async fn provider_told(world: &mut CheckoutWorld, code: String) {
    let response = world.system().last_response.as_ref().expect("No callback was sent");
    assert_eq!(response.code, code);
}

#[then(expr = "the payment is {word}")]
async fn payment_status(world: &mut CheckoutWorld, status: String) {
    let sys = world.system();
    let gateway_ref = sys.last_session.as_ref().expect("No payment session").gateway_ref.clone();
    let payment = sys.checkout.db.fetch_payment_by_gateway_ref(&gateway_ref).await.unwrap().unwrap();
    assert_eq!(payment.status, status.parse::<PaymentStatus>().unwrap());
}

#[then("the payment session was reused")]
async fn session_reused(world: &mut CheckoutWorld) {
    let session = world.system().last_session.as_ref().expect("No payment session");
    assert!(session.reused);
}
