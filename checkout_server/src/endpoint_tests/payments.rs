use std::collections::BTreeMap;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, TimeZone, Utc};
use checkout_common::Secret;
use checkout_engine::{
    db_types::{Money, Order, OrderStatusType, Payment, PaymentStatus},
    events::EventProducers,
    helpers::{sign, signature::SECURE_HASH},
    provider::{ProviderConfig, PARAM_AMOUNT, PARAM_RESPONSE_CODE, PARAM_TMN_CODE, PARAM_TRANSACTION_STATUS, PARAM_TXN_REF},
    traits::{NotificationOutcome, PaymentSessionRecord},
    IpnApi,
    PaymentSessionApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request},
    mocks::MockCheckoutDb,
};
use crate::{
    config::ServerOptions,
    routes::{InitiatePaymentRoute, PaymentIpnRoute, PaymentReturnRoute},
};

const TMN_CODE: &str = "TESTSHOP";
const HASH_SECRET: &str = "SECRETKEY123";
const GATEWAY_REF: &str = "10240301100000123";

#[actix_web::test]
async fn ipn_with_bad_signature() {
    let _ = env_logger::try_init().ok();
    let mut query = callback_query("00", "00", 31_100);
    query.push_str("0");
    let (status, body) = get_request(None, &format!("/payments/ipn?{query}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"RspCode":"97","Message":"Invalid signature"}"#);
}

#[actix_web::test]
async fn ipn_without_parameters() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(None, "/payments/ipn", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["RspCode"], "97");
}

#[actix_web::test]
async fn ipn_is_confirmed() {
    let _ = env_logger::try_init().ok();
    let query = callback_query("00", "00", 31_100);
    let (status, body) = get_request(None, &format!("/payments/ipn?{query}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"RspCode":"00","Message":"Confirm Success"}"#);
}

#[actix_web::test]
async fn ipn_with_wrong_amount() {
    let _ = env_logger::try_init().ok();
    let query = callback_query("00", "00", 100);
    let (status, body) = get_request(None, &format!("/payments/ipn?{query}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["RspCode"], "04");
}

#[actix_web::test]
async fn return_url_is_inspected() {
    let _ = env_logger::try_init().ok();
    let query = callback_query("00", "00", 31_100);
    let (status, body) =
        get_request(None, &format!("/payments/return?{query}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let inspection: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(inspection["signature_valid"], true);
    assert_eq!(inspection["gateway_ref"], GATEWAY_REF);
    assert_eq!(inspection["outcome"], "SUCCEEDED");

    let query = callback_query("24", "02", 31_100).replace("vnp_ResponseCode=24", "vnp_ResponseCode=00");
    let (_, body) = get_request(None, &format!("/payments/return?{query}"), configure).await.expect("Request failed");
    let inspection: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(inspection["signature_valid"], false);
}

#[actix_web::test]
async fn initiate_payment() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(1), "/orders/10/payment", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(session["order_id"], 10);
    assert_eq!(session["reused"], false);
    let url = session["redirect_url"].as_str().unwrap();
    assert!(url.starts_with("https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?"));
    assert!(url.contains("vnp_Amount=31100&"));
    assert!(url.contains("vnp_TxnRef=10"));
    assert!(url.contains(SECURE_HASH));
}

#[actix_web::test]
async fn initiate_payment_without_identity() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request(None, "/orders/10/payment", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn provider() -> ProviderConfig {
    ProviderConfig {
        tmn_code: TMN_CODE.to_string(),
        hash_secret: Secret::new(HASH_SECRET.to_string()),
        ..ProviderConfig::default()
    }
}

fn callback_query(response_code: &str, transaction_status: &str, amount: i64) -> String {
    let mut params = BTreeMap::new();
    params.insert(PARAM_TMN_CODE.to_string(), TMN_CODE.to_string());
    params.insert(PARAM_TXN_REF.to_string(), GATEWAY_REF.to_string());
    params.insert(PARAM_AMOUNT.to_string(), amount.to_string());
    params.insert(PARAM_RESPONSE_CODE.to_string(), response_code.to_string());
    params.insert(PARAM_TRANSACTION_STATUS.to_string(), transaction_status.to_string());
    let hash = sign(&params, HASH_SECRET);
    params.insert(SECURE_HASH.to_string(), hash);
    url::form_urlencoded::Serializer::new(String::new()).extend_pairs(params.iter()).finish()
}

fn configure(cfg: &mut ServiceConfig) {
    let mut ipn_db = MockCheckoutDb::new();
    ipn_db.expect_apply_payment_notification().returning(|n| {
        let payment = payment(n.outcome);
        if n.amount != Some(payment.amount) {
            return Ok(NotificationOutcome::InvalidAmount { payment });
        }
        Ok(NotificationOutcome::Applied { payment, order: order(OrderStatusType::Pending), order_changed: false })
    });
    let mut session_db = MockCheckoutDb::new();
    session_db.expect_open_payment_session().returning(|req| {
        let mut payment = payment(PaymentStatus::Initiated);
        payment.gateway_ref = req.gateway_ref;
        payment.client_ip = req.client_ip;
        Ok(PaymentSessionRecord { order: order(OrderStatusType::Pending), payment, reused: false, expired: 0 })
    });
    let ipn = IpnApi::new(ipn_db, provider(), EventProducers::default());
    let sessions = PaymentSessionApi::new(session_db, provider());
    cfg.service(PaymentIpnRoute::<MockCheckoutDb>::new())
        .service(PaymentReturnRoute::<MockCheckoutDb>::new())
        .service(InitiatePaymentRoute::<MockCheckoutDb>::new())
        .app_data(web::Data::new(ipn))
        .app_data(web::Data::new(sessions))
        .app_data(web::Data::new(ServerOptions::default()));
}

fn order(status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    Order {
        id: 10,
        user_id: 1,
        address_id: 5,
        status,
        total_amount: Money::from(31_100),
        currency: "VND".into(),
        created_at,
        expires_at: created_at + Duration::minutes(15),
        updated_at: created_at,
        restocked: false,
        items: vec![],
    }
}

fn payment(status: PaymentStatus) -> Payment {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    Payment {
        id: 1,
        order_id: 10,
        status,
        provider: "vnpay".into(),
        amount: Money::from(31_100),
        currency: "VND".into(),
        gateway_ref: GATEWAY_REF.into(),
        provider_txn_no: None,
        response_code: None,
        transaction_status: None,
        failure_code: None,
        bank_code: None,
        raw_params: None,
        client_ip: "127.0.0.1".into(),
        paid_at: None,
        created_at,
        expires_at: created_at + Duration::minutes(15),
        updated_at: created_at,
        version: 0,
    }
}
