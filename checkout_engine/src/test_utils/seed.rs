use std::{collections::HashMap, str::FromStr};

use checkout_common::Secret;
use rust_decimal::Decimal;

use crate::{
    db_types::{Address, NewAddress, NewProduct, Payment, Product, UserId},
    helpers::signature::{sign, SECURE_HASH},
    provider::{
        CheckoutConfig,
        ProviderConfig,
        PARAM_AMOUNT,
        PARAM_BANK_CODE,
        PARAM_PAY_DATE,
        PARAM_RESPONSE_CODE,
        PARAM_TMN_CODE,
        PARAM_TRANSACTION_NO,
        PARAM_TRANSACTION_STATUS,
        PARAM_TXN_REF,
    },
    SqliteDatabase,
};

pub const TEST_TMN_CODE: &str = "TESTSHOP";
pub const TEST_HASH_SECRET: &str = "SECRETKEY123";

pub fn test_provider_config() -> ProviderConfig {
    ProviderConfig {
        tmn_code: TEST_TMN_CODE.to_string(),
        hash_secret: Secret::new(TEST_HASH_SECRET.to_string()),
        ..ProviderConfig::default()
    }
}

pub fn test_checkout_config() -> CheckoutConfig {
    CheckoutConfig::default()
}

/// Adds a VND product priced at `price` (a decimal string such as "5.50") with `stock` units on hand.
pub async fn seed_product(db: &SqliteDatabase, name: &str, price: &str, stock: i64) -> Product {
    let product = NewProduct {
        name: name.to_string(),
        price: Decimal::from_str(price).expect("Invalid test price"),
        currency: "VND".to_string(),
        initial_stock: stock,
    };
    db.insert_product(product).await.expect("Error inserting product")
}

pub async fn seed_address(db: &SqliteDatabase, user_id: UserId) -> Address {
    let address = NewAddress {
        user_id,
        recipient: format!("Customer {user_id}"),
        line1: "12 Hang Bac".to_string(),
        city: "Hanoi".to_string(),
        country: "VN".to_string(),
    };
    db.insert_address(address).await.expect("Error inserting address")
}

/// An unsigned provider callback for `payment` reporting the given result codes and the payment's own amount.
pub fn callback_params(payment: &Payment, response_code: &str, transaction_status: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert(PARAM_TMN_CODE.to_string(), TEST_TMN_CODE.to_string());
    params.insert(PARAM_TXN_REF.to_string(), payment.gateway_ref.clone());
    params.insert(PARAM_AMOUNT.to_string(), payment.amount.value().to_string());
    params.insert(PARAM_RESPONSE_CODE.to_string(), response_code.to_string());
    params.insert(PARAM_TRANSACTION_STATUS.to_string(), transaction_status.to_string());
    params.insert(PARAM_TRANSACTION_NO.to_string(), "14422574".to_string());
    params.insert(PARAM_BANK_CODE.to_string(), "NCB".to_string());
    params.insert(PARAM_PAY_DATE.to_string(), "20240301173015".to_string());
    params
}

/// Signs `params` with the test secret, the way the provider would.
pub fn sign_callback(mut params: HashMap<String, String>) -> HashMap<String, String> {
    let sorted = params.clone().into_iter().collect();
    params.insert(SECURE_HASH.to_string(), sign(&sorted, TEST_HASH_SECRET));
    params
}
