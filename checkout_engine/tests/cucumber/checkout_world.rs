use std::{collections::HashMap, fmt::Debug};

use checkout_engine::{
    db_types::{Order, Product},
    payment_objects::PaymentSession,
    provider::IpnResponse,
    CheckoutApiError,
    CheckoutDatabase,
};
use cucumber::World;

use crate::support::{setup, Checkout};

#[derive(Default, Debug, World)]
pub struct CheckoutWorld {
    pub system: Option<CheckoutSystem>,
}

pub struct CheckoutSystem {
    pub db_path: String,
    pub checkout: Checkout,
    pub products: HashMap<String, Product>,
    pub addresses: HashMap<i64, i64>,
    pub last_order: Option<Order>,
    pub last_error: Option<CheckoutApiError>,
    pub last_session: Option<PaymentSession>,
    pub last_response: Option<IpnResponse>,
}

impl Debug for CheckoutSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutSystem ({})", self.db_path)
    }
}

impl CheckoutWorld {
    pub fn system(&mut self) -> &mut CheckoutSystem {
        self.system.as_mut().expect("Checkout system not initialised. Did you forget 'Given a fresh install'?")
    }
}

impl CheckoutSystem {
    pub async fn new() -> Self {
        let checkout = setup().await;
        let db_path = checkout.db.url().to_string();
        Self {
            db_path,
            checkout,
            products: HashMap::new(),
            addresses: HashMap::new(),
            last_order: None,
            last_error: None,
            last_session: None,
            last_response: None,
        }
    }

    pub fn product(&self, name: &str) -> &Product {
        self.products.get(name).unwrap_or_else(|| panic!("No product called '{name}' was set up"))
    }

    pub fn order(&self) -> &Order {
        self.last_order.as_ref().expect("No order has been placed")
    }
}
