use checkout_engine::test_utils::seed::{seed_address, seed_product};
use cucumber::given;

use crate::cucumber::{checkout_world::CheckoutSystem, CheckoutWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut CheckoutWorld) {
    world.system = Some(CheckoutSystem::new().await);
}

#[given(expr = "a product {string} priced at {word} VND with {int} in stock")]
async fn add_product(world: &mut CheckoutWorld, name: String, price: String, stock: i64) {
    let sys = world.system();
    let product = seed_product(&sys.checkout.db, &name, &price, stock).await;
    sys.products.insert(name, product);
}

#[given(expr = "customer {int} has a shipping address")]
async fn add_address(world: &mut CheckoutWorld, user_id: i64) {
    let sys = world.system();
    let address = seed_address(&sys.checkout.db, user_id).await;
    sys.addresses.insert(user_id, address.id);
}
