use crate::{
    db_types::{Order, OrderId, UserId},
    traits::CheckoutDbError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with its line items attached.
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, CheckoutDbError>;

    /// All orders placed by the user, newest first. Line items are attached.
    async fn fetch_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutDbError>;
}
