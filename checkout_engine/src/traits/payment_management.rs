use crate::{
    db_types::{OrderId, Payment},
    traits::CheckoutDbError,
};

#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    async fn fetch_payment_by_gateway_ref(&self, gateway_ref: &str) -> Result<Option<Payment>, CheckoutDbError>;

    /// Every payment attempt made for the order, oldest first.
    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, CheckoutDbError>;
}
