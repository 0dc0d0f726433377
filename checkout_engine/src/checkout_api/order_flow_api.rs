use std::{collections::HashMap, fmt::Debug};

use log::*;

use crate::{
    checkout_api::{
        errors::CheckoutApiError,
        order_objects::{validate_items, OrderItemRequest},
    },
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderId, Product, ProductId, UserId},
    helpers,
    provider::CheckoutConfig,
    traits::{CheckoutDatabase, CheckoutDbError},
};

/// `OrderFlowApi` turns a customer's basket into a priced, stock-backed order.
pub struct OrderFlowApi<B> {
    db: B,
    config: CheckoutConfig,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.config)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, config: CheckoutConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }
}

impl<B> OrderFlowApi<B>
where B: CheckoutDatabase
{
    /// Places an order for `user_id`, shipping to `address_id`.
    ///
    /// The request is validated, the products are resolved in one lookup and priced from the catalog, and then stock
    /// for every line is reserved and the order saved as one atomic unit. The new order is `Pending` until it is paid
    /// or its reservation window lapses.
    pub async fn create_order(
        &self,
        user_id: UserId,
        address_id: i64,
        items: Vec<OrderItemRequest>,
    ) -> Result<Order, CheckoutApiError> {
        validate_items(&items)?;
        let address = self.db.fetch_address(address_id).await?.ok_or(CheckoutApiError::AddressNotFound(address_id))?;
        if address.user_id != user_id {
            warn!("📝️ User {user_id} tried to ship an order to address {address_id}, which belongs to someone else");
            return Err(CheckoutApiError::AddressNotOwned(address_id));
        }
        let ids = items.iter().map(|i| i.product_id).collect::<Vec<ProductId>>();
        let products = self
            .db
            .fetch_products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect::<HashMap<ProductId, Product>>();
        let mut missing = ids.iter().filter(|id| !products.contains_key(id)).copied().collect::<Vec<ProductId>>();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(CheckoutApiError::ProductsNotFound(missing));
        }
        let lines = items
            .iter()
            .map(|item| self.price_line(item, &products[&item.product_id]))
            .collect::<Result<Vec<NewOrderItem>, CheckoutApiError>>()?;
        let order = NewOrder::new(
            user_id,
            address_id,
            self.config.currency.clone(),
            lines,
            helpers::now(),
            self.config.reservation_window,
        )
        .map_err(|e| CheckoutApiError::Validation(e.to_string()))?;
        trace!("📝️ Order for user {user_id} priced at {} {}", order.total_amount, order.currency);
        let order = self.db.insert_order_with_reservations(order).await.map_err(|e| {
            if let CheckoutDbError::InsufficientStock { product_id, available } = &e {
                info!("📝️ Order for user {user_id} rejected. Product {product_id} has only {available} in stock");
            }
            e
        })?;
        debug!(
            "📝️ Order #{} created for user {user_id}: {} lines, total {} {}, expires at {}",
            order.id,
            order.items.len(),
            order.total_amount.format_with_scale(self.config.currency_scale),
            order.currency,
            order.expires_at
        );
        Ok(order)
    }

    fn price_line(&self, item: &OrderItemRequest, product: &Product) -> Result<NewOrderItem, CheckoutApiError> {
        if product.currency != self.config.currency {
            return Err(CheckoutApiError::ProductCurrencyMismatch {
                product_id: product.id,
                expected: self.config.currency.clone(),
                found: product.currency.clone(),
            });
        }
        let unit_price = Money::from_decimal(product.price, self.config.currency_scale)
            .map_err(|e| CheckoutApiError::PricingError { product_id: product.id, reason: e.to_string() })?;
        Ok(NewOrderItem { product_id: item.product_id, quantity: item.quantity, unit_price })
    }

    /// Fetches one of the user's own orders.
    pub async fn fetch_order_for_user(&self, order_id: OrderId, user_id: UserId) -> Result<Order, CheckoutApiError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(CheckoutDbError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(CheckoutDbError::NotOrderOwner(order_id).into());
        }
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }
}
