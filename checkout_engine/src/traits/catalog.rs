use crate::{
    db_types::{Address, Product, ProductId},
    traits::CheckoutDbError,
};

/// Read access to the product catalog. Catalog administration lives elsewhere.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Resolves all the given product ids in a single lookup. Ids that do not exist are simply absent from the result.
    async fn fetch_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CheckoutDbError>;
}

/// Read access to customers' shipping addresses.
#[allow(async_fn_in_trait)]
pub trait AddressBook {
    async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, CheckoutDbError>;
}
