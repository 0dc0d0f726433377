use crate::{
    db_types::{InventoryRecord, ProductId},
    traits::CheckoutDbError,
};

/// The inventory ledger.
///
/// Stock is only ever changed through these two primitives. There is no way to set a quantity directly.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Atomically takes `quantity` units of stock for `product_id`, but only if at least that many are available.
    ///
    /// Returns `Ok(false)` if there was not enough stock; nothing is changed in that case. A non-positive quantity is
    /// a caller error.
    async fn reserve_stock(&self, product_id: ProductId, quantity: i64) -> Result<bool, CheckoutDbError>;

    /// Puts `quantity` units back. The ledger does not remember releases; callers must guarantee that each reservation
    /// is released at most once.
    async fn release_stock(&self, product_id: ProductId, quantity: i64) -> Result<(), CheckoutDbError>;

    async fn fetch_stock(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, CheckoutDbError>;
}
