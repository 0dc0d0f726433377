use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{InventoryRecord, ProductId},
    traits::CheckoutDbError,
};

/// Takes `quantity` units of `product_id` if, and only if, at least that many are in stock.
///
/// The check and the decrement are one conditional `UPDATE`, so concurrent callers can never drive the quantity below
/// zero. Returns whether the stock was taken.
pub async fn reserve(
    product_id: ProductId,
    quantity: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, CheckoutDbError> {
    if quantity <= 0 {
        return Err(CheckoutDbError::InvalidQuantity(quantity));
    }
    let result = sqlx::query(
        r#"
            UPDATE inventory SET quantity = quantity - $1, updated_at = $2
            WHERE product_id = $3 AND quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(conn)
    .await?;
    let reserved = result.rows_affected() == 1;
    trace!("🗃️ Reserve {quantity} of product {product_id}: {reserved}");
    Ok(reserved)
}

/// Adds `quantity` units of `product_id` back to stock. There is no memory of previous releases.
pub async fn release(
    product_id: ProductId,
    quantity: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutDbError> {
    if quantity <= 0 {
        return Err(CheckoutDbError::InvalidQuantity(quantity));
    }
    let result = sqlx::query("UPDATE inventory SET quantity = quantity + $1, updated_at = $2 WHERE product_id = $3")
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CheckoutDbError::InventoryRecordNotFound(product_id));
    }
    debug!("🗃️ Released {quantity} of product {product_id} back to stock");
    Ok(())
}

pub async fn fetch_stock(
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<InventoryRecord>, sqlx::Error> {
    sqlx::query_as("SELECT product_id, quantity, updated_at FROM inventory WHERE product_id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await
}

/// Creates the stock record for a new product.
pub async fn insert_stock(
    product_id: ProductId,
    quantity: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<InventoryRecord, CheckoutDbError> {
    if quantity < 0 {
        return Err(CheckoutDbError::InvalidQuantity(quantity));
    }
    let record = sqlx::query_as(
        "INSERT INTO inventory (product_id, quantity, updated_at) VALUES ($1, $2, $3) RETURNING product_id, quantity, \
         updated_at",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(record)
}
