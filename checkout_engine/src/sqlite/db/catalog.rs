use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Address, NewAddress, NewProduct, Product, ProductId},
    sqlite::db::inventory,
    traits::CheckoutDbError,
};

#[derive(FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: String,
    currency: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = CheckoutDbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            CheckoutDbError::DatabaseError(format!("Product {} has an unreadable price '{}': {e}", row.id, row.price))
        })?;
        Ok(Product { id: row.id, name: row.name, price, currency: row.currency })
    }
}

/// Resolves all `ids` in one query.
pub async fn fetch_products_by_ids(
    ids: &[ProductId],
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, CheckoutDbError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::new("SELECT id, name, price, currency FROM products WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(conn).await?;
    rows.into_iter().map(Product::try_from).collect()
}

/// Adds a product to the catalog together with its opening stock. Run this inside a transaction.
pub async fn insert_product(
    product: NewProduct,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Product, CheckoutDbError> {
    if product.price.is_sign_negative() {
        warn!("🗃️ Product '{}' is being created with a negative price", product.name);
    }
    let row: ProductRow = sqlx::query_as(
        "INSERT INTO products (name, price, currency, created_at) VALUES ($1, $2, $3, $4) RETURNING id, name, price, \
         currency",
    )
    .bind(product.name)
    .bind(product.price.to_string())
    .bind(product.currency)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    inventory::insert_stock(row.id, product.initial_stock, now, conn).await?;
    debug!("🗃️ Product {} ({}) added with {} in stock", row.id, row.name, product.initial_stock);
    Product::try_from(row)
}

pub async fn fetch_address(address_id: i64, conn: &mut SqliteConnection) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE id = $1").bind(address_id).fetch_optional(conn).await
}

pub async fn insert_address(
    address: NewAddress,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Address, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO addresses (user_id, recipient, line1, city, country, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(address.user_id)
    .bind(address.recipient)
    .bind(address.line1)
    .bind(address.city)
    .bind(address.country)
    .bind(now)
    .fetch_one(conn)
    .await
}
