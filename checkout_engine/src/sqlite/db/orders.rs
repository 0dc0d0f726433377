use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType, UserId},
    traits::RestockCursor,
};

/// Inserts the order header. This is not atomic. Embed this call inside a transaction together with the line items
/// and the stock reservations, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                address_id,
                status,
                total_amount,
                currency,
                created_at,
                expires_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.address_id)
    .bind(OrderStatusType::Pending)
    .bind(order.total_amount)
    .bind(order.currency.as_str())
    .bind(order.created_at)
    .bind(order.expires_at)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order #{} inserted for user {}", order.id, order.user_id);
    Ok(order)
}

pub async fn insert_items(
    order_id: OrderId,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *conn)
        .await?;
        result.push(row);
    }
    trace!("📝️ {} line items saved for order #{order_id}", result.len());
    Ok(result)
}

/// Returns the order row only. Use [`fetch_order_with_items`] if the line items are needed.
pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY product_id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_order_with_items(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let Some(mut order) = fetch_order(order_id, &mut *conn).await? else {
        return Ok(None);
    };
    order.items = fetch_items(order_id, conn).await?;
    Ok(Some(order))
}

pub async fn fetch_orders_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut orders: Vec<Order> = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
    for order in orders.iter_mut() {
        order.items = fetch_items(order.id, &mut *conn).await?;
    }
    Ok(orders)
}

/// Pending, unrestocked orders whose reservation lapsed before `now`, in `(expires_at, id)` order, starting after
/// `after` if it is given.
pub async fn fetch_restock_candidates(
    now: DateTime<Utc>,
    after: Option<RestockCursor>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let candidates = match after {
        None => {
            sqlx::query_as(
                r#"
                    SELECT * FROM orders
                    WHERE status = 'PENDING' AND restocked = 0 AND expires_at < $1
                    ORDER BY expires_at ASC, id ASC
                    LIMIT $2
                "#,
            )
            .bind(now)
            .bind(limit)
            .fetch_all(conn)
            .await?
        },
        Some(cursor) => {
            sqlx::query_as(
                r#"
                    SELECT * FROM orders
                    WHERE status = 'PENDING' AND restocked = 0 AND expires_at < $1
                      AND (expires_at > $2 OR (expires_at = $2 AND id > $3))
                    ORDER BY expires_at ASC, id ASC
                    LIMIT $4
                "#,
            )
            .bind(now)
            .bind(cursor.expires_at)
            .bind(cursor.id)
            .bind(limit)
            .fetch_all(conn)
            .await?
        },
    };
    Ok(candidates)
}

/// Sets the order's status, unless it is already `Paid`. Returns the updated order, or `None` if nothing changed.
pub async fn update_status_unless_paid(
    order_id: OrderId,
    status: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = $2
            WHERE id = $3 AND status != 'PAID' AND status != $1
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    if let Some(o) = &order {
        debug!("📝️ Order #{} is now {}", o.id, o.status);
    }
    Ok(order)
}

/// Fails a pending, unrestocked order and flags it as restocked, in one conditional update. Returns `None` if the
/// order was not in that state. The caller must release the stock in the same transaction.
pub async fn fail_and_flag_restocked(
    order_id: OrderId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = 'FAILED', restocked = 1, updated_at = $1
            WHERE id = $2 AND status = 'PENDING' AND restocked = 0
            RETURNING *;
        "#,
    )
    .bind(now)
    .bind(order_id)
    .fetch_optional(conn)
    .await
}
