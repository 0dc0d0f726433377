use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentResultUpdate, PaymentStatus},
    traits::CheckoutDbError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, CheckoutDbError> {
    let gateway_ref = payment.gateway_ref.clone();
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                status,
                provider,
                amount,
                currency,
                gateway_ref,
                client_ip,
                created_at,
                expires_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $8)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(PaymentStatus::Initiated)
    .bind(payment.provider)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(payment.gateway_ref)
    .bind(payment.client_ip)
    .bind(payment.created_at)
    .bind(payment.expires_at)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => CheckoutDbError::PaymentAlreadyExists(gateway_ref),
        _ => CheckoutDbError::from(e),
    })?;
    debug!("💳️ Payment {} [{}] created for order #{}", payment.id, payment.gateway_ref, payment.order_id);
    Ok(payment)
}

pub async fn fetch_by_gateway_ref(
    gateway_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_ref = $1").bind(gateway_ref).fetch_optional(conn).await
}

pub async fn fetch_for_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// The payments that matter when opening a session: live or stale sessions, and any success.
pub async fn fetch_initiated_or_succeeded(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM payments
            WHERE order_id = $1 AND status IN ('INITIATED', 'SUCCEEDED')
            ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

/// A succeeded payment for `order_id` other than `payment_id`, if there is one.
pub async fn fetch_other_success(
    order_id: OrderId,
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND id != $2 AND status = 'SUCCEEDED' LIMIT 1")
        .bind(order_id)
        .bind(payment_id)
        .fetch_optional(conn)
        .await
}

/// True if the order has an `Initiated` payment whose session has not expired at `now`.
///
/// Sessions currently share their order's expiry, so for an expired order this is false unless the payment window was
/// changed independently.
pub async fn has_live_session(
    order_id: OrderId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments WHERE order_id = $1 AND status = 'INITIATED' AND expires_at >= $2",
    )
    .bind(order_id)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Moves a single payment to `Expired`, provided nobody else has touched it since `payment` was read.
pub async fn expire_payment(
    payment: &Payment,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Payment, CheckoutDbError> {
    if !payment.status.can_transition_to(PaymentStatus::Expired) {
        return Err(CheckoutDbError::PaymentStatusUpdateError(format!(
            "Payment {} cannot move from {} to {}",
            payment.id,
            payment.status,
            PaymentStatus::Expired
        )));
    }
    let expired: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = $2, version = version + 1
            WHERE id = $3 AND version = $4
            RETURNING *;
        "#,
    )
    .bind(PaymentStatus::Expired)
    .bind(now)
    .bind(payment.id)
    .bind(payment.version)
    .fetch_optional(conn)
    .await?;
    let expired = expired.ok_or(CheckoutDbError::PaymentVersionConflict(payment.id))?;
    trace!("💳️ Payment {} [{}] expired", expired.id, expired.gateway_ref);
    Ok(expired)
}

/// Writes a provider result onto `payment`, optimistically checked against the version that was read.
pub async fn apply_result(
    payment: &Payment,
    status: PaymentStatus,
    update: PaymentResultUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Payment, CheckoutDbError> {
    if !payment.status.can_transition_to(status) {
        return Err(CheckoutDbError::PaymentStatusUpdateError(format!(
            "Payment {} cannot move from {} to {status}",
            payment.id, payment.status
        )));
    }
    write_result(payment, status, update, now, conn).await
}

/// Marks `payment` as `Suspicious` after the provider reported it succeeded while another payment had already paid
/// for the order.
///
/// This bypasses the usual transition rules, since the duplicate may be a late success for a session that had already
/// `Failed` or `Expired`. Only a payment that is itself `Succeeded` or `Suspicious` is refused.
pub async fn flag_duplicate_success(
    payment: &Payment,
    update: PaymentResultUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Payment, CheckoutDbError> {
    if matches!(payment.status, PaymentStatus::Succeeded | PaymentStatus::Suspicious) {
        return Err(CheckoutDbError::PaymentStatusUpdateError(format!(
            "Payment {} is already {} and cannot be flagged as a duplicate success",
            payment.id, payment.status
        )));
    }
    write_result(payment, PaymentStatus::Suspicious, update, now, conn).await
}

async fn write_result(
    payment: &Payment,
    status: PaymentStatus,
    update: PaymentResultUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Payment, CheckoutDbError> {
    let updated: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = $1,
                response_code = $2,
                transaction_status = $3,
                provider_txn_no = $4,
                bank_code = $5,
                raw_params = $6,
                failure_code = $7,
                paid_at = COALESCE($8, paid_at),
                updated_at = $9,
                version = version + 1
            WHERE id = $10 AND version = $11
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(update.response_code)
    .bind(update.transaction_status)
    .bind(update.provider_txn_no)
    .bind(update.bank_code)
    .bind(update.raw_params)
    .bind(update.failure_code)
    .bind(update.paid_at)
    .bind(now)
    .bind(payment.id)
    .bind(payment.version)
    .fetch_optional(conn)
    .await?;
    let updated = updated.ok_or(CheckoutDbError::PaymentVersionConflict(payment.id))?;
    debug!("💳️ Payment {} [{}] is now {}", updated.id, updated.gateway_ref, updated.status);
    Ok(updated)
}

/// Expires every `Initiated` payment whose session lapsed before `now`. Returns the number of payments changed.
pub async fn expire_stale(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE payments SET status = 'EXPIRED', updated_at = $1, version = version + 1
            WHERE status = 'INITIATED' AND expires_at < $1
        "#,
    )
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
