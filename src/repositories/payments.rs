use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::models::{Payment, PaymentState};

const PAYMENT_COLUMNS: &str =
    "id, order_id, payment_method_id, amount, paid_at, status, transaction_reference, extra_data";

pub struct NewPayment<'a> {
    pub order_id: i64,
    pub payment_method_id: i32,
    pub amount: Decimal,
    pub status: PaymentState,
    pub transaction_reference: Option<&'a str>,
    pub extra_data: Option<&'a str>,
}

/// One payment row per order: a retry after a rejection overwrites the attempt.
pub async fn upsert<'e, E: PgExecutor<'e>>(db: E, payment: &NewPayment<'_>) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (order_id, payment_method_id, amount, status, transaction_reference, extra_data) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (order_id) DO UPDATE SET \
            payment_method_id = EXCLUDED.payment_method_id, \
            amount = EXCLUDED.amount, \
            paid_at = NOW(), \
            status = EXCLUDED.status, \
            transaction_reference = EXCLUDED.transaction_reference, \
            extra_data = EXCLUDED.extra_data \
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(payment.order_id)
    .bind(payment.payment_method_id)
    .bind(payment.amount)
    .bind(payment.status)
    .bind(payment.transaction_reference)
    .bind(payment.extra_data)
    .fetch_one(db)
    .await
}

pub async fn find_by_order<'e, E: PgExecutor<'e>>(db: E, order_id: i64) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1"))
        .bind(order_id)
        .fetch_optional(db)
        .await
}

/// Flags an approved payment as refunded. No-op for any other state.
pub async fn mark_refunded<'e, E: PgExecutor<'e>>(db: E, order_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = 'refunded' WHERE order_id = $1 AND status = 'approved'",
    )
    .bind(order_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
