use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::models::{Order, OrderDetail, PaymentState};

const ORDER_SELECT: &str = "SELECT o.id, o.user_id, o.shipping_address_id, o.billing_address_id, \
     o.payment_method_id, pm.name AS payment_method_name, o.status_id, s.name AS status_name, \
     o.placed_at, o.subtotal, o.shipping_cost, o.taxes, o.total, o.customer_notes, \
     o.payment_status, o.payment_reference \
     FROM orders o \
     JOIN payment_methods pm ON pm.id = o.payment_method_id \
     JOIN order_statuses s ON s.id = o.status_id";

const DETAIL_SELECT: &str = "SELECT d.id, d.order_id, d.product_id, p.name AS product_name, p.sku, \
     d.quantity, d.unit_price, d.line_subtotal \
     FROM order_details d JOIN products p ON p.id = d.product_id";

pub struct NewOrder<'a> {
    pub user_id: i64,
    pub shipping_address_id: i64,
    pub billing_address_id: i64,
    pub payment_method_id: i32,
    pub status_id: i32,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
    pub customer_notes: Option<&'a str>,
}

pub async fn insert_order<'e, E: PgExecutor<'e>>(db: E, order: &NewOrder<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (user_id, shipping_address_id, billing_address_id, payment_method_id, \
         status_id, subtotal, shipping_cost, taxes, total, customer_notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(order.user_id)
    .bind(order.shipping_address_id)
    .bind(order.billing_address_id)
    .bind(order.payment_method_id)
    .bind(order.status_id)
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.taxes)
    .bind(order.total)
    .bind(order.customer_notes)
    .fetch_one(db)
    .await
}

pub async fn insert_detail<'e, E: PgExecutor<'e>>(
    db: E,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
    line_subtotal: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_details (order_id, product_id, quantity, unit_price, line_subtotal) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(line_subtotal)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Locks the order row for the rest of the transaction.
pub async fn lock_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("{ORDER_SELECT} WHERE o.id = $1 FOR UPDATE OF o"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_user<'e, E: PgExecutor<'e>>(db: E, user_id: i64) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.placed_at DESC, o.id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn list_all<'e, E: PgExecutor<'e>>(db: E) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("{ORDER_SELECT} ORDER BY o.placed_at DESC, o.id DESC"))
        .fetch_all(db)
        .await
}

pub async fn list_by_status<'e, E: PgExecutor<'e>>(db: E, status_id: i32) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "{ORDER_SELECT} WHERE o.status_id = $1 ORDER BY o.placed_at DESC, o.id DESC"
    ))
    .bind(status_id)
    .fetch_all(db)
    .await
}

pub async fn details_for<'e, E: PgExecutor<'e>>(db: E, order_id: i64) -> Result<Vec<OrderDetail>, sqlx::Error> {
    sqlx::query_as::<_, OrderDetail>(&format!("{DETAIL_SELECT} WHERE d.order_id = $1 ORDER BY d.id"))
        .bind(order_id)
        .fetch_all(db)
        .await
}

/// Details of several orders in one round trip.
pub async fn details_for_orders<'e, E: PgExecutor<'e>>(
    db: E,
    order_ids: &[i64],
) -> Result<Vec<OrderDetail>, sqlx::Error> {
    sqlx::query_as::<_, OrderDetail>(&format!(
        "{DETAIL_SELECT} WHERE d.order_id = ANY($1) ORDER BY d.order_id, d.id"
    ))
    .bind(order_ids)
    .fetch_all(db)
    .await
}

pub async fn set_status<'e, E: PgExecutor<'e>>(db: E, id: i64, status_id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status_id = $2 WHERE id = $1")
        .bind(id)
        .bind(status_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_payment<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    state: PaymentState,
    reference: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET payment_status = $2, payment_reference = $3 WHERE id = $1")
        .bind(id)
        .bind(state)
        .bind(reference)
        .execute(db)
        .await?;
    Ok(())
}
