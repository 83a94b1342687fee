//! Read-only reference tables seeded by the migrations.

use sqlx::PgExecutor;

use crate::models::{OrderStatus, PaymentMethod};

pub async fn list_statuses<'e, E: PgExecutor<'e>>(db: E) -> Result<Vec<OrderStatus>, sqlx::Error> {
    sqlx::query_as::<_, OrderStatus>("SELECT id, name, description FROM order_statuses ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn find_status<'e, E: PgExecutor<'e>>(db: E, id: i32) -> Result<Option<OrderStatus>, sqlx::Error> {
    sqlx::query_as::<_, OrderStatus>("SELECT id, name, description FROM order_statuses WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_active_payment_methods<'e, E: PgExecutor<'e>>(
    db: E,
) -> Result<Vec<PaymentMethod>, sqlx::Error> {
    sqlx::query_as::<_, PaymentMethod>(
        "SELECT id, name, active FROM payment_methods WHERE active ORDER BY id",
    )
    .fetch_all(db)
    .await
}

pub async fn find_payment_method<'e, E: PgExecutor<'e>>(
    db: E,
    id: i32,
) -> Result<Option<PaymentMethod>, sqlx::Error> {
    sqlx::query_as::<_, PaymentMethod>("SELECT id, name, active FROM payment_methods WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}
