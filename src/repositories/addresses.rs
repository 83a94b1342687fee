use sqlx::PgExecutor;

use crate::models::Address;

const ADDRESS_COLUMNS: &str = "id, user_id, recipient_name, street, street_number, additional_info, \
     city, state, postal_code, country, is_default_shipping, is_default_billing";

pub async fn list_by_user<'e, E: PgExecutor<'e>>(db: E, user_id: i64) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 \
         ORDER BY is_default_shipping DESC, id"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn list_all<'e, E: PgExecutor<'e>>(db: E) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>(&format!("SELECT {ADDRESS_COLUMNS} FROM addresses ORDER BY id"))
        .fetch_all(db)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>(&format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Ownership-checked lookup.
pub async fn find_for_user<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    user_id: i64,
) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn count_for_user<'e, E: PgExecutor<'e>>(db: E, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

/// Clears the default shipping flag on every address of the user except `keep_id`.
pub async fn clear_default_shipping<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    keep_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE addresses SET is_default_shipping = FALSE \
         WHERE user_id = $1 AND is_default_shipping AND ($2::BIGINT IS NULL OR id <> $2)",
    )
    .bind(user_id)
    .bind(keep_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn clear_default_billing<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: i64,
    keep_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE addresses SET is_default_billing = FALSE \
         WHERE user_id = $1 AND is_default_billing AND ($2::BIGINT IS NULL OR id <> $2)",
    )
    .bind(user_id)
    .bind(keep_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert<'e, E: PgExecutor<'e>>(db: E, address: &Address) -> Result<Address, sqlx::Error> {
    sqlx::query_as::<_, Address>(&format!(
        "INSERT INTO addresses (user_id, recipient_name, street, street_number, additional_info, \
         city, state, postal_code, country, is_default_shipping, is_default_billing) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {ADDRESS_COLUMNS}"
    ))
    .bind(address.user_id)
    .bind(&address.recipient_name)
    .bind(&address.street)
    .bind(&address.street_number)
    .bind(&address.additional_info)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(&address.country)
    .bind(address.is_default_shipping)
    .bind(address.is_default_billing)
    .fetch_one(db)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(db: E, address: &Address) -> Result<Address, sqlx::Error> {
    sqlx::query_as::<_, Address>(&format!(
        "UPDATE addresses SET recipient_name = $3, street = $4, street_number = $5, \
         additional_info = $6, city = $7, state = $8, postal_code = $9, country = $10, \
         is_default_shipping = $11, is_default_billing = $12 \
         WHERE id = $1 AND user_id = $2 RETURNING {ADDRESS_COLUMNS}"
    ))
    .bind(address.id)
    .bind(address.user_id)
    .bind(&address.recipient_name)
    .bind(&address.street)
    .bind(&address.street_number)
    .bind(&address.additional_info)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(&address.country)
    .bind(address.is_default_shipping)
    .bind(address.is_default_billing)
    .fetch_one(db)
    .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(db: E, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
