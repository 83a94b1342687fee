use sqlx::PgExecutor;

use crate::models::{Cart, CartItemRow};

/// Returns the user's cart, creating it on first access.
pub async fn get_or_create<'e, E: PgExecutor<'e>>(db: E, user_id: i64) -> Result<Cart, sqlx::Error> {
    // The no-op update makes RETURNING yield the existing row on conflict
    sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING id, user_id, created_at, updated_at",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn items<'e, E: PgExecutor<'e>>(db: E, cart_id: i64) -> Result<Vec<CartItemRow>, sqlx::Error> {
    sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.id, ci.product_id, p.name AS product_name, p.sku, p.image_url, \
                p.price AS unit_price, ci.quantity, ci.added_at \
         FROM cart_items ci JOIN products p ON p.id = ci.product_id \
         WHERE ci.cart_id = $1 ORDER BY ci.added_at, ci.id",
    )
    .bind(cart_id)
    .fetch_all(db)
    .await
}

/// `(item_id, product_id, quantity)` of a line in the given cart.
pub async fn find_item<'e, E: PgExecutor<'e>>(
    db: E,
    cart_id: i64,
    item_id: i64,
) -> Result<Option<(i64, i64, i32)>, sqlx::Error> {
    sqlx::query_as::<_, (i64, i64, i32)>(
        "SELECT id, product_id, quantity FROM cart_items WHERE cart_id = $1 AND id = $2",
    )
    .bind(cart_id)
    .bind(item_id)
    .fetch_optional(db)
    .await
}

pub async fn quantity_of<'e, E: PgExecutor<'e>>(
    db: E,
    cart_id: i64,
    product_id: i64,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(db)
    .await
}

/// Writes the absolute quantity for a product line, inserting it if needed.
pub async fn set_quantity<'e, E: PgExecutor<'e>>(
    db: E,
    cart_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
         ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_item<'e, E: PgExecutor<'e>>(
    db: E,
    cart_id: i64,
    item_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
        .bind(cart_id)
        .bind(item_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear<'e, E: PgExecutor<'e>>(db: E, cart_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn touch<'e, E: PgExecutor<'e>>(db: E, cart_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(db)
        .await?;
    Ok(())
}
