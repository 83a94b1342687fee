use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::models::Product;

const PRODUCT_SELECT: &str = "SELECT p.id, p.sku, p.name, p.description, p.price, p.stock, \
     p.image_url, p.weight_kg, p.dimensions_cm, p.active, p.category_id, \
     c.name AS category_name, p.created_at, p.updated_at \
     FROM products p JOIN categories c ON c.id = p.category_id";

pub async fn list_active<'e, E: PgExecutor<'e>>(
    db: E,
    category_id: Option<i64>,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "{PRODUCT_SELECT} WHERE p.active AND ($1::BIGINT IS NULL OR p.category_id = $1) \
         ORDER BY p.name"
    ))
    .bind(category_id)
    .fetch_all(db)
    .await
}

pub async fn list_all<'e, E: PgExecutor<'e>>(db: E) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} ORDER BY p.id"))
        .fetch_all(db)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Same as `find_by_id` but takes a row lock on the product until the transaction ends.
pub async fn lock_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1 FOR UPDATE OF p"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_id_by_sku<'e, E: PgExecutor<'e>>(db: E, sku: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_optional(db)
        .await
}

/// Column values written on insert and update.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub dimensions_cm: Option<String>,
    pub active: bool,
    pub category_id: i64,
}

impl From<&Product> for ProductFields {
    fn from(p: &Product) -> Self {
        ProductFields {
            sku: p.sku.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            stock: p.stock,
            image_url: p.image_url.clone(),
            weight_kg: p.weight_kg,
            dimensions_cm: p.dimensions_cm.clone(),
            active: p.active,
            category_id: p.category_id,
        }
    }
}

pub async fn insert<'e, E: PgExecutor<'e>>(db: E, fields: &ProductFields) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
         (sku, name, description, price, stock, image_url, weight_kg, dimensions_cm, active, category_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(&fields.sku)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(fields.stock)
    .bind(&fields.image_url)
    .bind(fields.weight_kg)
    .bind(&fields.dimensions_cm)
    .bind(fields.active)
    .bind(fields.category_id)
    .fetch_one(db)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    fields: &ProductFields,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET sku = $2, name = $3, description = $4, price = $5, stock = $6, \
         image_url = $7, weight_kg = $8, dimensions_cm = $9, active = $10, category_id = $11, \
         updated_at = $12 WHERE id = $1",
    )
    .bind(id)
    .bind(&fields.sku)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(fields.stock)
    .bind(&fields.image_url)
    .bind(fields.weight_kg)
    .bind(&fields.dimensions_cm)
    .bind(fields.active)
    .bind(fields.category_id)
    .bind(Utc::now())
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn deactivate<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Decrements stock only if enough is left. Returns false when the guard fails.
pub async fn decrement_stock<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    quantity: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $2, updated_at = NOW() \
         WHERE id = $1 AND stock >= $2",
    )
    .bind(id)
    .bind(quantity)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn increment_stock<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(quantity)
        .execute(db)
        .await?;
    Ok(())
}
