use sqlx::PgExecutor;

use crate::models::Category;

pub async fn list<'e, E: PgExecutor<'e>>(db: E) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_name<'e, E: PgExecutor<'e>>(
    db: E,
    name: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "SELECT id, name, description FROM categories WHERE LOWER(name) = LOWER($1)",
    )
    .bind(name)
    .fetch_optional(db)
    .await
}

pub async fn insert<'e, E: PgExecutor<'e>>(
    db: E,
    name: &str,
    description: Option<&str>,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description) VALUES ($1, $2) \
         RETURNING id, name, description",
    )
    .bind(name)
    .bind(description)
    .fetch_one(db)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, description = $3 WHERE id = $1 \
         RETURNING id, name, description",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(db)
    .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_products<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(db)
        .await
}
