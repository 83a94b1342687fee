use sqlx::PgExecutor;

use crate::models::{Role, User};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, phone, active, created_at";

pub async fn find_by_id<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    db: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn list_active<'e, E: PgExecutor<'e>>(db: E) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY id"
    ))
    .fetch_all(db)
    .await
}

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
}

pub async fn insert<'e, E: PgExecutor<'e>>(db: E, user: NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (first_name, last_name, email, password_hash, phone) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
    ))
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.phone)
    .fetch_one(db)
    .await
}

pub async fn update_profile<'e, E: PgExecutor<'e>>(
    db: E,
    id: i64,
    first_name: &str,
    last_name: &str,
    phone: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET first_name = $2, last_name = $3, phone = $4 \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(phone)
    .fetch_optional(db)
    .await
}

pub async fn deactivate<'e, E: PgExecutor<'e>>(db: E, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn roles_for<'e, E: PgExecutor<'e>>(db: E, user_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM roles r \
         JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = $1 ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Grants a role. Returns false when nothing was inserted (already granted or unknown role).
pub async fn assign_role<'e, E: PgExecutor<'e>>(db: E, user_id: i64, role: Role) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) \
         SELECT $1, id FROM roles WHERE name = $2 \
         ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn ensure_role<'e, E: PgExecutor<'e>>(db: E, role: Role) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(role.as_str())
        .execute(db)
        .await?;
    Ok(())
}
