use crate::database::Database;
use crate::models::{RegisterUserRequest, Role, UpdateUserRequest, UserResponse};
use crate::repositories::users::{self, NewUser};
use crate::services::auth_service;
use crate::utils::{AppError, AppResult};

fn require(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Minimal shape check, the unique index decides the rest.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn validate_registration(request: &RegisterUserRequest) -> AppResult<()> {
    require(&request.first_name, "first_name")?;
    require(&request.last_name, "last_name")?;
    require(&request.email, "email")?;
    require(&request.password, "password")?;
    if !is_valid_email(&request.email) {
        return Err(AppError::InvalidRequest("Invalid email address".to_string()));
    }
    Ok(())
}

pub async fn register(db: &Database, bcrypt_cost: u32, request: &RegisterUserRequest) -> AppResult<UserResponse> {
    validate_registration(request)?;
    let email = request.email.trim().to_lowercase();

    if users::find_by_email(db.pool(), &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = auth_service::hash_password(&request.password, bcrypt_cost)?;

    let mut tx = db.begin().await?;
    let user = users::insert(
        &mut *tx,
        NewUser {
            first_name: request.first_name.trim(),
            last_name: request.last_name.trim(),
            email: &email,
            password_hash: &password_hash,
            phone: request.phone.as_deref(),
        },
    )
    .await
    .map_err(|e| AppError::from_db(e, "Email already registered"))?;
    users::assign_role(&mut *tx, user.id, Role::Customer).await?;
    tx.commit().await?;

    log::info!("✅ User registered: {} (id {})", user.email, user.id);
    Ok(UserResponse::from_user(user, vec![Role::Customer.to_string()]))
}

pub async fn list_users(db: &Database) -> AppResult<Vec<UserResponse>> {
    let mut result = Vec::new();
    for user in users::list_active(db.pool()).await? {
        let roles = users::roles_for(db.pool(), user.id).await?;
        result.push(UserResponse::from_user(user, roles));
    }
    Ok(result)
}

pub async fn get_user(db: &Database, id: i64) -> AppResult<UserResponse> {
    let user = users::find_by_id(db.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    let roles = users::roles_for(db.pool(), user.id).await?;
    Ok(UserResponse::from_user(user, roles))
}

pub async fn update_user(db: &Database, id: i64, request: &UpdateUserRequest) -> AppResult<UserResponse> {
    require(&request.first_name, "first_name")?;
    require(&request.last_name, "last_name")?;

    let user = users::update_profile(
        db.pool(),
        id,
        request.first_name.trim(),
        request.last_name.trim(),
        request.phone.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    let roles = users::roles_for(db.pool(), user.id).await?;
    Ok(UserResponse::from_user(user, roles))
}

/// Soft delete.
pub async fn deactivate_user(db: &Database, id: i64) -> AppResult<()> {
    if !users::deactivate(db.pool(), id).await? {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }
    log::info!("🗑️ User {} deactivated", id);
    Ok(())
}
