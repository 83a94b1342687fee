use crate::config::AppConfig;
use crate::database::Database;
use crate::models::Role;
use crate::repositories::users::{self, NewUser};
use crate::services::auth_service;
use crate::utils::AppResult;

/// Ensures the roles exist and creates the administrator account on first start.
/// Failures are logged; the server still starts.
pub async fn bootstrap_seed(db: &Database, config: &AppConfig) {
    for role in [Role::Admin, Role::Customer] {
        if let Err(e) = users::ensure_role(db.pool(), role).await {
            log::error!("   ❌ Failed to seed role {}: {}", role, e);
        }
    }

    match seed_admin(db, config).await {
        Ok(true) => log::info!("   ✅ Administrator {} created", config.admin_email),
        Ok(false) => log::info!("👤 Administrator {} already present, skipping seed", config.admin_email),
        Err(e) => log::error!("   ❌ Failed to seed administrator: {}", e),
    }
}

/// Returns true when the account was created by this call.
async fn seed_admin(db: &Database, config: &AppConfig) -> AppResult<bool> {
    if let Some(existing) = users::find_by_email(db.pool(), &config.admin_email).await? {
        // Make sure an existing account still carries the role
        users::assign_role(db.pool(), existing.id, Role::Admin).await?;
        return Ok(false);
    }

    let password_hash = auth_service::hash_password(&config.admin_password, config.bcrypt_cost)?;

    let mut tx = db.begin().await?;
    let admin = users::insert(
        &mut *tx,
        NewUser {
            first_name: "Admin",
            last_name: "ConnectShop",
            email: &config.admin_email.to_lowercase(),
            password_hash: &password_hash,
            phone: None,
        },
    )
    .await?;
    users::assign_role(&mut *tx, admin.id, Role::Admin).await?;
    tx.commit().await?;

    Ok(true)
}
