use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::database::Database;
use crate::models::{Role, User, UserResponse};
use crate::repositories::users;
use crate::utils::{AppError, AppResult};

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub roles: Vec<String>,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

// Generate JWT token
pub fn generate_jwt(settings: &JwtSettings, user: &User, roles: &[String]) -> AppResult<String> {
    let now = Utc::now();
    let lifetime = Duration::try_hours(settings.expiration_hours)
        .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;
    let expires_at = now
        .checked_add_signed(lifetime)
        .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        roles: roles.to_vec(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: settings.audience.clone(),
        iss: settings.issuer.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(settings: &JwtSettings, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.audience.as_str()]);
    validation.set_issuer(&[settings.issuer.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Holds verified claims against the stored account.
///
/// A deleted or deactivated account is refused, and the roles are replaced by
/// the current ones so role changes apply before the token expires.
pub fn apply_account(mut claims: Claims, account: Option<(User, Vec<String>)>) -> AppResult<Claims> {
    let (user, roles) =
        account.ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    if !user.active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }
    claims.email = user.email;
    claims.roles = roles;
    Ok(claims)
}

/// Reloads the token's user, see `apply_account`.
pub async fn refresh_claims(db: &Database, claims: Claims) -> AppResult<Claims> {
    let user_id = claims.user_id()?;
    let account = match users::find_by_id(db.pool(), user_id).await? {
        Some(user) if user.active => {
            let roles = users::roles_for(db.pool(), user.id).await?;
            Some((user, roles))
        }
        Some(user) => Some((user, Vec::new())),
        None => None,
    };
    apply_account(claims, account)
}

// User login
pub async fn login(db: &Database, settings: &JwtSettings, request: &LoginRequest) -> AppResult<AuthResponse> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = users::find_by_email(db.pool(), request.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(invalid());
    }

    if !user.active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    let roles = users::roles_for(db.pool(), user.id).await?;
    let token = generate_jwt(settings, &user, &roles)?;

    Ok(AuthResponse {
        success: true,
        token,
        token_type: "Bearer".to_string(),
        expires_in: settings.expiration_hours * 3600,
        user: UserResponse::from_user(user, roles),
    })
}

// Get current user
pub async fn get_current_user(db: &Database, claims: &Claims) -> AppResult<UserResponse> {
    let user_id = claims.user_id()?;
    let user = users::find_by_id(db.pool(), user_id)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let roles = users::roles_for(db.pool(), user.id).await?;
    Ok(UserResponse::from_user(user, roles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret".to_string(),
            issuer: "shop-service".to_string(),
            audience: "shop-api".to_string(),
            expiration_hours: 1,
        }
    }

    fn user() -> User {
        User {
            id: 42,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            phone: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let settings = settings();
        let roles = vec!["CUSTOMER".to_string()];
        let token = generate_jwt(&settings, &user(), &roles).unwrap();

        let claims = verify_token(&settings, &token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.has_role(Role::Customer));
        assert!(!claims.is_admin());
        assert_eq!(claims.iss, "shop-service");
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let token = generate_jwt(&settings(), &user(), &[]).unwrap();
        let other = JwtSettings {
            audience: "another-api".to_string(),
            ..settings()
        };
        assert!(matches!(verify_token(&other, &token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_jwt(&settings(), &user(), &[]).unwrap();
        let other = JwtSettings {
            secret: "another-secret".to_string(),
            ..settings()
        };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Well past the default 60s leeway
        let expired = JwtSettings {
            expiration_hours: -2,
            ..settings()
        };
        let token = generate_jwt(&expired, &user(), &[]).unwrap();
        assert!(verify_token(&settings(), &token).is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let huge = JwtSettings {
            expiration_hours: i64::MAX,
            ..settings()
        };
        assert!(matches!(generate_jwt(&huge, &user(), &[]), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_account_reload_replaces_roles() {
        let token = generate_jwt(&settings(), &user(), &["ADMIN".to_string()]).unwrap();
        let claims = verify_token(&settings(), &token).unwrap();
        assert!(claims.is_admin());

        let refreshed = apply_account(claims, Some((user(), vec!["CUSTOMER".to_string()]))).unwrap();
        assert!(!refreshed.is_admin());
        assert!(refreshed.has_role(Role::Customer));
    }

    #[test]
    fn test_inactive_or_missing_account_is_refused() {
        let token = generate_jwt(&settings(), &user(), &["CUSTOMER".to_string()]).unwrap();
        let claims = verify_token(&settings(), &token).unwrap();

        let inactive = User { active: false, ..user() };
        assert!(matches!(
            apply_account(claims.clone(), Some((inactive, vec![]))),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(apply_account(claims, None), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_password_hashing() {
        let hashed = hash_password("s3cret!", 4).unwrap();
        assert_ne!(hashed, "s3cret!");
        assert!(verify_password("s3cret!", &hashed));
        assert!(!verify_password("wrong", &hashed));
        assert!(!verify_password("s3cret!", "not-a-bcrypt-hash"));
    }
}
