use actix_web::{web, HttpResponse};

use crate::api::fail;
use crate::config::AppConfig;
use crate::database::Database;
use crate::middleware::AuthenticatedUser;
use crate::models::UserResponse;
use crate::services::auth_service::{self, AuthResponse, Claims, LoginRequest};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &config.jwt, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => fail("Login", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(db: web::Data<Database>, user: AuthenticatedUser) -> HttpResponse {
    log::info!("👤 GET /auth/me - user: {}", user.user_id);

    match auth_service::get_current_user(&db, &user.claims).await {
        Ok(profile) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": profile
        })),
        Err(e) => fail("Get current user", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = Claims),
        (status = 401, description = "Invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(user: AuthenticatedUser) -> HttpResponse {
    log::info!("✓ GET /auth/verify - user: {}", user.user_id);

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "valid": true,
        "claims": user.claims
    }))
}
