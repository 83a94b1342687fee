use actix_web::{web, HttpResponse};

use crate::api::fail;
use crate::config::AppConfig;
use crate::database::Database;
use crate::middleware::AdminUser;
use crate::models::{RegisterUserRequest, UpdateUserRequest, UserResponse};
use crate::services::user_service;

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    request: web::Json<RegisterUserRequest>,
) -> HttpResponse {
    log::info!("📝 POST /users - email: {}", request.email);

    match user_service::register(&db, config.bcrypt_cost, &request).await {
        Ok(user) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => fail("Registration", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "Active users", body = [UserResponse]),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(db: web::Data<Database>, _admin: AdminUser) -> HttpResponse {
    log::info!("👥 GET /users");

    match user_service::list_users(&db).await {
        Ok(users) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": users.len(),
            "users": users
        })),
        Err(e) => fail("List users", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(db: web::Data<Database>, _admin: AdminUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("👤 GET /users/{}", id);

    match user_service::get_user(&db, id).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => fail("Get user", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    db: web::Data<Database>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("✏️  PUT /users/{}", id);

    match user_service::update_user(&db, id, &request).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => fail("Update user", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(db: web::Data<Database>, admin: AdminUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /users/{} - by admin {}", id, admin.sub);

    match user_service::deactivate_user(&db, id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => fail("Delete user", e),
    }
}
