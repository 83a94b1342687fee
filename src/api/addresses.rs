use actix_web::{web, HttpResponse};

use crate::api::fail;
use crate::database::Database;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{Address, CreateAddressRequest, UpdateAddressRequest};
use crate::services::address_service;

#[utoipa::path(
    post,
    path = "/api/v1/addresses",
    tag = "Addresses",
    request_body = CreateAddressRequest,
    responses(
        (status = 201, description = "Address created", body = Address),
        (status = 400, description = "Missing required fields")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_address(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    request: web::Json<CreateAddressRequest>,
) -> HttpResponse {
    log::info!("🏠 POST /addresses - user: {}", user.user_id);

    match address_service::create_address(&db, user.user_id, &request).await {
        Ok(address) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "address": address
        })),
        Err(e) => fail("Create address", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses",
    tag = "Addresses",
    responses((status = 200, description = "Caller's addresses", body = [Address])),
    security(("bearer_auth" = []))
)]
pub async fn list_addresses(db: web::Data<Database>, user: AuthenticatedUser) -> HttpResponse {
    log::info!("🏠 GET /addresses - user: {}", user.user_id);

    match address_service::list_addresses(&db, user.user_id).await {
        Ok(addresses) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "addresses": addresses,
            "total": addresses.len()
        })),
        Err(e) => fail("List addresses", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses/{id}",
    tag = "Addresses",
    params(("id" = i64, Path, description = "Address id")),
    responses(
        (status = 200, description = "Address found", body = Address),
        (status = 404, description = "Address not found for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_address(db: web::Data<Database>, user: AuthenticatedUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🏠 GET /addresses/{} - user: {}", id, user.user_id);

    match address_service::get_address(&db, user.user_id, id).await {
        Ok(address) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "address": address
        })),
        Err(e) => fail("Get address", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/addresses/{id}",
    tag = "Addresses",
    params(("id" = i64, Path, description = "Address id")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = Address),
        (status = 404, description = "Address not found for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_address(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateAddressRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("✏️  PUT /addresses/{} - user: {}", id, user.user_id);

    match address_service::update_address(&db, user.user_id, id, &request).await {
        Ok(address) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "address": address
        })),
        Err(e) => fail("Update address", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/addresses/{id}",
    tag = "Addresses",
    params(("id" = i64, Path, description = "Address id")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 400, description = "Default shipping address"),
        (status = 404, description = "Address not found for this user"),
        (status = 409, description = "Address referenced by orders")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_address(db: web::Data<Database>, user: AuthenticatedUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /addresses/{} - user: {}", id, user.user_id);

    match address_service::delete_address(&db, user.user_id, id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => fail("Delete address", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses/admin/all",
    tag = "Addresses",
    responses((status = 200, description = "Every address", body = [Address])),
    security(("bearer_auth" = []))
)]
pub async fn list_all_addresses(db: web::Data<Database>, _admin: AdminUser) -> HttpResponse {
    log::info!("🏠 GET /addresses/admin/all");

    match address_service::list_all_addresses(&db).await {
        Ok(addresses) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "addresses": addresses,
            "total": addresses.len()
        })),
        Err(e) => fail("List all addresses", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses/admin/{id}",
    tag = "Addresses",
    params(("id" = i64, Path, description = "Address id")),
    responses(
        (status = 200, description = "Address found", body = Address),
        (status = 404, description = "Address not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_any_address(db: web::Data<Database>, _admin: AdminUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🏠 GET /addresses/admin/{}", id);

    match address_service::get_any_address(&db, id).await {
        Ok(address) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "address": address
        })),
        Err(e) => fail("Get address (admin)", e),
    }
}
