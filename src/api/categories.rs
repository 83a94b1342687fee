use actix_web::{web, HttpResponse};

use crate::api::fail;
use crate::database::Database;
use crate::middleware::AdminUser;
use crate::models::{Category, CategoryRequest};
use crate::services::category_service;

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(db: web::Data<Database>) -> HttpResponse {
    log::info!("📂 GET /categories");

    match category_service::list_categories(&db).await {
        Ok(categories) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "categories": categories,
            "total": categories.len()
        })),
        Err(e) => fail("List categories", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(db: web::Data<Database>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("📂 GET /categories/{}", id);

    match category_service::get_category(&db, id).await {
        Ok(category) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "category": category
        })),
        Err(e) => fail("Get category", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid name or description"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    db: web::Data<Database>,
    _admin: AdminUser,
    request: web::Json<CategoryRequest>,
) -> HttpResponse {
    log::info!("📝 POST /categories - name: {}", request.name);

    match category_service::create_category(&db, &request).await {
        Ok(category) => {
            log::info!("✅ Category created: {} ({})", category.name, category.id);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "category": category
            }))
        }
        Err(e) => fail("Create category", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    db: web::Data<Database>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<CategoryRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("✏️  PUT /categories/{}", id);

    match category_service::update_category(&db, id, &request).await {
        Ok(category) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "category": category
        })),
        Err(e) => fail("Update category", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has products")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(db: web::Data<Database>, _admin: AdminUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /categories/{}", id);

    match category_service::delete_category(&db, id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => fail("Delete category", e),
    }
}
