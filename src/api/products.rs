use actix_web::{web, HttpResponse};

use crate::api::fail;
use crate::database::Database;
use crate::middleware::AdminUser;
use crate::models::{CreateProductRequest, Product, ProductQuery, UpdateProductRequest};
use crate::services::product_service;

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(ProductQuery),
    responses((status = 200, description = "Active products", body = [Product]))
)]
pub async fn list_products(db: web::Data<Database>, query: web::Query<ProductQuery>) -> HttpResponse {
    log::info!("🛍️ GET /products - category: {:?}", query.category_id);

    match product_service::list_products(&db, query.category_id).await {
        Ok(products) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "products": products,
            "total": products.len()
        })),
        Err(e) => fail("List products", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/admin/all",
    tag = "Products",
    responses(
        (status = 200, description = "Every product, inactive included", body = [Product]),
        (status = 403, description = "Administrator role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_all_products(db: web::Data<Database>, _admin: AdminUser) -> HttpResponse {
    log::info!("🛍️ GET /products/admin/all");

    match product_service::list_all_products(&db).await {
        Ok(products) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "products": products,
            "total": products.len()
        })),
        Err(e) => fail("List all products", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found or inactive")
    )
)]
pub async fn get_product(db: web::Data<Database>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🛍️ GET /products/{}", id);

    match product_service::get_product(&db, id).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "product": product
        })),
        Err(e) => fail("Get product", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid fields or unknown category"),
        (status = 409, description = "SKU already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    db: web::Data<Database>,
    _admin: AdminUser,
    request: web::Json<CreateProductRequest>,
) -> HttpResponse {
    log::info!("📝 POST /products - sku: {}", request.sku);

    match product_service::create_product(&db, &request).await {
        Ok(product) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "product": product
        })),
        Err(e) => fail("Create product", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Product not found"),
        (status = 409, description = "SKU already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    db: web::Data<Database>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<UpdateProductRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!("✏️  PUT /products/{}", id);

    match product_service::update_product(&db, id, &request).await {
        Ok(product) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "product": product
        })),
        Err(e) => fail("Update product", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(db: web::Data<Database>, _admin: AdminUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /products/{}", id);

    match product_service::deactivate_product(&db, id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => fail("Delete product", e),
    }
}
