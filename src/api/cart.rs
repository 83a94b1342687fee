use actix_web::{web, HttpResponse};

use crate::api::fail;
use crate::database::Database;
use crate::middleware::AuthenticatedUser;
use crate::models::{AddCartItemRequest, CartView, UpdateCartItemRequest};
use crate::services::cart_service;

fn cart_body(cart: CartView) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "cart": cart
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    tag = "Cart",
    responses((status = 200, description = "Caller's cart with computed totals", body = CartView)),
    security(("bearer_auth" = []))
)]
pub async fn get_cart(db: web::Data<Database>, user: AuthenticatedUser) -> HttpResponse {
    log::info!("🛒 GET /cart - user: {}", user.user_id);

    match cart_service::get_cart(&db, user.user_id).await {
        Ok(cart) => cart_body(cart),
        Err(e) => fail("Get cart", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    tag = "Cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added, quantities merged", body = CartView),
        (status = 400, description = "Invalid quantity, inactive product or insufficient stock"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_item(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    request: web::Json<AddCartItemRequest>,
) -> HttpResponse {
    log::info!(
        "🛒 POST /cart/items - user: {}, product: {}, qty: {}",
        user.user_id,
        request.product_id,
        request.quantity
    );

    match cart_service::add_item(&db, user.user_id, request.product_id, request.quantity).await {
        Ok(cart) => cart_body(cart),
        Err(e) => fail("Add cart item", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{item_id}",
    tag = "Cart",
    params(("item_id" = i64, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartView),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Item not in the caller's cart")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateCartItemRequest>,
) -> HttpResponse {
    let item_id = path.into_inner();
    log::info!("🛒 PUT /cart/items/{} - qty: {}", item_id, request.quantity);

    match cart_service::update_item(&db, user.user_id, item_id, request.quantity).await {
        Ok(cart) => cart_body(cart),
        Err(e) => fail("Update cart item", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{item_id}",
    tag = "Cart",
    params(("item_id" = i64, Path, description = "Cart item id")),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Item not in the caller's cart")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_item(db: web::Data<Database>, user: AuthenticatedUser, path: web::Path<i64>) -> HttpResponse {
    let item_id = path.into_inner();
    log::info!("🛒 DELETE /cart/items/{} - user: {}", item_id, user.user_id);

    match cart_service::remove_item(&db, user.user_id, item_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => fail("Remove cart item", e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    tag = "Cart",
    responses((status = 204, description = "Cart emptied")),
    security(("bearer_auth" = []))
)]
pub async fn clear_cart(db: web::Data<Database>, user: AuthenticatedUser) -> HttpResponse {
    log::info!("🛒 DELETE /cart - user: {}", user.user_id);

    match cart_service::clear_cart(&db, user.user_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => fail("Clear cart", e),
    }
}
