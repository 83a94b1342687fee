use actix_web::{web, HttpResponse};

use crate::api::{fail, metrics};
use crate::config::AppConfig;
use crate::database::Database;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{CreateOrderRequest, Order, OrderFilter, OrderStatus, PaymentMethod, StatusQuery};
use crate::services::order_service;

fn order_body(order: Order) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "order": order
    })
}

fn orders_body(orders: Vec<Order>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "orders": orders,
        "total": orders.len()
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed, stock reserved", body = Order),
        (status = 400, description = "Invalid address, payment method, quantity or insufficient stock"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    user: AuthenticatedUser,
    request: web::Json<CreateOrderRequest>,
) -> HttpResponse {
    let source = if request.items.is_empty() { "cart" } else { "items" };
    log::info!("📦 POST /orders - user: {}, from {}", user.user_id, source);

    match order_service::checkout(&db, &config.pricing, user.user_id, &request).await {
        Ok(order) => {
            metrics::increment_orders_created();
            HttpResponse::Created().json(order_body(order))
        }
        Err(e) => fail("Checkout", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Orders",
    responses((status = 200, description = "Caller's orders, newest first", body = [Order])),
    security(("bearer_auth" = []))
)]
pub async fn list_orders(db: web::Data<Database>, user: AuthenticatedUser) -> HttpResponse {
    log::info!("📦 GET /orders - user: {}", user.user_id);

    match order_service::list_orders(&db, user.user_id).await {
        Ok(orders) => orders_body(orders),
        Err(e) => fail("List orders", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with details", body = Order),
        (status = 404, description = "Order not found for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_order(db: web::Data<Database>, user: AuthenticatedUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("📦 GET /orders/{} - user: {}", id, user.user_id);

    match order_service::get_order(&db, user.user_id, id).await {
        Ok(order) => HttpResponse::Ok().json(order_body(order)),
        Err(e) => fail("Get order", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/cancel",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled, stock restored", body = Order),
        (status = 400, description = "Order can no longer be cancelled"),
        (status = 404, description = "Order not found for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_order(db: web::Data<Database>, user: AuthenticatedUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("🚫 PUT /orders/{}/cancel - user: {}", id, user.user_id);

    match order_service::cancel_order(&db, user.user_id, id).await {
        Ok(order) => HttpResponse::Ok().json(order_body(order)),
        Err(e) => fail("Cancel order", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/admin/all",
    tag = "Orders",
    params(OrderFilter),
    responses((status = 200, description = "Every order, newest first", body = [Order])),
    security(("bearer_auth" = []))
)]
pub async fn list_all_orders(
    db: web::Data<Database>,
    _admin: AdminUser,
    query: web::Query<OrderFilter>,
) -> HttpResponse {
    log::info!("📦 GET /orders/admin/all - status: {:?}", query.status_id);

    match order_service::list_all_orders(&db, query.status_id).await {
        Ok(orders) => orders_body(orders),
        Err(e) => fail("List all orders", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/admin/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with details", body = Order),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_any_order(db: web::Data<Database>, _admin: AdminUser, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    log::info!("📦 GET /orders/admin/{}", id);

    match order_service::get_any_order(&db, id).await {
        Ok(order) => HttpResponse::Ok().json(order_body(order)),
        Err(e) => fail("Get order (admin)", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/admin/{id}/status",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order id"), StatusQuery),
    responses(
        (status = 200, description = "Status changed", body = Order),
        (status = 400, description = "Unknown status or terminal order"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_order_status(
    db: web::Data<Database>,
    admin: AdminUser,
    path: web::Path<i64>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    let id = path.into_inner();
    log::info!(
        "🔄 PUT /orders/admin/{}/status - status: {}, by admin {}",
        id,
        query.status_id,
        admin.sub
    );

    match order_service::update_status(&db, id, query.status_id).await {
        Ok(order) => HttpResponse::Ok().json(order_body(order)),
        Err(e) => fail("Update order status", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/order-statuses",
    tag = "Orders",
    responses((status = 200, description = "Order status lookup", body = [OrderStatus]))
)]
pub async fn list_order_statuses(db: web::Data<Database>) -> HttpResponse {
    log::info!("📋 GET /order-statuses");

    match order_service::list_statuses(&db).await {
        Ok(statuses) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "statuses": statuses,
            "total": statuses.len()
        })),
        Err(e) => fail("List order statuses", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/payment-methods",
    tag = "Payments",
    responses((status = 200, description = "Active payment methods", body = [PaymentMethod]))
)]
pub async fn list_payment_methods(db: web::Data<Database>) -> HttpResponse {
    log::info!("📋 GET /payment-methods");

    match order_service::list_payment_methods(&db).await {
        Ok(methods) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "payment_methods": methods,
            "total": methods.len()
        })),
        Err(e) => fail("List payment methods", e),
    }
}
