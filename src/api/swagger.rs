use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop Service API",
        version = "1.0.0",
        description = "REST API for the shop backend.\n\n**Authentication:** log in at `/api/v1/auth/login` and send the token as `Authorization: Bearer <token>`. Admin endpoints need the `ADMIN` role.\n\n**Features:**\n- Customer registration and JWT login\n- Category and product catalog\n- Per-user cart with totals computed on read\n- Address book with one default shipping address\n- Checkout with stock reservation and cancellation\n- Simulated payment gateway\n- Product image upload",
        contact(
            name = "Shop Service Team",
            email = "support@connectshop.com"
        )
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::get_me,
        crate::api::auth::verify_token,

        // Users
        crate::api::users::register,
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        // Categories
        crate::api::categories::list_categories,
        crate::api::categories::get_category,
        crate::api::categories::create_category,
        crate::api::categories::update_category,
        crate::api::categories::delete_category,

        // Products
        crate::api::products::list_products,
        crate::api::products::list_all_products,
        crate::api::products::get_product,
        crate::api::products::create_product,
        crate::api::products::update_product,
        crate::api::products::delete_product,
        crate::api::images::upload_product_image,
        crate::api::images::serve_product_image,

        // Cart
        crate::api::cart::get_cart,
        crate::api::cart::add_item,
        crate::api::cart::update_item,
        crate::api::cart::remove_item,
        crate::api::cart::clear_cart,

        // Addresses
        crate::api::addresses::create_address,
        crate::api::addresses::list_addresses,
        crate::api::addresses::get_address,
        crate::api::addresses::update_address,
        crate::api::addresses::delete_address,
        crate::api::addresses::list_all_addresses,
        crate::api::addresses::get_any_address,

        // Orders
        crate::api::orders::create_order,
        crate::api::orders::list_orders,
        crate::api::orders::get_order,
        crate::api::orders::cancel_order,
        crate::api::orders::list_all_orders,
        crate::api::orders::get_any_order,
        crate::api::orders::update_order_status,
        crate::api::orders::list_order_statuses,

        // Payments
        crate::api::orders::list_payment_methods,
        crate::api::payments::process_payment,
        crate::api::payments::get_payment,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::Claims,
            crate::models::UserResponse,
            crate::models::RegisterUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::Category,
            crate::models::CategoryRequest,
            crate::models::Product,
            crate::models::CreateProductRequest,
            crate::models::UpdateProductRequest,
            crate::services::image_service::StoredImage,
            crate::models::CartView,
            crate::models::CartItemView,
            crate::models::AddCartItemRequest,
            crate::models::UpdateCartItemRequest,
            crate::models::Address,
            crate::models::CreateAddressRequest,
            crate::models::UpdateAddressRequest,
            crate::models::Order,
            crate::models::OrderDetail,
            crate::models::OrderItemRequest,
            crate::models::CreateOrderRequest,
            crate::models::OrderStatus,
            crate::models::PaymentMethod,
            crate::models::PaymentState,
            crate::models::Payment,
            crate::models::PaymentRequest,
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "JWT login and token introspection."),
        (name = "Users", description = "Customer registration and admin user management. Deletes are soft."),
        (name = "Categories", description = "Product categories. Reads are public, writes need ADMIN."),
        (name = "Products", description = "Catalog and product images. Public reads show active products only."),
        (name = "Cart", description = "Caller's cart. Subtotals and total are computed on read."),
        (name = "Addresses", description = "Caller's address book with default shipping and billing flags."),
        (name = "Orders", description = "Checkout, order history, cancellation and admin status changes."),
        (name = "Payments", description = "Simulated payment processing and payment method lookup."),
        (name = "Health", description = "Health check and Prometheus metrics."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/v1/orders"));
        assert!(paths.contains_key("/api/v1/payments/process"));
        assert!(paths.contains_key("/api/v1/orders/admin/{id}/status"));
        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/api/v1/uploads/product-image"));
        assert!(paths.contains_key("/api/v1/images/products/{filename}"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
