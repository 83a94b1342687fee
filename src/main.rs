mod api;
mod config;
mod database;
mod middleware;
mod models;
mod repositories;
mod seeds;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{
    middleware::{Compress, Logger},
    web, App, HttpServer,
};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::middleware::AuthMiddleware;
use crate::services::{PaymentGateway, SimulatedGateway};

fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .supports_credentials()
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
        .max_age(3600)
}

fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Auth
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(api::auth::login))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/me", web::get().to(api::auth::get_me))
                            .route("/verify", web::get().to(api::auth::verify_token)),
                    ),
            )
            // Users: registration is public, the rest checks ADMIN in the handler
            .service(
                web::scope("/users")
                    .route("", web::post().to(api::users::register))
                    .route("", web::get().to(api::users::list_users))
                    .route("/{id}", web::get().to(api::users::get_user))
                    .route("/{id}", web::put().to(api::users::update_user))
                    .route("/{id}", web::delete().to(api::users::delete_user)),
            )
            // Categories: public reads, admin writes
            .service(
                web::scope("/categories")
                    .route("", web::get().to(api::categories::list_categories))
                    .route("", web::post().to(api::categories::create_category))
                    .route("/{id}", web::get().to(api::categories::get_category))
                    .route("/{id}", web::put().to(api::categories::update_category))
                    .route("/{id}", web::delete().to(api::categories::delete_category)),
            )
            // Products: public reads, admin writes
            .service(
                web::scope("/products")
                    .route("", web::get().to(api::products::list_products))
                    .route("", web::post().to(api::products::create_product))
                    .route("/admin/all", web::get().to(api::products::list_all_products))
                    .route("/{id}", web::get().to(api::products::get_product))
                    .route("/{id}", web::put().to(api::products::update_product))
                    .route("/{id}", web::delete().to(api::products::delete_product)),
            )
            // Product images: admin upload, public download
            .route(
                "/uploads/product-image",
                web::post().to(api::images::upload_product_image),
            )
            .route(
                "/images/products/{filename}",
                web::get().to(api::images::serve_product_image),
            )
            // Cart - Requires JWT
            .service(
                web::scope("/cart")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(api::cart::get_cart))
                    .route("", web::delete().to(api::cart::clear_cart))
                    .route("/items", web::post().to(api::cart::add_item))
                    .route("/items/{item_id}", web::put().to(api::cart::update_item))
                    .route("/items/{item_id}", web::delete().to(api::cart::remove_item)),
            )
            // Addresses - Requires JWT
            .service(
                web::scope("/addresses")
                    .wrap(AuthMiddleware)
                    .route("", web::post().to(api::addresses::create_address))
                    .route("", web::get().to(api::addresses::list_addresses))
                    .route("/admin/all", web::get().to(api::addresses::list_all_addresses))
                    .route("/admin/{id}", web::get().to(api::addresses::get_any_address))
                    .route("/{id}", web::get().to(api::addresses::get_address))
                    .route("/{id}", web::put().to(api::addresses::update_address))
                    .route("/{id}", web::delete().to(api::addresses::delete_address)),
            )
            // Orders - Requires JWT
            .service(
                web::scope("/orders")
                    .wrap(AuthMiddleware)
                    .route("", web::post().to(api::orders::create_order))
                    .route("", web::get().to(api::orders::list_orders))
                    .route("/admin/all", web::get().to(api::orders::list_all_orders))
                    .route("/admin/{id}", web::get().to(api::orders::get_any_order))
                    .route("/admin/{id}/status", web::put().to(api::orders::update_order_status))
                    .route("/{id}", web::get().to(api::orders::get_order))
                    .route("/{id}/cancel", web::put().to(api::orders::cancel_order)),
            )
            // Payments - Requires JWT
            .service(
                web::scope("/payments")
                    .wrap(AuthMiddleware)
                    .route("/process", web::post().to(api::payments::process_payment))
                    .route("/order/{order_id}", web::get().to(api::payments::get_payment)),
            )
            // Lookups
            .route("/order-statuses", web::get().to(api::orders::list_order_statuses))
            .route("/payment-methods", web::get().to(api::orders::list_payment_methods)),
    );
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {}", e));

    log::info!("🚀 Starting Shop Service...");

    let db = database::Database::new(&config.database_url, config.db_max_connections)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to PostgreSQL: {}", e));
    log::info!("✅ PostgreSQL connected successfully");

    db.migrate()
        .await
        .unwrap_or_else(|e| panic!("Failed to run migrations: {}", e));

    // 🌱 Roles and bootstrap administrator
    seeds::bootstrap_seed(&db, &config).await;

    let gateway: Arc<dyn PaymentGateway> = Arc::new(SimulatedGateway::new(config.payment_approval_rate));
    log::info!(
        "💳 Simulated payment gateway (approval rate {:.0}%)",
        config.payment_approval_rate * 100.0
    );

    log::info!("🖼️ Product images stored in {}", config.uploads.dir.display());

    let bind_address = config.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI document at: http://{}/api-docs/openapi.json", bind_address);

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);
    let gateway_data: web::Data<dyn PaymentGateway> = web::Data::from(gateway);

    // OpenAPI document
    let openapi = api::swagger::ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(gateway_data.clone())
            .wrap(build_cors(&config_data.cors_allowed_origins))
            .wrap(middleware::SecurityHeaders)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
