use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::database::Database;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

fn health_body(database_ok: bool) -> HealthResponse {
    HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "up" } else { "down" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: Option<web::Data<Database>>) -> impl Responder {
    let database_ok = match db {
        Some(db) => db.health_check().await,
        None => false,
    };

    if database_ok {
        HttpResponse::Ok().json(health_body(true))
    } else {
        log::warn!("⚠️  Health check: database unreachable");
        HttpResponse::ServiceUnavailable().json(health_body(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_health_body() {
        let body = health_body(true);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "shop-service");
        assert_eq!(body.database, "up");
    }

    #[actix_web::test]
    async fn test_health_without_database_is_degraded() {
        let app = test::init_service(App::new().route("/health", web::get().to(health_check))).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], "down");
    }
}
