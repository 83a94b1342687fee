pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod health;
pub mod images;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;
pub mod swagger;
pub mod users;

use actix_web::{HttpResponse, ResponseError};

use crate::utils::AppError;

/// Logs a failed call and renders the error envelope. 5xx are logged by `AppError` itself.
pub(crate) fn fail(context: &str, err: AppError) -> HttpResponse {
    if !err.status_code().is_server_error() {
        log::warn!("❌ {} failed: {}", context, err);
    }
    err.error_response()
}
