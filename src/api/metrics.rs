use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static ORDERS_CREATED: AtomicU64 = AtomicU64::new(0);
static PAYMENTS_APPROVED: AtomicU64 = AtomicU64::new(0);
static PAYMENTS_REJECTED: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_orders_created() {
    ORDERS_CREATED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_payment(approved: bool) {
    if approved {
        PAYMENTS_APPROVED.fetch_add(1, Ordering::Relaxed);
    } else {
        PAYMENTS_REJECTED.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub orders_created_total: u64,
    pub payments_approved_total: u64,
    pub payments_rejected_total: u64,
}

impl MetricsResponse {
    pub fn snapshot() -> Self {
        MetricsResponse {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            orders_created_total: ORDERS_CREATED.load(Ordering::Relaxed),
            payments_approved_total: PAYMENTS_APPROVED.load(Ordering::Relaxed),
            payments_rejected_total: PAYMENTS_REJECTED.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        let counters = [
            ("http_requests_total", "Total number of HTTP requests", self.http_requests_total),
            ("http_errors_total", "Total number of HTTP 5xx responses", self.http_errors_total),
            ("orders_created_total", "Total number of orders placed", self.orders_created_total),
            ("payments_approved_total", "Total number of approved payments", self.payments_approved_total),
            ("payments_rejected_total", "Total number of rejected payments", self.payments_rejected_total),
        ];

        counters
            .iter()
            .map(|(name, help, value)| {
                format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", body = String, content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().render())
}
