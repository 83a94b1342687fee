use actix_web::{http::StatusCode, web, HttpResponse};

use crate::api::{fail, metrics};
use crate::database::Database;
use crate::middleware::AuthenticatedUser;
use crate::models::{Payment, PaymentRequest};
use crate::services::payment_service::{self, PaymentOutcome};
use crate::services::PaymentGateway;

/// 200 for an approved charge, 402 for a declined one. Both carry the payment.
pub fn outcome_response(outcome: PaymentOutcome) -> HttpResponse {
    let (status, message) = if outcome.approved {
        (StatusCode::OK, "Payment approved")
    } else {
        (StatusCode::PAYMENT_REQUIRED, "Payment rejected by the gateway")
    };

    HttpResponse::build(status).json(serde_json::json!({
        "success": outcome.approved,
        "message": message,
        "payment": outcome.payment
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/process",
    tag = "Payments",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment approved, order paid", body = Payment),
        (status = 402, description = "Payment rejected, order still pending", body = Payment),
        (status = 400, description = "Unknown order, wrong status, amount mismatch or invalid method")
    ),
    security(("bearer_auth" = []))
)]
pub async fn process_payment(
    db: web::Data<Database>,
    gateway: web::Data<dyn PaymentGateway>,
    user: AuthenticatedUser,
    request: web::Json<PaymentRequest>,
) -> HttpResponse {
    log::info!(
        "💳 POST /payments/process - user: {}, order: {}, amount: {}",
        user.user_id,
        request.order_id,
        request.amount
    );

    match payment_service::process_payment(&db, gateway.get_ref(), user.user_id, &request).await {
        Ok(outcome) => {
            metrics::record_payment(outcome.approved);
            outcome_response(outcome)
        }
        Err(e) => fail("Process payment", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/order/{order_id}",
    tag = "Payments",
    params(("order_id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Latest payment attempt", body = Payment),
        (status = 404, description = "No payment for this order")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_payment(db: web::Data<Database>, user: AuthenticatedUser, path: web::Path<i64>) -> HttpResponse {
    let order_id = path.into_inner();
    log::info!("💳 GET /payments/order/{} - user: {}", order_id, user.user_id);

    match payment_service::get_payment(&db, user.user_id, order_id).await {
        Ok(payment) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "payment": payment
        })),
        Err(e) => fail("Get payment", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::models::PaymentState;

    fn payment(status: PaymentState, reference: &str) -> Payment {
        Payment {
            id: 1,
            order_id: 10,
            payment_method_id: 1,
            amount: Decimal::new(605997, 2),
            paid_at: Utc::now(),
            status,
            transaction_reference: Some(reference.to_string()),
            extra_data: None,
        }
    }

    #[actix_web::test]
    async fn test_approved_payment_is_ok() {
        let res = outcome_response(PaymentOutcome {
            approved: true,
            payment: payment(PaymentState::Approved, "REF-1"),
        });
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(&to_bytes(res.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["payment"]["status"], "approved");
        assert_eq!(body["payment"]["amount"], "6059.97");
    }

    #[actix_web::test]
    async fn test_rejected_payment_is_402() {
        let res = outcome_response(PaymentOutcome {
            approved: false,
            payment: payment(PaymentState::Rejected, "FAIL-1"),
        });
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);

        let body: serde_json::Value = serde_json::from_slice(&to_bytes(res.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["payment"]["transaction_reference"], "FAIL-1");
    }
}
