use rust_decimal::Decimal;

use crate::database::Database;
use crate::models::{OrderStatusCode, Payment, PaymentRequest, PaymentState};
use crate::repositories::payments::NewPayment;
use crate::repositories::{lookups, orders, payments};
use crate::services::payment_gateway::{ChargeRequest, PaymentGateway};
use crate::utils::{round_money, AppError, AppResult};

#[derive(Debug)]
pub struct PaymentOutcome {
    pub approved: bool,
    pub payment: Payment,
}

/// Rounds the submitted amount and compares it with the order total.
pub fn check_amount(submitted: Decimal, order_total: Decimal) -> AppResult<Decimal> {
    let amount = round_money(submitted);
    if amount != round_money(order_total) {
        return Err(AppError::InvalidRequest(format!(
            "Payment amount {} does not match order total {}",
            amount, order_total
        )));
    }
    Ok(amount)
}

/// Charges an order through the gateway and records the attempt.
///
/// A rejected charge is not an error: the attempt is stored and the order stays
/// pending, so the caller can retry.
pub async fn process_payment(
    db: &Database,
    gateway: &dyn PaymentGateway,
    user_id: i64,
    request: &PaymentRequest,
) -> AppResult<PaymentOutcome> {
    let mut tx = db.begin().await?;

    let order = orders::lock_by_id(&mut *tx, request.order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| AppError::InvalidRequest(format!("Order {} not found", request.order_id)))?;

    if order.status() != Some(OrderStatusCode::PendingPayment) {
        return Err(AppError::InvalidRequest(format!(
            "Order {} is not pending payment (current status: {})",
            order.id, order.status_name
        )));
    }

    let amount = check_amount(request.amount, order.total)?;

    let method = lookups::find_payment_method(&mut *tx, request.payment_method_id)
        .await?
        .filter(|m| m.active)
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "Payment method {} is not available",
                request.payment_method_id
            ))
        })?;

    let result = gateway
        .charge(&ChargeRequest {
            order_id: order.id,
            amount,
            payment_method: method.name.clone(),
            external_token: request.external_token.clone(),
        })
        .await;

    let state = if result.approved {
        PaymentState::Approved
    } else {
        PaymentState::Rejected
    };

    let payment = payments::upsert(
        &mut *tx,
        &NewPayment {
            order_id: order.id,
            payment_method_id: method.id,
            amount,
            status: state,
            transaction_reference: Some(&result.reference),
            extra_data: request.external_token.as_deref(),
        },
    )
    .await?;

    orders::set_payment(&mut *tx, order.id, state, Some(&result.reference)).await?;
    if result.approved {
        orders::set_status(&mut *tx, order.id, OrderStatusCode::Paid.id()).await?;
    }
    tx.commit().await?;

    if result.approved {
        log::info!("✅ Payment approved for order {}: {}", order.id, result.reference);
    } else {
        log::warn!("⚠️  Payment rejected for order {}: {}", order.id, result.reference);
    }

    Ok(PaymentOutcome {
        approved: result.approved,
        payment,
    })
}

pub async fn get_payment(db: &Database, user_id: i64, order_id: i64) -> AppResult<Payment> {
    let not_found = || AppError::NotFound(format!("No payment for order {}", order_id));
    orders::find_by_id(db.pool(), order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(not_found)?;
    payments::find_by_order(db.pool(), order_id)
        .await?
        .ok_or_else(not_found)
}
