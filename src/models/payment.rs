use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PaymentState;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub payment_method_id: i32,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub status: PaymentState,
    pub transaction_reference: Option<String>,
    pub extra_data: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PaymentRequest {
    pub order_id: i64,
    pub payment_method_id: i32,
    pub amount: Decimal,
    /// Token issued by the payment provider's client SDK
    pub external_token: Option<String>,
}
