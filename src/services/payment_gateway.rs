use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;

/// What the shop sends to the payment provider.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: i64,
    pub amount: Decimal,
    pub payment_method: String,
    pub external_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeResult {
    pub approved: bool,
    pub reference: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> ChargeResult;
}

pub fn transaction_reference(approved: bool, unix_millis: i64) -> String {
    if approved {
        format!("REF-{}", unix_millis)
    } else {
        format!("FAIL-{}", unix_millis)
    }
}

/// Approves a charge with a fixed probability.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    approval_rate: f64,
}

impl SimulatedGateway {
    /// A NaN rate never approves.
    pub fn new(approval_rate: f64) -> Self {
        let approval_rate = if approval_rate.is_nan() {
            0.0
        } else {
            approval_rate.clamp(0.0, 1.0)
        };
        SimulatedGateway { approval_rate }
    }

    pub fn approval_rate(&self) -> f64 {
        self.approval_rate
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> ChargeResult {
        let approved = rand::rng().random_bool(self.approval_rate);
        let reference = transaction_reference(approved, Utc::now().timestamp_millis());

        log::debug!(
            "💳 Simulated charge for order {} ({} via {}): {}",
            request.order_id,
            request.amount,
            request.payment_method,
            reference
        );

        ChargeResult { approved, reference }
    }
}
