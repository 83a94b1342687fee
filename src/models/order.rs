use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed ids of the rows seeded into `order_statuses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatusCode {
    PendingPayment = 1,
    Paid = 2,
    Shipped = 3,
    Delivered = 4,
    Cancelled = 5,
}

impl OrderStatusCode {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::PendingPayment),
            2 => Some(Self::Paid),
            3 => Some(Self::Shipped),
            4 => Some(Self::Delivered),
            5 => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Orders can be cancelled until they leave the warehouse.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::PendingPayment | Self::Paid)
    }
}

impl fmt::Display for OrderStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema)]
#[sqlx(type_name = "payment_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Approved,
    Rejected,
    Refunded,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct OrderStatus {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct PaymentMethod {
    pub id: i32,
    pub name: String,
    pub active: bool,
}

/// Frozen order line.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub shipping_address_id: i64,
    pub billing_address_id: i64,
    pub payment_method_id: i32,
    pub payment_method_name: String,
    pub status_id: i32,
    pub status_name: String,
    pub placed_at: DateTime<Utc>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
    pub customer_notes: Option<String>,
    pub payment_status: PaymentState,
    pub payment_reference: Option<String>,
    #[sqlx(skip)]
    pub details: Vec<OrderDetail>,
}

impl Order {
    pub fn status(&self) -> Option<OrderStatusCode> {
        OrderStatusCode::from_id(self.status_id)
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// Checkout request. Without `items` the caller's cart is ordered.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address_id: i64,
    pub billing_address_id: Option<i64>,
    pub payment_method_id: i32,
    pub customer_notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status_id: i32,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status_id: Option<i32>,
}
