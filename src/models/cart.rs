use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart item joined with the live product data.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CartItemView {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub added_at: DateTime<Utc>,
}

/// Cart with totals computed on read.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CartView {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<CartItemView>,
    pub item_count: i64,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}
