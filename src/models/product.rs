use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product joined with its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub weight_kg: Option<Decimal>,
    /// "Length x Width x Height"
    pub dimensions_cm: Option<String>,
    pub active: bool,
    pub category_id: i64,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub dimensions_cm: Option<String>,
    pub active: Option<bool>,
    pub category_id: i64,
}

/// Partial update, absent fields are left untouched.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub dimensions_cm: Option<String>,
    pub active: Option<bool>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category_id: Option<i64>,
}
