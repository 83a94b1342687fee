use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub recipient_name: String,
    pub street: String,
    pub street_number: Option<String>,
    pub additional_info: Option<String>,
    pub city: String,
    /// State / province
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default_shipping: bool,
    pub is_default_billing: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateAddressRequest {
    pub recipient_name: String,
    pub street: String,
    pub street_number: Option<String>,
    pub additional_info: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default_shipping: bool,
    #[serde(default)]
    pub is_default_billing: bool,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateAddressRequest {
    pub recipient_name: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub additional_info: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default_shipping: Option<bool>,
    pub is_default_billing: Option<bool>,
}
