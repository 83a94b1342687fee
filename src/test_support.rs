//! Fixtures for tests that run against PostgreSQL.
//!
//! Every fixture gets a unique name, so the tests can share one database.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::Database;
use crate::models::{
    Address, Category, CategoryRequest, CreateAddressRequest, CreateProductRequest, PaymentMethod, Product,
    Role, User,
};
use crate::repositories::{lookups, users};
use crate::services::payment_gateway::{transaction_reference, ChargeRequest, ChargeResult};
use crate::services::{address_service, category_service, product_service, PaymentGateway};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Config pointing at `DATABASE_URL`, with a fixed JWT secret.
pub fn config() -> AppConfig {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/shop_test".to_string());
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "JWT_SECRET" => Some("integration-test-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn database() -> Database {
    let db = Database::new(&config().database_url, 4).await.unwrap();
    db.migrate().await.unwrap();
    for role in [Role::Admin, Role::Customer] {
        users::ensure_role(db.pool(), role).await.unwrap();
    }
    db
}

pub async fn create_user(db: &Database, role: Role) -> User {
    let email = format!("{}@example.com", unique("user"));
    let user = users::insert(
        db.pool(),
        users::NewUser {
            first_name: "Test",
            last_name: "User",
            email: &email,
            password_hash: "not-a-hash",
            phone: None,
        },
    )
    .await
    .unwrap();
    users::assign_role(db.pool(), user.id, role).await.unwrap();
    user
}

pub async fn create_category(db: &Database) -> Category {
    let request = CategoryRequest {
        name: unique("category"),
        description: None,
    };
    category_service::create_category(db, &request).await.unwrap()
}

pub fn product_request(category_id: i64, price: &str, stock: i32) -> CreateProductRequest {
    CreateProductRequest {
        sku: unique("SKU"),
        name: unique("Product"),
        description: None,
        price: dec(price),
        stock,
        image_url: None,
        weight_kg: None,
        dimensions_cm: None,
        active: None,
        category_id,
    }
}

pub async fn create_product(db: &Database, category_id: i64, price: &str, stock: i32) -> Product {
    product_service::create_product(db, &product_request(category_id, price, stock))
        .await
        .unwrap()
}

pub fn address_request(default_shipping: bool) -> CreateAddressRequest {
    CreateAddressRequest {
        recipient_name: "Ana Silva".to_string(),
        street: "Rua das Flores".to_string(),
        street_number: Some("42".to_string()),
        additional_info: None,
        city: "Santiago".to_string(),
        state: "RM".to_string(),
        postal_code: "8320000".to_string(),
        country: "Chile".to_string(),
        is_default_shipping: default_shipping,
        is_default_billing: false,
    }
}

pub async fn create_address(db: &Database, user_id: i64) -> Address {
    address_service::create_address(db, user_id, &address_request(false))
        .await
        .unwrap()
}

pub async fn payment_method(db: &Database) -> PaymentMethod {
    lookups::list_active_payment_methods(db.pool())
        .await
        .unwrap()
        .into_iter()
        .next()
        .expect("an active payment method is seeded")
}

/// Gateway with a fixed answer.
pub struct FixedGateway(pub bool);

#[async_trait]
impl PaymentGateway for FixedGateway {
    async fn charge(&self, _request: &ChargeRequest) -> ChargeResult {
        ChargeResult {
            approved: self.0,
            reference: transaction_reference(self.0, chrono::Utc::now().timestamp_millis()),
        }
    }
}
