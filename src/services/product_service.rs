use rust_decimal::Decimal;

use crate::database::Database;
use crate::models::{CreateProductRequest, Product, UpdateProductRequest};
use crate::repositories::products::{self, ProductFields};
use crate::repositories::categories;
use crate::utils::{AppError, AppResult};

/// Checks the field rules shared by create and update.
pub fn validate_fields(fields: &ProductFields) -> AppResult<()> {
    if fields.sku.trim().is_empty() {
        return Err(AppError::InvalidRequest("SKU is required".to_string()));
    }
    if fields.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Product name is required".to_string()));
    }
    if fields.price < Decimal::ZERO {
        return Err(AppError::InvalidRequest("Price must not be negative".to_string()));
    }
    if fields.stock < 0 {
        return Err(AppError::InvalidRequest("Stock must not be negative".to_string()));
    }
    if matches!(fields.weight_kg, Some(w) if w < Decimal::ZERO) {
        return Err(AppError::InvalidRequest("Weight must not be negative".to_string()));
    }
    Ok(())
}

impl From<&CreateProductRequest> for ProductFields {
    fn from(request: &CreateProductRequest) -> Self {
        ProductFields {
            sku: request.sku.trim().to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            price: request.price,
            stock: request.stock,
            image_url: request.image_url.clone(),
            weight_kg: request.weight_kg,
            dimensions_cm: request.dimensions_cm.clone(),
            active: request.active.unwrap_or(true),
            category_id: request.category_id,
        }
    }
}

/// Overlays the present fields of a partial update onto the stored values.
pub fn apply_update(mut fields: ProductFields, request: &UpdateProductRequest) -> ProductFields {
    if let Some(sku) = &request.sku {
        fields.sku = sku.trim().to_string();
    }
    if let Some(name) = &request.name {
        fields.name = name.trim().to_string();
    }
    if request.description.is_some() {
        fields.description = request.description.clone();
    }
    if let Some(price) = request.price {
        fields.price = price;
    }
    if let Some(stock) = request.stock {
        fields.stock = stock;
    }
    if request.image_url.is_some() {
        fields.image_url = request.image_url.clone();
    }
    if request.weight_kg.is_some() {
        fields.weight_kg = request.weight_kg;
    }
    if request.dimensions_cm.is_some() {
        fields.dimensions_cm = request.dimensions_cm.clone();
    }
    if let Some(active) = request.active {
        fields.active = active;
    }
    if let Some(category_id) = request.category_id {
        fields.category_id = category_id;
    }
    fields
}

async fn ensure_category(db: &Database, category_id: i64) -> AppResult<()> {
    if categories::find_by_id(db.pool(), category_id).await?.is_none() {
        return Err(AppError::InvalidRequest(format!(
            "Category {} does not exist",
            category_id
        )));
    }
    Ok(())
}

fn duplicate_sku(sku: &str) -> AppError {
    AppError::Conflict(format!("SKU '{}' already exists", sku))
}

/// Public catalog: active products only.
pub async fn list_products(db: &Database, category_id: Option<i64>) -> AppResult<Vec<Product>> {
    Ok(products::list_active(db.pool(), category_id).await?)
}

pub async fn list_all_products(db: &Database) -> AppResult<Vec<Product>> {
    Ok(products::list_all(db.pool()).await?)
}

pub async fn get_product(db: &Database, id: i64) -> AppResult<Product> {
    products::find_by_id(db.pool(), id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

pub async fn create_product(db: &Database, request: &CreateProductRequest) -> AppResult<Product> {
    let fields = ProductFields::from(request);
    validate_fields(&fields)?;
    ensure_category(db, fields.category_id).await?;

    if products::find_id_by_sku(db.pool(), &fields.sku).await?.is_some() {
        return Err(duplicate_sku(&fields.sku));
    }

    let id = products::insert(db.pool(), &fields)
        .await
        .map_err(|e| AppError::from_db(e, &format!("SKU '{}' already exists", fields.sku)))?;

    log::info!("✅ Product created: {} ({})", fields.sku, id);
    products::find_by_id(db.pool(), id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Product {} vanished after insert", id)))
}

pub async fn update_product(db: &Database, id: i64, request: &UpdateProductRequest) -> AppResult<Product> {
    let current = products::find_by_id(db.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    let fields = apply_update(ProductFields::from(&current), request);
    validate_fields(&fields)?;

    if fields.category_id != current.category_id {
        ensure_category(db, fields.category_id).await?;
    }
    if fields.sku != current.sku {
        if let Some(other) = products::find_id_by_sku(db.pool(), &fields.sku).await? {
            if other != id {
                return Err(duplicate_sku(&fields.sku));
            }
        }
    }

    products::update(db.pool(), id, &fields)
        .await
        .map_err(|e| AppError::from_db(e, &format!("SKU '{}' already exists", fields.sku)))?;

    products::find_by_id(db.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

/// Soft delete.
pub async fn deactivate_product(db: &Database, id: i64) -> AppResult<()> {
    if !products::deactivate(db.pool(), id).await? {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }
    log::info!("🗑️ Product {} deactivated", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::test_support;

    fn fields() -> ProductFields {
        ProductFields {
            sku: "SKU-1".to_string(),
            name: "Keyboard".to_string(),
            description: None,
            price: Decimal::from_str("199.90").unwrap(),
            stock: 5,
            image_url: None,
            weight_kg: None,
            dimensions_cm: None,
            active: true,
            category_id: 1,
        }
    }

    #[test]
    fn test_validate_fields() {
        assert!(validate_fields(&fields()).is_ok());
        assert!(validate_fields(&ProductFields { price: Decimal::ZERO, ..fields() }).is_ok());
        assert!(validate_fields(&ProductFields { price: Decimal::NEGATIVE_ONE, ..fields() }).is_err());
        assert!(validate_fields(&ProductFields { stock: -1, ..fields() }).is_err());
        assert!(validate_fields(&ProductFields { sku: " ".to_string(), ..fields() }).is_err());
        assert!(validate_fields(&ProductFields { name: String::new(), ..fields() }).is_err());
    }

    #[test]
    fn test_apply_update_only_touches_present_fields() {
        let update = UpdateProductRequest {
            price: Some(Decimal::from_str("149.90").unwrap()),
            active: Some(false),
            ..Default::default()
        };
        let updated = apply_update(fields(), &update);

        assert_eq!(updated.price, Decimal::from_str("149.90").unwrap());
        assert!(!updated.active);
        assert_eq!(updated.sku, "SKU-1");
        assert_eq!(updated.stock, 5);
        assert_eq!(updated.category_id, 1);
    }

    #[test]
    fn test_create_request_defaults_to_active() {
        let request = CreateProductRequest {
            sku: "  SKU-9 ".to_string(),
            name: "Mouse".to_string(),
            description: None,
            price: Decimal::ONE,
            stock: 0,
            image_url: None,
            weight_kg: None,
            dimensions_cm: None,
            active: None,
            category_id: 3,
        };
        let fields = ProductFields::from(&request);
        assert!(fields.active);
        assert_eq!(fields.sku, "SKU-9");
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_duplicate_sku_is_a_conflict() {
        let db = test_support::database().await;
        let category = test_support::create_category(&db).await;
        let product = test_support::create_product(&db, category.id, "30.00", 2).await;
        let other = test_support::create_product(&db, category.id, "40.00", 2).await;

        let mut request = test_support::product_request(category.id, "35.00", 1);
        request.sku = product.sku.clone();
        assert!(matches!(create_product(&db, &request).await, Err(AppError::Conflict(_))));

        let change = UpdateProductRequest {
            sku: Some(product.sku.clone()),
            ..Default::default()
        };
        assert!(matches!(
            update_product(&db, other.id, &change).await,
            Err(AppError::Conflict(_))
        ));
        // Keeping its own SKU is fine
        assert!(update_product(&db, product.id, &change).await.is_ok());
    }
}
