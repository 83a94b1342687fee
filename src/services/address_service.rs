use crate::database::Database;
use crate::models::{Address, CreateAddressRequest, UpdateAddressRequest};
use crate::repositories::addresses;
use crate::utils::{AppError, AppResult};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Address {} not found", id))
}

pub fn validate(address: &Address) -> AppResult<()> {
    let required = [
        (&address.recipient_name, "recipient_name"),
        (&address.street, "street"),
        (&address.city, "city"),
        (&address.state, "state"),
        (&address.postal_code, "postal_code"),
        (&address.country, "country"),
    ];
    for (value, field) in required {
        if value.trim().is_empty() {
            return Err(AppError::InvalidRequest(format!("{} is required", field)));
        }
    }
    Ok(())
}

pub fn new_address(user_id: i64, request: &CreateAddressRequest) -> Address {
    Address {
        id: 0,
        user_id,
        recipient_name: request.recipient_name.trim().to_string(),
        street: request.street.trim().to_string(),
        street_number: request.street_number.clone(),
        additional_info: request.additional_info.clone(),
        city: request.city.trim().to_string(),
        state: request.state.trim().to_string(),
        postal_code: request.postal_code.trim().to_string(),
        country: request.country.trim().to_string(),
        is_default_shipping: request.is_default_shipping,
        is_default_billing: request.is_default_billing,
    }
}

/// Overlays the present fields of a partial update.
pub fn apply_update(mut address: Address, request: &UpdateAddressRequest) -> Address {
    if let Some(v) = &request.recipient_name {
        address.recipient_name = v.trim().to_string();
    }
    if let Some(v) = &request.street {
        address.street = v.trim().to_string();
    }
    if request.street_number.is_some() {
        address.street_number = request.street_number.clone();
    }
    if request.additional_info.is_some() {
        address.additional_info = request.additional_info.clone();
    }
    if let Some(v) = &request.city {
        address.city = v.trim().to_string();
    }
    if let Some(v) = &request.state {
        address.state = v.trim().to_string();
    }
    if let Some(v) = &request.postal_code {
        address.postal_code = v.trim().to_string();
    }
    if let Some(v) = &request.country {
        address.country = v.trim().to_string();
    }
    if let Some(v) = request.is_default_shipping {
        address.is_default_shipping = v;
    }
    if let Some(v) = request.is_default_billing {
        address.is_default_billing = v;
    }
    address
}

pub async fn create_address(db: &Database, user_id: i64, request: &CreateAddressRequest) -> AppResult<Address> {
    let mut address = new_address(user_id, request);
    validate(&address)?;

    let mut tx = db.begin().await?;
    if addresses::count_for_user(&mut *tx, user_id).await? == 0 {
        address.is_default_shipping = true;
    }
    if address.is_default_shipping {
        addresses::clear_default_shipping(&mut *tx, user_id, None).await?;
    }
    if address.is_default_billing {
        addresses::clear_default_billing(&mut *tx, user_id, None).await?;
    }
    let created = addresses::insert(&mut *tx, &address).await?;
    tx.commit().await?;

    log::info!("✅ Address {} created for user {}", created.id, user_id);
    Ok(created)
}

pub async fn list_addresses(db: &Database, user_id: i64) -> AppResult<Vec<Address>> {
    Ok(addresses::list_by_user(db.pool(), user_id).await?)
}

pub async fn get_address(db: &Database, user_id: i64, id: i64) -> AppResult<Address> {
    addresses::find_for_user(db.pool(), id, user_id)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn update_address(
    db: &Database,
    user_id: i64,
    id: i64,
    request: &UpdateAddressRequest,
) -> AppResult<Address> {
    let mut tx = db.begin().await?;
    let current = addresses::find_for_user(&mut *tx, id, user_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let address = apply_update(current, request);
    validate(&address)?;

    if address.is_default_shipping {
        addresses::clear_default_shipping(&mut *tx, user_id, Some(id)).await?;
    }
    if address.is_default_billing {
        addresses::clear_default_billing(&mut *tx, user_id, Some(id)).await?;
    }
    let updated = addresses::update(&mut *tx, &address).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn delete_address(db: &Database, user_id: i64, id: i64) -> AppResult<()> {
    let address = get_address(db, user_id, id).await?;
    if address.is_default_shipping {
        return Err(AppError::InvalidRequest(
            "The default shipping address cannot be deleted, set another default first".to_string(),
        ));
    }

    addresses::delete(db.pool(), id, user_id)
        .await
        .map_err(|e| AppError::from_db(e, "Address is referenced by existing orders"))?;
    Ok(())
}

pub async fn list_all_addresses(db: &Database) -> AppResult<Vec<Address>> {
    Ok(addresses::list_all(db.pool()).await?)
}

pub async fn get_any_address(db: &Database, id: i64) -> AppResult<Address> {
    addresses::find_by_id(db.pool(), id).await?.ok_or_else(|| not_found(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::{CreateOrderRequest, OrderItemRequest, Role};
    use crate::services::order_service;
    use crate::test_support;

    fn request() -> CreateAddressRequest {
        CreateAddressRequest {
            recipient_name: " Ana Silva ".to_string(),
            street: "Rua das Flores".to_string(),
            street_number: Some("120".to_string()),
            additional_info: None,
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            postal_code: "80000-000".to_string(),
            country: "Brazil".to_string(),
            is_default_shipping: false,
            is_default_billing: false,
        }
    }

    #[test]
    fn test_new_address_trims_fields() {
        let address = new_address(3, &request());
        assert_eq!(address.user_id, 3);
        assert_eq!(address.recipient_name, "Ana Silva");
        assert!(validate(&address).is_ok());
    }

    #[test]
    fn test_missing_city_is_rejected() {
        let mut req = request();
        req.city = "  ".to_string();
        match validate(&new_address(3, &req)) {
            Err(AppError::InvalidRequest(msg)) => assert_eq!(msg, "city is required"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_apply_update_keeps_absent_fields() {
        let update = UpdateAddressRequest {
            city: Some("Londrina".to_string()),
            is_default_billing: Some(true),
            ..Default::default()
        };
        let updated = apply_update(new_address(3, &request()), &update);

        assert_eq!(updated.city, "Londrina");
        assert!(updated.is_default_billing);
        assert!(!updated.is_default_shipping);
        assert_eq!(updated.street_number.as_deref(), Some("120"));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_single_default_shipping_address() {
        let db = test_support::database().await;
        let user = test_support::create_user(&db, Role::Customer).await;

        let first = create_address(&db, user.id, &test_support::address_request(false))
            .await
            .unwrap();
        assert!(first.is_default_shipping);

        let second = create_address(&db, user.id, &test_support::address_request(false))
            .await
            .unwrap();
        assert!(!second.is_default_shipping);

        let third = create_address(&db, user.id, &test_support::address_request(true))
            .await
            .unwrap();
        assert!(third.is_default_shipping);

        let defaults: Vec<i64> = list_addresses(&db, user.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.is_default_shipping)
            .map(|a| a.id)
            .collect();
        assert_eq!(defaults, vec![third.id]);

        let err = delete_address(&db, user.id, third.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        delete_address(&db, user.id, first.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_address_used_by_an_order_cannot_be_deleted() {
        let db = test_support::database().await;
        let user = test_support::create_user(&db, Role::Customer).await;
        let _default = test_support::create_address(&db, user.id).await;
        let shipping = test_support::create_address(&db, user.id).await;
        let method = test_support::payment_method(&db).await;
        let category = test_support::create_category(&db).await;
        let product = test_support::create_product(&db, category.id, "12.00", 3).await;

        let request = CreateOrderRequest {
            shipping_address_id: shipping.id,
            billing_address_id: None,
            payment_method_id: method.id,
            customer_notes: None,
            items: vec![OrderItemRequest {
                product_id: product.id,
                quantity: 1,
            }],
        };
        order_service::checkout(&db, &test_support::config().pricing, user.id, &request)
            .await
            .unwrap();

        let err = delete_address(&db, user.id, shipping.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
