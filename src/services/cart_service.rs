use rust_decimal::Decimal;

use crate::database::Database;
use crate::models::{Cart, CartItemRow, CartItemView, CartView, Product};
use crate::repositories::{carts, products};
use crate::utils::{line_total, round_money, AppError, AppResult};

/// Computes line subtotals and the cart total from the live product prices.
pub fn build_cart_view(cart: Cart, rows: Vec<CartItemRow>) -> CartView {
    let items: Vec<CartItemView> = rows
        .into_iter()
        .map(|row| CartItemView {
            subtotal: line_total(row.unit_price, row.quantity),
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            sku: row.sku,
            image_url: row.image_url,
            unit_price: row.unit_price,
            quantity: row.quantity,
            added_at: row.added_at,
        })
        .collect();

    let total = round_money(items.iter().map(|i| i.subtotal).sum::<Decimal>());
    let item_count = items.iter().map(|i| i.quantity as i64).sum();

    CartView {
        id: cart.id,
        user_id: cart.user_id,
        items,
        item_count,
        total,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    }
}

/// Rejects quantities the product cannot satisfy.
pub fn check_quantity(product: &Product, quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::InvalidRequest("Quantity must be greater than zero".to_string()));
    }
    if !product.active {
        return Err(AppError::InvalidRequest(format!(
            "Product {} is not available",
            product.name
        )));
    }
    if quantity > product.stock {
        return Err(AppError::InvalidRequest(format!(
            "Insufficient stock for product {} (available: {})",
            product.name, product.stock
        )));
    }
    Ok(())
}

pub async fn get_cart(db: &Database, user_id: i64) -> AppResult<CartView> {
    let cart = carts::get_or_create(db.pool(), user_id).await?;
    let rows = carts::items(db.pool(), cart.id).await?;
    Ok(build_cart_view(cart, rows))
}

/// Adds a product, merging with an existing line for the same product.
pub async fn add_item(db: &Database, user_id: i64, product_id: i64, quantity: i32) -> AppResult<CartView> {
    if quantity <= 0 {
        return Err(AppError::InvalidRequest("Quantity must be greater than zero".to_string()));
    }

    let mut tx = db.begin().await?;
    let cart = carts::get_or_create(&mut *tx, user_id).await?;
    let product = products::lock_by_id(&mut *tx, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

    let existing = carts::quantity_of(&mut *tx, cart.id, product_id).await?.unwrap_or(0);
    let merged = existing
        .checked_add(quantity)
        .ok_or_else(|| AppError::InvalidRequest("Quantity is too large".to_string()))?;
    check_quantity(&product, merged)?;

    carts::set_quantity(&mut *tx, cart.id, product_id, merged).await?;
    carts::touch(&mut *tx, cart.id).await?;
    tx.commit().await?;

    log::info!("🛒 User {} cart: product {} x{}", user_id, product_id, merged);
    get_cart(db, user_id).await
}

/// Sets the exact quantity of one of the caller's cart lines.
pub async fn update_item(db: &Database, user_id: i64, item_id: i64, quantity: i32) -> AppResult<CartView> {
    let mut tx = db.begin().await?;
    let cart = carts::get_or_create(&mut *tx, user_id).await?;
    let (_, product_id, _) = carts::find_item(&mut *tx, cart.id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cart item {} not found", item_id)))?;
    let product = products::lock_by_id(&mut *tx, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

    check_quantity(&product, quantity)?;

    carts::set_quantity(&mut *tx, cart.id, product_id, quantity).await?;
    carts::touch(&mut *tx, cart.id).await?;
    tx.commit().await?;

    get_cart(db, user_id).await
}

pub async fn remove_item(db: &Database, user_id: i64, item_id: i64) -> AppResult<()> {
    let cart = carts::get_or_create(db.pool(), user_id).await?;
    if !carts::delete_item(db.pool(), cart.id, item_id).await? {
        return Err(AppError::NotFound(format!("Cart item {} not found", item_id)));
    }
    carts::touch(db.pool(), cart.id).await?;
    Ok(())
}

pub async fn clear_cart(db: &Database, user_id: i64) -> AppResult<()> {
    let cart = carts::get_or_create(db.pool(), user_id).await?;
    let removed = carts::clear(db.pool(), cart.id).await?;
    carts::touch(db.pool(), cart.id).await?;
    log::info!("🧹 User {} cart cleared ({} item(s))", user_id, removed);
    Ok(())
}
