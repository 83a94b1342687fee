use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::collections::{BTreeMap, HashMap};

use crate::config::PricingSettings;
use crate::database::Database;
use crate::models::{
    CreateOrderRequest, Order, OrderItemRequest, OrderStatus, OrderStatusCode, PaymentMethod,
    PaymentState,
};
use crate::repositories::{addresses, carts, lookups, orders, payments, products};
use crate::repositories::orders::NewOrder;
use crate::utils::{line_total, round_money, AppError, AppResult};

/// Line priced at checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_subtotal: Decimal,
}

impl PricedLine {
    pub fn new(product_id: i64, quantity: i32, unit_price: Decimal) -> Self {
        PricedLine {
            product_id,
            quantity,
            unit_price,
            line_subtotal: line_total(unit_price, quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
}

pub fn compute_totals(lines: &[PricedLine], pricing: &PricingSettings) -> OrderTotals {
    let subtotal = round_money(lines.iter().map(|l| l.line_subtotal).sum::<Decimal>());
    let shipping_cost = round_money(pricing.shipping_cost);
    let taxes = round_money(subtotal * pricing.tax_rate);

    OrderTotals {
        subtotal,
        shipping_cost,
        taxes,
        total: subtotal + shipping_cost + taxes,
    }
}

/// Validates quantities and folds repeated products into one line.
///
/// The result is ordered by product id so concurrent checkouts lock rows in
/// the same order.
pub fn merge_lines(items: &[OrderItemRequest]) -> AppResult<Vec<(i64, i32)>> {
    let mut merged: BTreeMap<i64, i32> = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::InvalidRequest(format!(
                "Quantity for product {} must be greater than zero",
                item.product_id
            )));
        }
        let entry = merged.entry(item.product_id).or_insert(0);
        *entry = entry
            .checked_add(item.quantity)
            .ok_or_else(|| AppError::InvalidRequest("Quantity is too large".to_string()))?;
    }

    if merged.is_empty() {
        return Err(AppError::InvalidRequest(
            "Order must contain at least one product".to_string(),
        ));
    }
    Ok(merged.into_iter().collect())
}

pub fn ensure_cancellable(status: OrderStatusCode) -> AppResult<()> {
    if !status.is_cancellable() {
        return Err(AppError::InvalidRequest(format!(
            "Order with status {} cannot be cancelled",
            status
        )));
    }
    Ok(())
}

/// Admin status changes only move forward through
/// PENDING_PAYMENT -> PAID -> SHIPPED -> DELIVERED. CANCELLED is terminal, and
/// moving into it is checked by `ensure_cancellable`.
pub fn check_transition(current: OrderStatusCode, target: OrderStatusCode) -> AppResult<()> {
    if current == OrderStatusCode::Cancelled {
        return Err(AppError::InvalidRequest(
            "Order is cancelled and can no longer change status".to_string(),
        ));
    }
    if target == OrderStatusCode::Cancelled {
        return ensure_cancellable(current);
    }
    if target.id() < current.id() {
        return Err(AppError::InvalidRequest(format!(
            "Order status cannot go back from {} to {}",
            current, target
        )));
    }
    Ok(())
}

fn order_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Order {} not found", id))
}

fn current_status(order: &Order) -> AppResult<OrderStatusCode> {
    order
        .status()
        .ok_or_else(|| AppError::Internal(format!("Order {} has unknown status {}", order.id, order.status_id)))
}

async fn active_payment_method(
    tx: &mut Transaction<'static, Postgres>,
    id: i32,
) -> AppResult<PaymentMethod> {
    lookups::find_payment_method(&mut **tx, id)
        .await?
        .filter(|m| m.active)
        .ok_or_else(|| AppError::InvalidRequest(format!("Payment method {} is not available", id)))
}

/// Places an order from the given items, or from the caller's cart when none are given.
pub async fn checkout(
    db: &Database,
    pricing: &PricingSettings,
    user_id: i64,
    request: &CreateOrderRequest,
) -> AppResult<Order> {
    let mut tx = db.begin().await?;

    let shipping = addresses::find_for_user(&mut *tx, request.shipping_address_id, user_id)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("Invalid shipping address".to_string()))?;
    let billing_id = request.billing_address_id.unwrap_or(shipping.id);
    let billing = addresses::find_for_user(&mut *tx, billing_id, user_id)
        .await?
        .ok_or_else(|| AppError::InvalidRequest("Invalid billing address".to_string()))?;

    let method = active_payment_method(&mut tx, request.payment_method_id).await?;

    let (requested, cart_id) = if request.items.is_empty() {
        let cart = carts::get_or_create(&mut *tx, user_id).await?;
        let items: Vec<OrderItemRequest> = carts::items(&mut *tx, cart.id)
            .await?
            .into_iter()
            .map(|row| OrderItemRequest {
                product_id: row.product_id,
                quantity: row.quantity,
            })
            .collect();
        (items, Some(cart.id))
    } else {
        (request.items.clone(), None)
    };
    let lines = merge_lines(&requested)?;

    let mut priced = Vec::with_capacity(lines.len());
    for (product_id, quantity) in lines {
        let product = products::lock_by_id(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
        if !product.active {
            return Err(AppError::InvalidRequest(format!(
                "Product {} is not available",
                product.name
            )));
        }

        let insufficient = || AppError::InvalidRequest(format!("Insufficient stock for product {}", product.name));
        if product.stock < quantity {
            return Err(insufficient());
        }
        if !products::decrement_stock(&mut *tx, product_id, quantity).await? {
            return Err(insufficient());
        }

        priced.push(PricedLine::new(product_id, quantity, product.price));
    }

    let totals = compute_totals(&priced, pricing);
    let order_id = orders::insert_order(
        &mut *tx,
        &NewOrder {
            user_id,
            shipping_address_id: shipping.id,
            billing_address_id: billing.id,
            payment_method_id: method.id,
            status_id: OrderStatusCode::PendingPayment.id(),
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            taxes: totals.taxes,
            total: totals.total,
            customer_notes: request.customer_notes.as_deref(),
        },
    )
    .await?;

    for line in &priced {
        orders::insert_detail(
            &mut *tx,
            order_id,
            line.product_id,
            line.quantity,
            line.unit_price,
            line.line_subtotal,
        )
        .await?;
    }

    if let Some(cart_id) = cart_id {
        carts::clear(&mut *tx, cart_id).await?;
        carts::touch(&mut *tx, cart_id).await?;
    }

    tx.commit().await?;
    log::info!(
        "✅ Order {} placed by user {}: {} line(s), total {}",
        order_id,
        user_id,
        priced.len(),
        totals.total
    );

    get_any_order(db, order_id).await
}

async fn with_details(db: &Database, mut order: Order) -> AppResult<Order> {
    order.details = orders::details_for(db.pool(), order.id).await?;
    Ok(order)
}

async fn attach_details(db: &Database, mut list: Vec<Order>) -> AppResult<Vec<Order>> {
    if list.is_empty() {
        return Ok(list);
    }
    let ids: Vec<i64> = list.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<i64, Vec<_>> = HashMap::new();
    for detail in orders::details_for_orders(db.pool(), &ids).await? {
        by_order.entry(detail.order_id).or_default().push(detail);
    }
    for order in &mut list {
        order.details = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(list)
}

/// Caller's orders, newest first.
pub async fn list_orders(db: &Database, user_id: i64) -> AppResult<Vec<Order>> {
    let list = orders::list_for_user(db.pool(), user_id).await?;
    attach_details(db, list).await
}

pub async fn get_order(db: &Database, user_id: i64, id: i64) -> AppResult<Order> {
    let order = orders::find_by_id(db.pool(), id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| order_not_found(id))?;
    with_details(db, order).await
}

pub async fn list_all_orders(db: &Database, status_id: Option<i32>) -> AppResult<Vec<Order>> {
    let list = match status_id {
        Some(status_id) => orders::list_by_status(db.pool(), status_id).await?,
        None => orders::list_all(db.pool()).await?,
    };
    attach_details(db, list).await
}

pub async fn get_any_order(db: &Database, id: i64) -> AppResult<Order> {
    let order = orders::find_by_id(db.pool(), id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    with_details(db, order).await
}

/// Restores stock, marks the order cancelled and refunds an approved payment.
/// The order row must already be locked by `tx`.
async fn cancel_locked(tx: &mut Transaction<'static, Postgres>, order: &Order) -> AppResult<()> {
    ensure_cancellable(current_status(order)?)?;

    for detail in orders::details_for(&mut **tx, order.id).await? {
        products::increment_stock(&mut **tx, detail.product_id, detail.quantity).await?;
    }
    orders::set_status(&mut **tx, order.id, OrderStatusCode::Cancelled.id()).await?;

    if order.payment_status == PaymentState::Approved {
        orders::set_payment(
            &mut **tx,
            order.id,
            PaymentState::Refunded,
            order.payment_reference.as_deref(),
        )
        .await?;
        payments::mark_refunded(&mut **tx, order.id).await?;
        log::info!("💸 Payment for order {} marked refunded", order.id);
    }
    Ok(())
}

pub async fn cancel_order(db: &Database, user_id: i64, id: i64) -> AppResult<Order> {
    let mut tx = db.begin().await?;
    let order = orders::lock_by_id(&mut *tx, id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| order_not_found(id))?;

    cancel_locked(&mut tx, &order).await?;
    tx.commit().await?;

    log::info!("🚫 Order {} cancelled by user {}", id, user_id);
    get_any_order(db, id).await
}

/// Admin status change. Cancelling goes through the stock-restoring path.
pub async fn update_status(db: &Database, id: i64, status_id: i32) -> AppResult<Order> {
    let target = match lookups::find_status(db.pool(), status_id).await? {
        Some(status) => OrderStatusCode::from_id(status.id),
        None => None,
    }
    .ok_or_else(|| AppError::InvalidRequest(format!("Invalid order status {}", status_id)))?;

    let mut tx = db.begin().await?;
    let order = orders::lock_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    let current = current_status(&order)?;
    check_transition(current, target)?;

    if target == OrderStatusCode::Cancelled {
        cancel_locked(&mut tx, &order).await?;
    } else if target != current {
        orders::set_status(&mut *tx, id, target.id()).await?;
    }
    tx.commit().await?;

    log::info!("🔄 Order {} status: {} -> {}", id, current, target);
    get_any_order(db, id).await
}

pub async fn list_statuses(db: &Database) -> AppResult<Vec<OrderStatus>> {
    Ok(lookups::list_statuses(db.pool()).await?)
}

pub async fn list_payment_methods(db: &Database) -> AppResult<Vec<PaymentMethod>> {
    Ok(lookups::list_active_payment_methods(db.pool()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use crate::models::{PaymentRequest, Role, UpdateProductRequest};
    use crate::services::{cart_service, payment_service, product_service};
    use crate::test_support::{self, FixedGateway};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pricing(shipping: &str, tax: &str) -> PricingSettings {
        PricingSettings {
            shipping_cost: dec(shipping),
            tax_rate: dec(tax),
        }
    }

    fn item(product_id: i64, quantity: i32) -> OrderItemRequest {
        OrderItemRequest { product_id, quantity }
    }

    #[test]
    fn test_totals_with_default_shipping() {
        let lines = vec![
            PricedLine::new(1, 2, dec("1500.00")),
            PricedLine::new(2, 1, dec("999.99")),
        ];
        let totals = compute_totals(&lines, &pricing("6000.00", "0"));

        assert_eq!(lines[0].line_subtotal, dec("3000.00"));
        assert_eq!(totals.subtotal, dec("3999.99"));
        assert_eq!(totals.shipping_cost, dec("6000.00"));
        assert_eq!(totals.taxes, dec("0.00"));
        assert_eq!(totals.total, dec("9999.99"));
    }

    #[test]
    fn test_taxes_are_rounded_half_up() {
        let lines = vec![PricedLine::new(1, 1, dec("10.05"))];
        let totals = compute_totals(&lines, &pricing("0", "0.19"));

        // 10.05 * 0.19 = 1.9095
        assert_eq!(totals.taxes, dec("1.91"));
        assert_eq!(totals.total, dec("11.96"));
    }

    #[test]
    fn test_merge_lines_folds_duplicates_in_id_order() {
        let merged = merge_lines(&[item(9, 1), item(3, 2), item(9, 4)]).unwrap();
        assert_eq!(merged, vec![(3, 2), (9, 5)]);
    }

    #[test]
    fn test_merge_lines_rejects_bad_input() {
        assert!(matches!(merge_lines(&[]), Err(AppError::InvalidRequest(_))));
        assert!(matches!(merge_lines(&[item(1, 0)]), Err(AppError::InvalidRequest(_))));
        assert!(matches!(merge_lines(&[item(1, -3)]), Err(AppError::InvalidRequest(_))));
        assert!(merge_lines(&[item(1, i32::MAX), item(1, 1)]).is_err());
    }

    #[test]
    fn test_status_changes_only_move_forward() {
        use OrderStatusCode::*;

        assert!(check_transition(PendingPayment, Paid).is_ok());
        assert!(check_transition(Paid, Shipped).is_ok());
        assert!(check_transition(PendingPayment, Delivered).is_ok());
        assert!(check_transition(Shipped, Shipped).is_ok());

        assert!(matches!(check_transition(Paid, PendingPayment), Err(AppError::InvalidRequest(_))));
        assert!(check_transition(Delivered, Shipped).is_err());
        assert!(check_transition(Shipped, PendingPayment).is_err());
    }

    #[test]
    fn test_cancel_transitions() {
        use OrderStatusCode::*;

        assert!(check_transition(Paid, Cancelled).is_ok());
        assert!(check_transition(Shipped, Cancelled).is_err());
        assert!(check_transition(Cancelled, Paid).is_err());
        assert!(check_transition(Cancelled, Cancelled).is_err());
    }

    #[test]
    fn test_cancellable_statuses() {
        assert!(ensure_cancellable(OrderStatusCode::PendingPayment).is_ok());
        assert!(ensure_cancellable(OrderStatusCode::Paid).is_ok());
        assert!(ensure_cancellable(OrderStatusCode::Shipped).is_err());
        assert!(ensure_cancellable(OrderStatusCode::Delivered).is_err());
        assert!(ensure_cancellable(OrderStatusCode::Cancelled).is_err());
    }

    fn order_request(address_id: i64, payment_method_id: i32, items: Vec<OrderItemRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            shipping_address_id: address_id,
            billing_address_id: None,
            payment_method_id,
            customer_notes: None,
            items,
        }
    }

    async fn stock_of(db: &Database, product_id: i64) -> i32 {
        products::find_by_id(db.pool(), product_id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_checkout_from_cart_reserves_stock_and_freezes_prices() {
        let db = test_support::database().await;
        let pricing = test_support::config().pricing;
        let user = test_support::create_user(&db, Role::Customer).await;
        let address = test_support::create_address(&db, user.id).await;
        let method = test_support::payment_method(&db).await;
        let category = test_support::create_category(&db).await;
        let laptop = test_support::create_product(&db, category.id, "1500.00", 5).await;
        let mouse = test_support::create_product(&db, category.id, "999.99", 3).await;

        cart_service::add_item(&db, user.id, laptop.id, 2).await.unwrap();
        cart_service::add_item(&db, user.id, mouse.id, 1).await.unwrap();

        let order = checkout(&db, &pricing, user.id, &order_request(address.id, method.id, vec![]))
            .await
            .unwrap();

        assert_eq!(order.status_id, OrderStatusCode::PendingPayment.id());
        assert_eq!(order.payment_status, PaymentState::Pending);
        assert_eq!(order.billing_address_id, address.id);
        assert_eq!(order.subtotal, dec("3999.99"));
        assert_eq!(order.shipping_cost, pricing.shipping_cost);
        assert_eq!(order.total, order.subtotal + order.shipping_cost + order.taxes);
        assert_eq!(order.details.len(), 2);

        let laptop_line = order.details.iter().find(|d| d.product_id == laptop.id).unwrap();
        assert_eq!(laptop_line.unit_price, dec("1500.00"));
        assert_eq!(laptop_line.line_subtotal, dec("3000.00"));

        assert_eq!(stock_of(&db, laptop.id).await, 3);
        assert_eq!(stock_of(&db, mouse.id).await, 2);
        assert!(cart_service::get_cart(&db, user.id).await.unwrap().items.is_empty());

        // Later price changes leave the order untouched
        let change = UpdateProductRequest {
            price: Some(dec("1800.00")),
            ..Default::default()
        };
        product_service::update_product(&db, laptop.id, &change).await.unwrap();
        let stored = get_order(&db, user.id, order.id).await.unwrap();
        let laptop_line = stored.details.iter().find(|d| d.product_id == laptop.id).unwrap();
        assert_eq!(laptop_line.unit_price, dec("1500.00"));
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_insufficient_stock_rolls_back_every_line() {
        let db = test_support::database().await;
        let pricing = test_support::config().pricing;
        let user = test_support::create_user(&db, Role::Customer).await;
        let address = test_support::create_address(&db, user.id).await;
        let method = test_support::payment_method(&db).await;
        let category = test_support::create_category(&db).await;
        let plenty = test_support::create_product(&db, category.id, "10.00", 5).await;
        let scarce = test_support::create_product(&db, category.id, "20.00", 1).await;

        let request = order_request(address.id, method.id, vec![item(plenty.id, 2), item(scarce.id, 3)]);
        let err = checkout(&db, &pricing, user.id, &request).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest(ref m) if m.contains("Insufficient stock")));
        assert_eq!(stock_of(&db, plenty.id).await, 5);
        assert_eq!(stock_of(&db, scarce.id).await, 1);
        assert!(list_orders(&db, user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_cancel_paid_order_restores_stock_and_refunds() {
        let db = test_support::database().await;
        let pricing = test_support::config().pricing;
        let user = test_support::create_user(&db, Role::Customer).await;
        let address = test_support::create_address(&db, user.id).await;
        let method = test_support::payment_method(&db).await;
        let category = test_support::create_category(&db).await;
        let product = test_support::create_product(&db, category.id, "25.50", 5).await;

        let order = checkout(&db, &pricing, user.id, &order_request(address.id, method.id, vec![item(product.id, 2)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, product.id).await, 3);

        let payment = PaymentRequest {
            order_id: order.id,
            payment_method_id: method.id,
            amount: order.total,
            external_token: None,
        };
        let outcome = payment_service::process_payment(&db, &FixedGateway(true), user.id, &payment)
            .await
            .unwrap();
        assert!(outcome.approved);

        let cancelled = cancel_order(&db, user.id, order.id).await.unwrap();
        assert_eq!(cancelled.status_id, OrderStatusCode::Cancelled.id());
        assert_eq!(cancelled.payment_status, PaymentState::Refunded);
        assert_eq!(stock_of(&db, product.id).await, 5);

        let stored = payments::find_by_order(db.pool(), order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentState::Refunded);

        // Cancelled orders are terminal
        assert!(cancel_order(&db, user.id, order.id).await.is_err());
        assert!(update_status(&db, order.id, OrderStatusCode::Paid.id()).await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL to be running
    async fn test_admin_cannot_reopen_a_paid_order() {
        let db = test_support::database().await;
        let pricing = test_support::config().pricing;
        let user = test_support::create_user(&db, Role::Customer).await;
        let address = test_support::create_address(&db, user.id).await;
        let method = test_support::payment_method(&db).await;
        let category = test_support::create_category(&db).await;
        let product = test_support::create_product(&db, category.id, "10.00", 2).await;

        let order = checkout(&db, &pricing, user.id, &order_request(address.id, method.id, vec![item(product.id, 1)]))
            .await
            .unwrap();
        let payment = PaymentRequest {
            order_id: order.id,
            payment_method_id: method.id,
            amount: order.total,
            external_token: None,
        };
        payment_service::process_payment(&db, &FixedGateway(true), user.id, &payment)
            .await
            .unwrap();

        let err = update_status(&db, order.id, OrderStatusCode::PendingPayment.id())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));

        let shipped = update_status(&db, order.id, OrderStatusCode::Shipped.id()).await.unwrap();
        assert_eq!(shipped.status_id, OrderStatusCode::Shipped.id());
        assert!(cancel_order(&db, user.id, order.id).await.is_err());
        assert!(matches!(update_status(&db, order.id, 99).await, Err(AppError::InvalidRequest(_))));
    }
}
