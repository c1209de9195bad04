//! End-to-end checkout flow across the cart, checkout, and order services.

use common::{AccountId, Money, OrderStatus, PaymentMethod, ShopperIdentity};
use ordering::{CartService, CheckoutRequest, CheckoutService, OrderService};
use store::{CatalogStore, CategoryRecord, InMemoryStore, ProductRecord};

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "5 Avenue des Gobelins, Paris".to_string(),
        billing_address: "12 Rue des Fleurs, Lyon".to_string(),
        payment_method: PaymentMethod::Paypal,
        notes: "Leave at the door".to_string(),
    }
}

/// The storefront's canonical pricing scenario: product A at 100.00
/// discounted to 90.00 (qty 2) plus product B at 50.00 (qty 1) must total
/// 230.00 across 3 items, before and after checkout.
#[tokio::test]
async fn full_shopper_journey() {
    let store = InMemoryStore::new();

    let category = store
        .insert_category(CategoryRecord::new("Electronics", "electronics"))
        .await
        .unwrap();
    let product_a = store
        .insert_product(
            ProductRecord::new("Product A", "product-a", Money::from_cents(10_000), category.id)
                .with_discount(Money::from_cents(9_000)),
        )
        .await
        .unwrap();
    let product_b = store
        .insert_product(ProductRecord::new(
            "Product B",
            "product-b",
            Money::from_cents(5_000),
            category.id,
        ))
        .await
        .unwrap();

    let carts = CartService::new(store.clone());
    let checkout = CheckoutService::new(store.clone());
    let orders = OrderService::new(store.clone());

    let account = AccountId::new();
    let identity = ShopperIdentity::Account(account);

    // Build the cart.
    let cart = carts.resolve_cart(&identity).await.unwrap();
    carts.add_item(cart.cart.id, product_a.id, 2).await.unwrap();
    carts.add_item(cart.cart.id, product_b.id, 1).await.unwrap();

    let summary = carts.summary(cart.cart.id).await.unwrap();
    assert_eq!(summary.total_price().cents(), 23_000);
    assert_eq!(summary.total_items(), 3);

    // Check out.
    let order = checkout
        .checkout(cart.cart.id, checkout_request())
        .await
        .unwrap();
    assert_eq!(order.total_amount.cents(), 23_000);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.billing_address, "12 Rue des Fleurs, Lyon");

    // The order carries exactly one frozen line per cart line.
    let detail = orders.get_order(&identity, order.id).await.unwrap();
    assert_eq!(detail.lines.len(), 2);
    let mut prices: Vec<i64> = detail.lines.iter().map(|l| l.unit_price.cents()).collect();
    prices.sort_unstable();
    assert_eq!(prices, vec![5_000, 9_000]);
    let line_total: i64 = detail.lines.iter().map(|l| l.line_total().cents()).sum();
    assert_eq!(line_total, detail.order.total_amount.cents());

    // The cart is empty and immediately reusable.
    let emptied = carts.resolve_cart(&identity).await.unwrap();
    assert_eq!(emptied.cart.id, cart.cart.id);
    assert!(emptied.is_empty());

    carts.add_item(emptied.cart.id, product_b.id, 1).await.unwrap();
    let refilled = carts.summary(emptied.cart.id).await.unwrap();
    assert_eq!(refilled.total_items(), 1);

    // History shows the order; a later repricing changes nothing.
    store
        .set_product_price(product_a.id, Money::from_cents(50), None)
        .await
        .unwrap();

    let history = orders.list_orders(&identity).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total_amount.cents(), 23_000);

    let detail = orders.get_order(&identity, order.id).await.unwrap();
    assert!(detail.lines.iter().any(|l| l.unit_price.cents() == 9_000));
}

/// A second checkout from the refilled cart produces an independent order
/// and leaves history newest-first.
#[tokio::test]
async fn repeat_checkouts_accumulate_history() {
    let store = InMemoryStore::new();
    let category = store
        .insert_category(CategoryRecord::new("Books", "books"))
        .await
        .unwrap();
    let product = store
        .insert_product(ProductRecord::new(
            "Novel",
            "novel",
            Money::from_cents(1_800),
            category.id,
        ))
        .await
        .unwrap();

    let carts = CartService::new(store.clone());
    let checkout = CheckoutService::new(store.clone());
    let orders = OrderService::new(store.clone());

    let identity = ShopperIdentity::Account(AccountId::new());
    let cart = carts.resolve_cart(&identity).await.unwrap();

    carts.add_item(cart.cart.id, product.id, 1).await.unwrap();
    let first = checkout
        .checkout(cart.cart.id, checkout_request())
        .await
        .unwrap();

    carts.add_item(cart.cart.id, product.id, 3).await.unwrap();
    let second = checkout
        .checkout(cart.cart.id, checkout_request())
        .await
        .unwrap();

    assert_ne!(first.order_number, second.order_number);
    assert_eq!(second.total_amount.cents(), 5_400);

    let history = orders.list_orders(&identity).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
}
