//! The checkout workflow: one cart in, one committed order out.

use common::{CartId, Money, OrderId, OrderNumber, PaymentMethod};
use store::{CartLine, CartStore, NewOrder, NewOrderLine, OrderRecord, OrderStore};

use crate::error::CheckoutError;

/// Caller-supplied checkout fields.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    /// Falls back to the shipping address when blank.
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    pub notes: String,
}

/// Service that converts a cart into a committed order.
pub struct CheckoutService<S> {
    store: S,
}

impl<S: CartStore + OrderStore> CheckoutService<S> {
    /// Creates a new checkout service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the cart into an immutable order as one atomic unit.
    ///
    /// Validation runs before any write. The store then commits the order,
    /// its frozen lines, and the cart clearing in a single transaction: a
    /// failure anywhere leaves the cart unmodified and no partial order
    /// visible. Line prices are the products' final prices at this instant
    /// and are never recomputed afterwards.
    #[tracing::instrument(skip(self, request))]
    pub async fn checkout(
        &self,
        cart_id: CartId,
        request: CheckoutRequest,
    ) -> Result<OrderRecord, CheckoutError> {
        let cart = self
            .store
            .cart_by_id(cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(cart_id))?;

        let account_id = cart
            .owner
            .account_id()
            .ok_or(CheckoutError::AccountRequired)?;

        let lines = self.store.cart_lines(cart_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let shipping_address = request.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            return Err(CheckoutError::BlankAddress("shipping address"));
        }
        let billing_address = match request.billing_address.trim() {
            "" => shipping_address.clone(),
            billing => billing.to_string(),
        };

        let total_amount: Money = lines.iter().map(CartLine::line_total).sum();
        let order_lines: Vec<NewOrderLine> = lines
            .iter()
            .map(|line| NewOrderLine {
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                quantity: line.quantity,
                unit_price: line.product.final_price(),
            })
            .collect();

        let order = self
            .store
            .place_order(
                cart_id,
                NewOrder {
                    id: OrderId::new(),
                    account_id,
                    order_number: OrderNumber::generate(),
                    payment_method: request.payment_method,
                    total_amount,
                    shipping_address,
                    billing_address,
                    notes: request.notes,
                },
                order_lines,
            )
            .await?;

        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_cents = order.total_amount.cents(),
            "checkout completed"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use common::{AccountId, SessionToken, ShopperIdentity};
    use store::{CatalogStore, CategoryRecord, InMemoryStore, ProductRecord};

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: "12 Rue des Fleurs, Lyon".to_string(),
            billing_address: String::new(),
            payment_method: PaymentMethod::CreditCard,
            notes: String::new(),
        }
    }

    async fn seed_product(store: &InMemoryStore, slug: &str, cents: i64) -> ProductRecord {
        let category = store
            .insert_category(CategoryRecord::new(format!("c-{slug}"), format!("c-{slug}")))
            .await
            .unwrap();
        store
            .insert_product(ProductRecord::new(
                slug,
                slug,
                Money::from_cents(cents),
                category.id,
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_cart_cannot_check_out() {
        let store = InMemoryStore::new();
        let carts = CartService::new(store.clone());
        let cart = carts
            .resolve_cart(&ShopperIdentity::Account(AccountId::new()))
            .await
            .unwrap();

        let service = CheckoutService::new(store.clone());
        let result = service.checkout(cart.cart.id, request()).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn anonymous_cart_cannot_check_out() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "widget", 1_000).await;
        let carts = CartService::new(store.clone());
        let cart = carts
            .resolve_cart(&ShopperIdentity::Session(SessionToken::new("tok-1")))
            .await
            .unwrap();
        carts.add_item(cart.cart.id, product.id, 1).await.unwrap();

        let service = CheckoutService::new(store.clone());
        let result = service.checkout(cart.cart.id, request()).await;

        assert!(matches!(result, Err(CheckoutError::AccountRequired)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn blank_shipping_address_is_rejected_before_any_write() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "widget", 1_000).await;
        let carts = CartService::new(store.clone());
        let cart = carts
            .resolve_cart(&ShopperIdentity::Account(AccountId::new()))
            .await
            .unwrap();
        carts.add_item(cart.cart.id, product.id, 1).await.unwrap();

        let service = CheckoutService::new(store.clone());
        let mut bad = request();
        bad.shipping_address = "   ".to_string();
        let result = service.checkout(cart.cart.id, bad).await;

        assert!(matches!(result, Err(CheckoutError::BlankAddress(_))));
        assert_eq!(store.order_count().await, 0);
        let summary = carts.summary(cart.cart.id).await.unwrap();
        assert_eq!(summary.lines.len(), 1);
    }

    #[tokio::test]
    async fn checkout_snapshots_cart_into_order_and_clears_it() {
        let store = InMemoryStore::new();
        // Product A: 100.00 discounted to 90.00; product B: 50.00 plain.
        let a = seed_product(&store, "a", 10_000).await;
        let a = store
            .set_product_price(a.id, a.price, Some(Money::from_cents(9_000)))
            .await
            .unwrap();
        let b = seed_product(&store, "b", 5_000).await;

        let account = AccountId::new();
        let carts = CartService::new(store.clone());
        let cart = carts
            .resolve_cart(&ShopperIdentity::Account(account))
            .await
            .unwrap();
        carts.add_item(cart.cart.id, a.id, 2).await.unwrap();
        carts.add_item(cart.cart.id, b.id, 1).await.unwrap();

        let summary = carts.summary(cart.cart.id).await.unwrap();
        assert_eq!(summary.total_price().cents(), 23_000);
        assert_eq!(summary.total_items(), 3);

        let service = CheckoutService::new(store.clone());
        let order = service.checkout(cart.cart.id, request()).await.unwrap();

        assert_eq!(order.account_id, account);
        assert_eq!(order.total_amount.cents(), 23_000);
        // Blank billing address fell back to the shipping address.
        assert_eq!(order.billing_address, order.shipping_address);

        let lines = store.order_lines(order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        let mut unit_prices: Vec<i64> = lines.iter().map(|l| l.unit_price.cents()).collect();
        unit_prices.sort_unstable();
        assert_eq!(unit_prices, vec![5_000, 9_000]);

        let line_sum: i64 = lines.iter().map(|l| l.line_total().cents()).sum();
        assert_eq!(line_sum, order.total_amount.cents());

        // The cart is emptied but the row survives for reuse.
        let after = carts.summary(cart.cart.id).await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn order_prices_survive_later_catalog_edits() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "widget", 10_000).await;

        let account = AccountId::new();
        let carts = CartService::new(store.clone());
        let cart = carts
            .resolve_cart(&ShopperIdentity::Account(account))
            .await
            .unwrap();
        carts.add_item(cart.cart.id, product.id, 1).await.unwrap();

        let service = CheckoutService::new(store.clone());
        let order = service.checkout(cart.cart.id, request()).await.unwrap();

        // Reprice the product after the fact.
        store
            .set_product_price(product.id, Money::from_cents(99_900), None)
            .await
            .unwrap();

        let lines = store.order_lines(order.id).await.unwrap();
        assert_eq!(lines[0].unit_price.cents(), 10_000);
        assert_eq!(
            store.order_by_id(order.id).await.unwrap().unwrap().total_amount.cents(),
            10_000
        );
    }

    #[tokio::test]
    async fn checkout_leaves_other_carts_untouched() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "widget", 1_000).await;

        let carts = CartService::new(store.clone());
        let buyer = carts
            .resolve_cart(&ShopperIdentity::Account(AccountId::new()))
            .await
            .unwrap();
        let bystander = carts
            .resolve_cart(&ShopperIdentity::Session(SessionToken::new("tok-2")))
            .await
            .unwrap();
        carts.add_item(buyer.cart.id, product.id, 1).await.unwrap();
        carts.add_item(bystander.cart.id, product.id, 3).await.unwrap();

        let service = CheckoutService::new(store.clone());
        service.checkout(buyer.cart.id, request()).await.unwrap();

        let untouched = carts.summary(bystander.cart.id).await.unwrap();
        assert_eq!(untouched.total_items(), 3);
    }
}
