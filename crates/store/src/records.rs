//! Row-level record types shared by both store implementations.

use chrono::{DateTime, Utc};
use common::{
    AccountId, CartId, CartLineId, CategoryId, Money, OrderId, OrderLineId, OrderNumber,
    OrderStatus, PaymentMethod, ProductId, ShopperIdentity,
};
use serde::{Deserialize, Serialize};

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub category_id: CategoryId,
    pub stock: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        price: Money,
        category_id: CategoryId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            price,
            discount_price: None,
            category_id,
            stock: 0,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the discounted price.
    pub fn with_discount(mut self, discount_price: Money) -> Self {
        self.discount_price = Some(discount_price);
        self
    }

    /// Sets the stock count.
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// The price a shopper actually pays: the discount price if set, else
    /// the base price.
    pub fn final_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }

    /// Returns true if a discount price is set.
    pub fn has_discount(&self) -> bool {
        self.discount_price.is_some()
    }
}

/// A cart row. Lines live in [`CartLine`]; totals are always derived from
/// them, never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    pub id: CartId,
    pub owner: ShopperIdentity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (cart, product) pairing, joined with its live product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub product: ProductRecord,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Quantity times the product's current final price.
    pub fn line_total(&self) -> Money {
        self.product.final_price().multiply(self.quantity)
    }
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub account_id: AccountId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub shipping_address: String,
    pub billing_address: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen snapshot of one purchased product. `unit_price` is copied at
/// checkout and never recomputed from the live product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderLineRecord {
    /// Quantity times the frozen unit price.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Input for [`crate::OrderStore::place_order`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub account_id: AccountId,
    pub order_number: OrderNumber,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub shipping_address: String,
    pub billing_address: String,
    pub notes: String,
}

/// One line of a new order, priced at checkout time.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// A shopper account. Credentials live with the external identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Extended per-account profile, one-to-one with [`AccountRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub account_id: AccountId,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub newsletter: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// An empty profile for a freshly registered account.
    pub fn empty(account_id: AccountId) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: String::new(),
            newsletter: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for [`crate::AccountStore::create_account`]. The account and its
/// profile are created together in one transaction.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub newsletter: bool,
}

/// Partial profile update; `None` leaves a field unchanged. First and last
/// name live on the account row and are written in the same transaction.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub newsletter: Option<bool>,
}

/// Filter for product listings. Newest first; no free-text search and no
/// pagination.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub available_only: bool,
    pub discounted_only: bool,
    pub limit: Option<usize>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn discounted_only(mut self) -> Self {
        self.discounted_only = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_price_prefers_discount() {
        let category = CategoryId::new();
        let product = ProductRecord::new("Widget", "widget", Money::from_cents(10_000), category);
        assert_eq!(product.final_price().cents(), 10_000);
        assert!(!product.has_discount());

        let discounted = product.with_discount(Money::from_cents(9_000));
        assert_eq!(discounted.final_price().cents(), 9_000);
        assert!(discounted.has_discount());
    }

    #[test]
    fn cart_line_total_uses_live_final_price() {
        let category = CategoryId::new();
        let product = ProductRecord::new("Widget", "widget", Money::from_cents(10_000), category)
            .with_discount(Money::from_cents(9_000));

        let line = CartLine {
            id: CartLineId::new(),
            cart_id: CartId::new(),
            product,
            quantity: 2,
            added_at: Utc::now(),
        };

        assert_eq!(line.line_total().cents(), 18_000);
    }

    #[test]
    fn order_line_total_uses_frozen_price() {
        let line = OrderLineRecord {
            id: OrderLineId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            quantity: 3,
            unit_price: Money::from_cents(5_000),
            created_at: Utc::now(),
        };

        assert_eq!(line.line_total().cents(), 15_000);
    }
}
