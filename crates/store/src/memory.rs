use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AccountId, CartId, CartLineId, Money, OrderId, OrderLineId, OrderStatus, ProductId,
    ShopperIdentity,
};
use tokio::sync::RwLock;

use crate::records::{
    AccountRecord, CartLine, CartRecord, CategoryRecord, NewAccount, NewOrder, NewOrderLine,
    OrderLineRecord, OrderRecord, ProductFilter, ProductRecord, ProfileRecord, ProfileUpdate,
};
use crate::store::{AccountStore, CartStore, CatalogStore, OrderStore};
use crate::{Result, StoreError};

/// Cart line as stored: the product is joined in on read.
#[derive(Debug, Clone)]
struct StoredCartLine {
    id: CartLineId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: u32,
    added_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    categories: Vec<CategoryRecord>,
    products: Vec<ProductRecord>,
    carts: Vec<CartRecord>,
    cart_lines: Vec<StoredCartLine>,
    orders: Vec<OrderRecord>,
    order_lines: Vec<OrderLineRecord>,
    accounts: Vec<AccountRecord>,
    profiles: Vec<ProfileRecord>,
}

impl Inner {
    fn line_to_detail(&self, line: &StoredCartLine) -> Result<CartLine> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == line.product_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", line.product_id))?;

        Ok(CartLine {
            id: line.id,
            cart_id: line.cart_id,
            product,
            quantity: line.quantity,
            added_at: line.added_at,
        })
    }
}

/// In-memory store implementation for testing.
///
/// Stores all rows in memory behind one lock and provides the same trait
/// surface as the PostgreSQL implementation; a write lock held across a
/// whole operation stands in for a transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cart lines across all carts.
    pub async fn cart_line_count(&self) -> usize {
        self.inner.read().await.cart_lines.len()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_category(&self, category: CategoryRecord) -> Result<CategoryRecord> {
        let mut inner = self.inner.write().await;

        if inner
            .categories
            .iter()
            .any(|c| c.name == category.name || c.slug == category.slug)
        {
            return Err(StoreError::Duplicate {
                entity: "category",
                detail: category.slug.clone(),
            });
        }

        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let inner = self.inner.read().await;
        let mut categories = inner.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<ProductRecord> {
        let mut inner = self.inner.write().await;

        if inner.products.iter().any(|p| p.slug == product.slug) {
            return Err(StoreError::Duplicate {
                entity: "product",
                detail: product.slug.clone(),
            });
        }

        inner.products.push(product.clone());
        Ok(product)
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductRecord>> {
        let inner = self.inner.read().await;
        let mut products: Vec<_> = inner
            .products
            .iter()
            .filter(|p| {
                if let Some(category_id) = filter.category_id
                    && p.category_id != category_id
                {
                    return false;
                }
                if filter.available_only && !p.is_available {
                    return false;
                }
                if filter.discounted_only && p.discount_price.is_none() {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = filter.limit {
            products.truncate(limit);
        }

        Ok(products)
    }

    async fn set_product_availability(
        &self,
        id: ProductId,
        is_available: bool,
    ) -> Result<ProductRecord> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("product", id))?;

        product.is_available = is_available;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn set_product_price(
        &self,
        id: ProductId,
        price: Money,
        discount_price: Option<Money>,
    ) -> Result<ProductRecord> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("product", id))?;

        product.price = price;
        product.discount_price = discount_price;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn find_or_create_cart(&self, owner: &ShopperIdentity) -> Result<CartRecord> {
        let mut inner = self.inner.write().await;

        if let Some(cart) = inner.carts.iter().find(|c| &c.owner == owner) {
            return Ok(cart.clone());
        }

        let now = Utc::now();
        let cart = CartRecord {
            id: CartId::new(),
            owner: owner.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.carts.push(cart.clone());
        Ok(cart)
    }

    async fn cart_by_id(&self, id: CartId) -> Result<Option<CartRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.iter().find(|c| c.id == id).cloned())
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>> {
        let inner = self.inner.read().await;
        let mut lines: Vec<_> = inner
            .cart_lines
            .iter()
            .filter(|l| l.cart_id == cart_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.added_at);

        lines.iter().map(|l| inner.line_to_detail(l)).collect()
    }

    async fn find_line(&self, line_id: CartLineId) -> Result<Option<CartLine>> {
        let inner = self.inner.read().await;
        inner
            .cart_lines
            .iter()
            .find(|l| l.id == line_id)
            .map(|l| inner.line_to_detail(l))
            .transpose()
    }

    async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        let mut inner = self.inner.write().await;

        if !inner.carts.iter().any(|c| c.id == cart_id) {
            return Err(StoreError::not_found("cart", cart_id));
        }
        if !inner.products.iter().any(|p| p.id == product_id) {
            return Err(StoreError::not_found("product", product_id));
        }

        let line_id = match inner
            .cart_lines
            .iter_mut()
            .find(|l| l.cart_id == cart_id && l.product_id == product_id)
        {
            Some(existing) => {
                existing.quantity += quantity;
                existing.id
            }
            None => {
                let line = StoredCartLine {
                    id: CartLineId::new(),
                    cart_id,
                    product_id,
                    quantity,
                    added_at: Utc::now(),
                };
                let id = line.id;
                inner.cart_lines.push(line);
                id
            }
        };

        let line = inner
            .cart_lines
            .iter()
            .find(|l| l.id == line_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("cart line", line_id))?;
        inner.line_to_detail(&line)
    }

    async fn set_line_quantity(&self, line_id: CartLineId, quantity: u32) -> Result<CartLine> {
        let mut inner = self.inner.write().await;

        let line = inner
            .cart_lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| StoreError::not_found("cart line", line_id))?;
        line.quantity = quantity;
        let line = line.clone();

        inner.line_to_detail(&line)
    }

    async fn delete_line(&self, line_id: CartLineId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let before = inner.cart_lines.len();
        inner.cart_lines.retain(|l| l.id != line_id);

        if inner.cart_lines.len() == before {
            return Err(StoreError::not_found("cart line", line_id));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(
        &self,
        cart_id: CartId,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<OrderRecord> {
        // One write lock across the whole sequence: order, lines, cart
        // clearing all become visible together.
        let mut inner = self.inner.write().await;

        if inner
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::Duplicate {
                entity: "order",
                detail: order.order_number.to_string(),
            });
        }

        let now = Utc::now();
        let record = OrderRecord {
            id: order.id,
            account_id: order.account_id,
            order_number: order.order_number,
            status: OrderStatus::Pending,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(record.clone());

        for line in lines {
            inner.order_lines.push(OrderLineRecord {
                id: OrderLineId::new(),
                order_id: record.id,
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                created_at: now,
            });
        }

        inner.cart_lines.retain(|l| l.cart_id != cart_id);

        Ok(record)
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order_lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn orders_for_account(&self, account_id: AccountId) -> Result<Vec<OrderRecord>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner
            .orders
            .iter()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderRecord> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::not_found("order", id))?;

        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delivered_total(&self, account_id: AccountId) -> Result<Money> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .filter(|o| o.account_id == account_id && o.status == OrderStatus::Delivered)
            .map(|o| o.total_amount)
            .sum())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create_account(&self, account: NewAccount) -> Result<AccountRecord> {
        let mut inner = self.inner.write().await;

        if inner.accounts.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Duplicate {
                entity: "account",
                detail: "accounts_username_key".to_string(),
            });
        }
        if inner.accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate {
                entity: "account",
                detail: "accounts_email_key".to_string(),
            });
        }

        let now = Utc::now();
        let record = AccountRecord {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            created_at: now,
            updated_at: now,
        };
        inner.accounts.push(record.clone());

        let mut profile = ProfileRecord::empty(account.id);
        profile.phone = account.phone;
        profile.newsletter = account.newsletter;
        inner.profiles.push(profile);

        Ok(record)
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_or_create_profile(&self, account_id: AccountId) -> Result<ProfileRecord> {
        let mut inner = self.inner.write().await;

        if !inner.accounts.iter().any(|a| a.id == account_id) {
            return Err(StoreError::not_found("account", account_id));
        }

        if let Some(profile) = inner.profiles.iter().find(|p| p.account_id == account_id) {
            return Ok(profile.clone());
        }

        let profile = ProfileRecord::empty(account_id);
        inner.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_account_profile(
        &self,
        account_id: AccountId,
        changes: ProfileUpdate,
    ) -> Result<(AccountRecord, ProfileRecord)> {
        let mut inner = self.inner.write().await;

        if !inner.accounts.iter().any(|a| a.id == account_id) {
            return Err(StoreError::not_found("account", account_id));
        }
        if !inner.profiles.iter().any(|p| p.account_id == account_id) {
            inner.profiles.push(ProfileRecord::empty(account_id));
        }

        let now = Utc::now();

        let account = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| StoreError::not_found("account", account_id))?;
        if let Some(first_name) = changes.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            account.last_name = last_name;
        }
        account.updated_at = now;
        let account = account.clone();

        let profile = inner
            .profiles
            .iter_mut()
            .find(|p| p.account_id == account_id)
            .ok_or_else(|| StoreError::not_found("profile", account_id))?;
        if let Some(phone) = changes.phone {
            profile.phone = phone;
        }
        if let Some(address) = changes.address {
            profile.address = address;
        }
        if let Some(city) = changes.city {
            profile.city = city;
        }
        if let Some(postal_code) = changes.postal_code {
            profile.postal_code = postal_code;
        }
        if let Some(country) = changes.country {
            profile.country = country;
        }
        if let Some(newsletter) = changes.newsletter {
            profile.newsletter = newsletter;
        }
        profile.updated_at = now;
        let profile = profile.clone();

        Ok((account, profile))
    }
}
