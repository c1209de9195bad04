//! Storage traits implemented by [`crate::PostgresStore`] and
//! [`crate::InMemoryStore`].

use async_trait::async_trait;
use common::{
    AccountId, CartId, CartLineId, Money, OrderId, OrderStatus, ProductId, ShopperIdentity,
};

use crate::Result;
use crate::records::{
    AccountRecord, CartLine, CartRecord, CategoryRecord, NewAccount, NewOrder, NewOrderLine,
    OrderLineRecord, OrderRecord, ProductFilter, ProductRecord, ProfileRecord, ProfileUpdate,
};

/// Category and product storage. Read-heavy; the two write pairs exist for
/// catalog management.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_category(&self, category: CategoryRecord) -> Result<CategoryRecord>;

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>>;

    async fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>>;

    async fn insert_product(&self, product: ProductRecord) -> Result<ProductRecord>;

    async fn product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>>;

    /// Lists products matching the filter, newest first.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductRecord>>;

    async fn set_product_availability(
        &self,
        id: ProductId,
        is_available: bool,
    ) -> Result<ProductRecord>;

    async fn set_product_price(
        &self,
        id: ProductId,
        price: Money,
        discount_price: Option<Money>,
    ) -> Result<ProductRecord>;
}

/// Cart and cart-line storage.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the cart owned by `owner`, creating it if absent.
    ///
    /// A single idempotent upsert: repeated calls for the same identity
    /// return the same cart row.
    async fn find_or_create_cart(&self, owner: &ShopperIdentity) -> Result<CartRecord>;

    async fn cart_by_id(&self, id: CartId) -> Result<Option<CartRecord>>;

    /// Lines of a cart joined with their live products, oldest first.
    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>>;

    async fn find_line(&self, line_id: CartLineId) -> Result<Option<CartLine>>;

    /// Inserts a line, or increments the quantity of the existing line for
    /// the same product.
    async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine>;

    /// Overwrites a line's quantity. Callers must pass `quantity >= 1`;
    /// driving a line to zero is a delete, not an update.
    async fn set_line_quantity(&self, line_id: CartLineId, quantity: u32) -> Result<CartLine>;

    async fn delete_line(&self, line_id: CartLineId) -> Result<()>;
}

/// Order storage. `place_order` is the one transactional write of the
/// checkout workflow; everything else is a read or a status assignment.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Commits a cart into an order as one atomic unit: inserts the order,
    /// inserts its lines, and deletes all cart lines. Any failure rolls
    /// back every write; the cart row itself survives for reuse.
    async fn place_order(
        &self,
        cart_id: CartId,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<OrderRecord>;

    async fn order_by_id(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>>;

    /// An account's orders, most recent first.
    async fn orders_for_account(&self, account_id: AccountId) -> Result<Vec<OrderRecord>>;

    /// Assigns a status. No transition validation by design.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderRecord>;

    /// Sum of `total_amount` over the account's delivered orders.
    async fn delivered_total(&self, account_id: AccountId) -> Result<Money>;
}

/// Account and profile storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates the account and its profile in one transaction; either both
    /// rows exist afterwards or neither does.
    async fn create_account(&self, account: NewAccount) -> Result<AccountRecord>;

    async fn account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>>;

    /// Returns the account's profile, creating an empty one if absent.
    /// A total, idempotent operation.
    async fn find_or_create_profile(&self, account_id: AccountId) -> Result<ProfileRecord>;

    /// Applies a partial profile update; name fields are written to the
    /// account row in the same transaction.
    async fn update_account_profile(
        &self,
        account_id: AccountId,
        changes: ProfileUpdate,
    ) -> Result<(AccountRecord, ProfileRecord)>;
}

/// Umbrella trait for the full storefront store.
pub trait ShopStore:
    CatalogStore + CartStore + OrderStore + AccountStore + Clone + Send + Sync + 'static
{
}

impl<T> ShopStore for T where
    T: CatalogStore + CartStore + OrderStore + AccountStore + Clone + Send + Sync + 'static
{
}
