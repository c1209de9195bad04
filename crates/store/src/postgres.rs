use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    AccountId, CartId, CartLineId, CategoryId, Money, OrderId, OrderLineId, OrderNumber,
    OrderStatus, PaymentMethod, ProductId, SessionToken, ShopperIdentity,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::records::{
    AccountRecord, CartLine, CartRecord, CategoryRecord, NewAccount, NewOrder, NewOrderLine,
    OrderLineRecord, OrderRecord, ProductFilter, ProductRecord, ProfileRecord, ProfileUpdate,
};
use crate::store::{AccountStore, CartStore, CatalogStore, OrderStore};
use crate::{Result, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price_cents, discount_price_cents, \
     category_id, stock, is_available, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, account_id, order_number, status, payment_method, \
     total_amount_cents, shipping_address, billing_address, notes, created_at, updated_at";

const CART_LINE_COLUMNS: &str = "cl.id AS line_id, cl.cart_id, cl.quantity, cl.added_at, \
     p.id AS product_id, p.name AS product_name, p.slug AS product_slug, \
     p.description AS product_description, p.price_cents, p.discount_price_cents, \
     p.category_id, p.stock, p.is_available, \
     p.created_at AS product_created_at, p.updated_at AS product_updated_at";

/// PostgreSQL-backed storefront store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_category(row: &PgRow) -> Result<CategoryRecord> {
        Ok(CategoryRecord {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            discount_price: row
                .try_get::<Option<i64>, _>("discount_price_cents")?
                .map(Money::from_cents),
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            stock: row.try_get::<i32, _>("stock")?.max(0) as u32,
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart(row: &PgRow) -> Result<CartRecord> {
        let account_id: Option<Uuid> = row.try_get("account_id")?;
        let session_token: Option<String> = row.try_get("session_token")?;

        let owner = match (account_id, session_token) {
            (Some(id), None) => ShopperIdentity::Account(AccountId::from_uuid(id)),
            (None, Some(token)) => ShopperIdentity::Session(SessionToken::new(token)),
            _ => {
                return Err(StoreError::InvalidRow {
                    entity: "cart",
                    detail: "cart must be owned by exactly one of account or session".to_string(),
                });
            }
        };

        Ok(CartRecord {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            owner,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
        let product = ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            name: row.try_get("product_name")?,
            slug: row.try_get("product_slug")?,
            description: row.try_get("product_description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            discount_price: row
                .try_get::<Option<i64>, _>("discount_price_cents")?
                .map(Money::from_cents),
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            stock: row.try_get::<i32, _>("stock")?.max(0) as u32,
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("product_created_at")?,
            updated_at: row.try_get("product_updated_at")?,
        };

        Ok(CartLine {
            id: CartLineId::from_uuid(row.try_get::<Uuid, _>("line_id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            product,
            quantity: row.try_get::<i32, _>("quantity")?.max(0) as u32,
            added_at: row.try_get("added_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        let payment_method: String = row.try_get("payment_method")?;

        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            account_id: AccountId::from_uuid(row.try_get::<Uuid, _>("account_id")?),
            order_number: OrderNumber::new(row.try_get::<String, _>("order_number")?),
            status: OrderStatus::from_str(&status).map_err(|e| StoreError::InvalidRow {
                entity: "order",
                detail: e.to_string(),
            })?,
            payment_method: PaymentMethod::from_str(&payment_method).map_err(|e| {
                StoreError::InvalidRow {
                    entity: "order",
                    detail: e.to_string(),
                }
            })?,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            shipping_address: row.try_get("shipping_address")?,
            billing_address: row.try_get("billing_address")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_line(row: &PgRow) -> Result<OrderLineRecord> {
        Ok(OrderLineRecord {
            id: OrderLineId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: row.try_get::<i32, _>("quantity")?.max(0) as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_account(row: &PgRow) -> Result<AccountRecord> {
        Ok(AccountRecord {
            id: AccountId::from_uuid(row.try_get::<Uuid, _>("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_profile(row: &PgRow) -> Result<ProfileRecord> {
        Ok(ProfileRecord {
            account_id: AccountId::from_uuid(row.try_get::<Uuid, _>("account_id")?),
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
            newsletter: row.try_get("newsletter")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Maps a unique-constraint violation onto a duplicate error; everything
    /// else stays a database error.
    fn map_constraint(e: sqlx::Error, entity: &'static str, constraints: &[&str]) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && let Some(constraint) = db_err.constraint()
            && constraints.contains(&constraint)
        {
            return StoreError::Duplicate {
                entity,
                detail: constraint.to_string(),
            };
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_category(&self, category: CategoryRecord) -> Result<CategoryRecord> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Self::map_constraint(e, "category", &["categories_name_key", "categories_slug_key"])
        })?;

        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, slug, description, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>> {
        let row = sqlx::query(
            "SELECT id, name, slug, description, created_at, updated_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn insert_product(&self, product: ProductRecord) -> Result<ProductRecord> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price_cents, discount_price_cents,
                                  category_id, stock, is_available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.discount_price.map(|m| m.cents()))
        .bind(product.category_id.as_uuid())
        .bind(product.stock as i32)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_constraint(e, "product", &["products_slug_key"]))?;

        Ok(product)
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductRecord>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if filter.category_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category_id = ${param_count}"));
        }
        if filter.available_only {
            sql.push_str(" AND is_available");
        }
        if filter.discounted_only {
            sql.push_str(" AND discount_price_cents IS NOT NULL");
        }

        sql.push_str(" ORDER BY created_at DESC");

        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(category_id) = filter.category_id {
            query = query.bind(category_id.as_uuid());
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_product).collect()
    }

    async fn set_product_availability(
        &self,
        id: ProductId,
        is_available: bool,
    ) -> Result<ProductRecord> {
        let row = sqlx::query(&format!(
            "UPDATE products SET is_available = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(is_available)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(&row),
            None => Err(StoreError::not_found("product", id)),
        }
    }

    async fn set_product_price(
        &self,
        id: ProductId,
        price: Money,
        discount_price: Option<Money>,
    ) -> Result<ProductRecord> {
        let row = sqlx::query(&format!(
            "UPDATE products SET price_cents = $2, discount_price_cents = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(price.cents())
        .bind(discount_price.map(|m| m.cents()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(&row),
            None => Err(StoreError::not_found("product", id)),
        }
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn find_or_create_cart(&self, owner: &ShopperIdentity) -> Result<CartRecord> {
        let now = Utc::now();

        // Idempotent upsert: insert-or-ignore, then read the winner back.
        match owner {
            ShopperIdentity::Account(account_id) => {
                sqlx::query(
                    r#"
                    INSERT INTO carts (id, account_id, session_token, created_at, updated_at)
                    VALUES ($1, $2, NULL, $3, $3)
                    ON CONFLICT (account_id) WHERE account_id IS NOT NULL DO NOTHING
                    "#,
                )
                .bind(CartId::new().as_uuid())
                .bind(account_id.as_uuid())
                .bind(now)
                .execute(&self.pool)
                .await?;

                let row = sqlx::query(
                    "SELECT id, account_id, session_token, created_at, updated_at \
                     FROM carts WHERE account_id = $1",
                )
                .bind(account_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

                Self::row_to_cart(&row)
            }
            ShopperIdentity::Session(token) => {
                sqlx::query(
                    r#"
                    INSERT INTO carts (id, account_id, session_token, created_at, updated_at)
                    VALUES ($1, NULL, $2, $3, $3)
                    ON CONFLICT (session_token) WHERE session_token IS NOT NULL DO NOTHING
                    "#,
                )
                .bind(CartId::new().as_uuid())
                .bind(token.as_str())
                .bind(now)
                .execute(&self.pool)
                .await?;

                let row = sqlx::query(
                    "SELECT id, account_id, session_token, created_at, updated_at \
                     FROM carts WHERE session_token = $1",
                )
                .bind(token.as_str())
                .fetch_one(&self.pool)
                .await?;

                Self::row_to_cart(&row)
            }
        }
    }

    async fn cart_by_id(&self, id: CartId) -> Result<Option<CartRecord>> {
        let row = sqlx::query(
            "SELECT id, account_id, session_token, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_cart).transpose()
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_lines cl \
             JOIN products p ON p.id = cl.product_id \
             WHERE cl.cart_id = $1 ORDER BY cl.added_at ASC"
        ))
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_cart_line).collect()
    }

    async fn find_line(&self, line_id: CartLineId) -> Result<Option<CartLine>> {
        let row = sqlx::query(&format!(
            "SELECT {CART_LINE_COLUMNS} FROM cart_lines cl \
             JOIN products p ON p.id = cl.product_id \
             WHERE cl.id = $1"
        ))
        .bind(line_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_cart_line).transpose()
    }

    async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        let line_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO cart_lines (id, cart_id, product_id, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT cart_lines_cart_product_key
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            RETURNING id
            "#,
        )
        .bind(CartLineId::new().as_uuid())
        .bind(cart_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.find_line(CartLineId::from_uuid(line_id))
            .await?
            .ok_or_else(|| StoreError::not_found("cart line", line_id))
    }

    async fn set_line_quantity(&self, line_id: CartLineId, quantity: u32) -> Result<CartLine> {
        let updated = sqlx::query("UPDATE cart_lines SET quantity = $2 WHERE id = $1")
            .bind(line_id.as_uuid())
            .bind(quantity as i32)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("cart line", line_id));
        }

        self.find_line(line_id)
            .await?
            .ok_or_else(|| StoreError::not_found("cart line", line_id))
    }

    async fn delete_line(&self, line_id: CartLineId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(line_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("cart line", line_id));
        }

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(
        &self,
        cart_id: CartId,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> Result<OrderRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, account_id, order_number, status, payment_method,
                                total_amount_cents, shipping_address, billing_address, notes,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.account_id.as_uuid())
        .bind(order.order_number.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.total_amount.cents())
        .bind(&order.shipping_address)
        .bind(&order.billing_address)
        .bind(&order.notes)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_constraint(e, "order", &["orders_order_number_key"]))?;

        // Lines are sequenced after the order so an observer never sees an
        // order without its lines.
        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, product_id, product_name, quantity,
                                         unit_price_cents, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(OrderLineId::new().as_uuid())
            .bind(order.id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(&line.product_name)
            .bind(line.quantity as i32)
            .bind(line.unit_price.cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Empty the cart last; the cart row itself survives for reuse.
        sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(order_id = %order.id, %cart_id, lines = lines.len(), "order placed");

        Ok(OrderRecord {
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
        })
    }

    async fn order_by_id(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, product_name, quantity, unit_price_cents, created_at \
             FROM order_lines WHERE order_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order_line).collect()
    }

    async fn orders_for_account(&self, account_id: AccountId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE account_id = $1 ORDER BY created_at DESC"
        ))
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderRecord> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(&row),
            None => Err(StoreError::not_found("order", id)),
        }
    }

    async fn delivered_total(&self, account_id: AccountId) -> Result<Money> {
        let cents: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_amount_cents) FROM orders \
             WHERE account_id = $1 AND status = 'delivered'",
        )
        .bind(account_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents.unwrap_or(0)))
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn create_account(&self, account: NewAccount) -> Result<AccountRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            Self::map_constraint(e, "account", &["accounts_username_key", "accounts_email_key"])
        })?;

        sqlx::query(
            r#"
            INSERT INTO profiles (account_id, phone, newsletter, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.phone)
        .bind(account.newsletter)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AccountRecord {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            created_at: now,
            updated_at: now,
        })
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        let row = sqlx::query(
            "SELECT id, username, email, first_name, last_name, created_at, updated_at \
             FROM accounts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    async fn find_or_create_profile(&self, account_id: AccountId) -> Result<ProfileRecord> {
        sqlx::query(
            r#"
            INSERT INTO profiles (account_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ON CONFLICT (account_id) DO NOTHING
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("profiles_account_id_fkey")
            {
                return StoreError::not_found("account", account_id);
            }
            StoreError::Database(e)
        })?;

        let row = sqlx::query(
            "SELECT account_id, phone, address, city, postal_code, country, newsletter, \
             created_at, updated_at FROM profiles WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_profile(&row)
    }

    async fn update_account_profile(
        &self,
        account_id: AccountId,
        changes: ProfileUpdate,
    ) -> Result<(AccountRecord, ProfileRecord)> {
        // Profile row may not exist yet for accounts created out of band.
        self.find_or_create_profile(account_id).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let account_row = sqlx::query(
            r#"
            UPDATE accounts
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                updated_at = $4
            WHERE id = $1
            RETURNING id, username, email, first_name, last_name, created_at, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("account", account_id))?;

        let profile_row = sqlx::query(
            r#"
            UPDATE profiles
            SET phone = COALESCE($2, phone),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                postal_code = COALESCE($5, postal_code),
                country = COALESCE($6, country),
                newsletter = COALESCE($7, newsletter),
                updated_at = $8
            WHERE account_id = $1
            RETURNING account_id, phone, address, city, postal_code, country, newsletter,
                      created_at, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(changes.phone.as_deref())
        .bind(changes.address.as_deref())
        .bind(changes.city.as_deref())
        .bind(changes.postal_code.as_deref())
        .bind(changes.country.as_deref())
        .bind(changes.newsletter)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((
            Self::row_to_account(&account_row)?,
            Self::row_to_profile(&profile_row)?,
        ))
    }
}
