//! Cart identity resolution and mutation.

use common::{CartId, CartLineId, Money, ProductId, ShopperIdentity};
use store::{CartLine, CartRecord, CartStore, CatalogStore};

use crate::error::CartError;

/// A cart with its lines. Totals are derived from the lines on every
/// observation; nothing is cached.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub cart: CartRecord,
    pub lines: Vec<CartLine>,
}

impl CartSummary {
    /// Sum of quantity × live final price over all lines.
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines.
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Result of a quantity assignment: either the surviving line, or removal
/// when the quantity was driven to zero.
#[derive(Debug, Clone)]
pub enum LineChange {
    Updated(CartLine),
    Removed,
}

/// Service for resolving and mutating carts.
pub struct CartService<S> {
    store: S,
}

impl<S: CartStore + CatalogStore> CartService<S> {
    /// Creates a new cart service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the one cart for this identity, creating it on first access.
    ///
    /// Idempotent: repeated calls with the same identity return the same
    /// cart row.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_cart(&self, identity: &ShopperIdentity) -> Result<CartSummary, CartError> {
        let cart = self.store.find_or_create_cart(identity).await?;
        let lines = self.store.cart_lines(cart.id).await?;
        Ok(CartSummary { cart, lines })
    }

    /// Reloads a cart with its current lines.
    #[tracing::instrument(skip(self))]
    pub async fn summary(&self, cart_id: CartId) -> Result<CartSummary, CartError> {
        let cart = self
            .store
            .cart_by_id(cart_id)
            .await?
            .ok_or(CartError::CartNotFound(cart_id))?;
        let lines = self.store.cart_lines(cart.id).await?;
        Ok(CartSummary { cart, lines })
    }

    /// Adds a product to the cart, incrementing the existing line's
    /// quantity if the product is already present.
    ///
    /// Unknown and unavailable products fail with no side effect.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let available = matches!(
            self.store.product_by_id(product_id).await?,
            Some(product) if product.is_available
        );
        if !available {
            return Err(CartError::ProductNotFound(product_id));
        }

        let line = self.store.add_line(cart_id, product_id, quantity).await?;
        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);
        Ok(line)
    }

    /// Assigns a line's quantity. Zero removes the line entirely; a
    /// non-positive quantity is never stored.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<LineChange, CartError> {
        self.owned_line(cart_id, line_id).await?;

        if quantity == 0 {
            self.store.delete_line(line_id).await?;
            metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
            return Ok(LineChange::Removed);
        }

        let line = self.store.set_line_quantity(line_id, quantity).await?;
        metrics::counter!("cart_mutations_total", "op" => "update").increment(1);
        Ok(LineChange::Updated(line))
    }

    /// Removes a line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: CartId, line_id: CartLineId) -> Result<(), CartError> {
        self.owned_line(cart_id, line_id).await?;
        self.store.delete_line(line_id).await?;
        metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        Ok(())
    }

    /// A line is only addressable through the cart it belongs to.
    async fn owned_line(&self, cart_id: CartId, line_id: CartLineId) -> Result<CartLine, CartError> {
        match self.store.find_line(line_id).await? {
            Some(line) if line.cart_id == cart_id => Ok(line),
            _ => Err(CartError::LineNotFound(line_id)),
        }
    }
}
