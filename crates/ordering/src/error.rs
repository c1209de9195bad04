use common::{CartId, CartLineId, OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while mutating a cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist or is not available to shoppers.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The cart does not exist.
    #[error("cart not found: {0}")]
    CartNotFound(CartId),

    /// The line does not exist in this cart.
    #[error("cart line not found: {0}")]
    LineNotFound(CartLineId),

    /// A quantity of zero is a removal, not an add.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// An error occurred in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing in the cart to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout requires an authenticated account; anonymous carts cannot
    /// place orders.
    #[error("an account is required to check out")]
    AccountRequired,

    /// The cart does not exist.
    #[error("cart not found: {0}")]
    CartNotFound(CartId),

    /// A required address field is blank.
    #[error("{0} must not be blank")]
    BlankAddress(&'static str),

    /// An error occurred in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur reading or administering orders.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// The order does not exist, or is not visible to the caller.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// An error occurred in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}
