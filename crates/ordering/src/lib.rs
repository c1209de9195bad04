//! The storefront core: cart identity resolution and mutation, the checkout
//! workflow, and order history.
//!
//! A cart is a mutable selection of products owned by exactly one shopper
//! identity. Checkout reconciles it into an immutable order snapshot in one
//! atomic store transaction: order, frozen lines, cleared cart — all or
//! nothing.

pub mod cart;
pub mod checkout;
pub mod error;
pub mod orders;

pub use cart::{CartService, CartSummary, LineChange};
pub use checkout::{CheckoutRequest, CheckoutService};
pub use error::{CartError, CheckoutError, OrdersError};
pub use orders::{OrderService, OrderWithLines};
