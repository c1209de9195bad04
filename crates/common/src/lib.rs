//! Shared value types used across the storefront crates.

pub mod identity;
pub mod money;
pub mod order;
pub mod types;

pub use identity::ShopperIdentity;
pub use money::Money;
pub use order::{OrderNumber, OrderStatus, PaymentMethod, ParseEnumError};
pub use types::{
    AccountId, CartId, CartLineId, CategoryId, OrderId, OrderLineId, ProductId, SessionToken,
};
