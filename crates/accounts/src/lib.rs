//! Account registration and profile management.
//!
//! Credentials never appear here: authentication is the identity
//! provider's job, and this crate only keeps the account and profile rows
//! the storefront needs.

pub mod error;
pub mod service;

pub use error::AccountError;
pub use service::{AccountOverview, AccountService, RegisterRequest};
