//! Catalog browsing: products and categories.
//!
//! Read-only from the shopper's perspective; the two write operations
//! (availability, pricing) belong to catalog management.

pub mod error;
pub mod service;

pub use error::CatalogError;
pub use service::CatalogService;
