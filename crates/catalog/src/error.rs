use store::StoreError;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with the given slug is visible to shoppers.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// No category with the given slug exists.
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    /// An error occurred in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}
