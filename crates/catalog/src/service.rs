//! Catalog service over a [`CatalogStore`].

use common::{Money, ProductId};
use store::{CatalogStore, CategoryRecord, ProductFilter, ProductRecord};

use crate::error::CatalogError;

/// How many related products a product page shows.
const RELATED_LIMIT: usize = 4;

/// Service for browsing and managing the catalog.
pub struct CatalogService<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> CatalogService<S> {
    /// Creates a new catalog service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up a product by slug. Unavailable products are hidden from
    /// shoppers, so they come back as not found.
    #[tracing::instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<ProductRecord, CatalogError> {
        match self.store.product_by_slug(slug).await? {
            Some(product) if product.is_available => Ok(product),
            _ => Err(CatalogError::ProductNotFound(slug.to_string())),
        }
    }

    /// Lists available products, newest first, optionally narrowed to a
    /// category (by slug) and/or to discounted products only.
    #[tracing::instrument(skip(self))]
    pub async fn browse(
        &self,
        category_slug: Option<&str>,
        discounted_only: bool,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let mut filter = ProductFilter::new().available_only();

        if let Some(slug) = category_slug {
            let category = self
                .store
                .category_by_slug(slug)
                .await?
                .ok_or_else(|| CatalogError::CategoryNotFound(slug.to_string()))?;
            filter = filter.category(category.id);
        }
        if discounted_only {
            filter = filter.discounted_only();
        }

        Ok(self.store.list_products(filter).await?)
    }

    /// Available products in the same category, excluding the product
    /// itself.
    #[tracing::instrument(skip(self, product))]
    pub async fn related_products(
        &self,
        product: &ProductRecord,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let siblings = self
            .store
            .list_products(
                ProductFilter::new()
                    .available_only()
                    .category(product.category_id),
            )
            .await?;

        Ok(siblings
            .into_iter()
            .filter(|p| p.id != product.id)
            .take(RELATED_LIMIT)
            .collect())
    }

    /// All categories, alphabetical.
    #[tracing::instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<CategoryRecord>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    /// Toggles whether shoppers can see and buy a product.
    #[tracing::instrument(skip(self))]
    pub async fn set_availability(
        &self,
        id: ProductId,
        is_available: bool,
    ) -> Result<ProductRecord, CatalogError> {
        Ok(self.store.set_product_availability(id, is_available).await?)
    }

    /// Replaces a product's price and discount price.
    #[tracing::instrument(skip(self))]
    pub async fn set_price(
        &self,
        id: ProductId,
        price: Money,
        discount_price: Option<Money>,
    ) -> Result<ProductRecord, CatalogError> {
        Ok(self.store.set_product_price(id, price, discount_price).await?)
    }
}
