//! Catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use store::{CategoryRecord, ProductRecord, ShopStore};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    /// Category slug to narrow the listing to.
    pub category: Option<String>,
    /// When true, only discounted products.
    #[serde(default)]
    pub discounted: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price_cents: i64,
    pub discount_price_cents: Option<i64>,
    pub final_price_cents: i64,
    pub category_id: String,
    pub stock: u32,
    pub is_available: bool,
}

impl From<&ProductRecord> for ProductResponse {
    fn from(product: &ProductRecord) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price_cents: product.price.cents(),
            discount_price_cents: product.discount_price.map(|m| m.cents()),
            final_price_cents: product.final_price().cents(),
            category_id: product.category_id.to_string(),
            stock: product.stock,
            is_available: product.is_available,
        }
    }
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
}

impl From<&CategoryRecord> for CategoryResponse {
    fn from(category: &CategoryRecord) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub related: Vec<ProductResponse>,
}

// -- Handlers --

/// GET /categories — all categories, alphabetical.
#[tracing::instrument(skip(state))]
pub async fn categories<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.catalog.categories().await?;
    Ok(Json(categories.iter().map(CategoryResponse::from).collect()))
}

/// GET /products — available products, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .catalog
        .browse(query.category.as_deref(), query.discounted)
        .await?;

    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

/// GET /products/{slug} — one product with its related products.
#[tracing::instrument(skip(state))]
pub async fn detail<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let product = state.catalog.product(&slug).await?;
    let related = state.catalog.related_products(&product).await?;

    Ok(Json(ProductDetailResponse {
        product: ProductResponse::from(&product),
        related: related.iter().map(ProductResponse::from).collect(),
    }))
}
