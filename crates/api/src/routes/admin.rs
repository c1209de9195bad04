//! Administrative endpoints, gated by the [`AdminRegistry`].
//!
//! Authenticating administrators is the identity provider's job; what this
//! module enforces is that only registered (entity, action) pairs are
//! reachable at all.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, OrderId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};
use store::ShopStore;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::registry::{AdminRegistry, AdminResource};
use crate::routes::catalog::ProductResponse;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub order_ids: Vec<Uuid>,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub price_cents: i64,
    pub discount_price_cents: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct AdminIndexResponse {
    pub resources: Vec<AdminResource>,
}

#[derive(Serialize)]
pub struct BulkStatusResponse {
    pub updated: usize,
    pub status: String,
}

// -- Handlers --

fn ensure_registered(registry: &AdminRegistry, entity: &str, action: &str) -> Result<(), ApiError> {
    if registry.allows(entity, action) {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!(
            "no admin action {action} registered for {entity}"
        )))
    }
}

/// GET /admin — the registered administrative surface.
#[tracing::instrument(skip(state))]
pub async fn index<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<AdminIndexResponse> {
    Json(AdminIndexResponse {
        resources: state.admin.resources().to_vec(),
    })
}

/// POST /admin/orders/status — assign a status to a batch of orders.
///
/// Plain assignment with no transition validation; unknown IDs are skipped
/// the way a bulk update skips rows that don't match.
#[tracing::instrument(skip(state, req))]
pub async fn set_order_status<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, ApiError> {
    ensure_registered(&state.admin, "orders", "set_status")?;

    let order_ids: Vec<OrderId> = req.order_ids.into_iter().map(OrderId::from_uuid).collect();
    let updated = state.orders.set_status_bulk(&order_ids, req.status).await?;

    Ok(Json(BulkStatusResponse {
        updated: updated.len(),
        status: req.status.to_string(),
    }))
}

/// PUT /admin/products/{id}/availability — show or hide a product.
#[tracing::instrument(skip(state, req))]
pub async fn set_availability<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    ensure_registered(&state.admin, "products", "set_availability")?;

    let product = state
        .catalog
        .set_availability(ProductId::from_uuid(product_id), req.is_available)
        .await?;

    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /admin/products/{id}/price — reprice a product.
#[tracing::instrument(skip(state, req))]
pub async fn set_price<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    ensure_registered(&state.admin, "products", "set_price")?;

    if req.price_cents <= 0 {
        return Err(ApiError::BadRequest("price must be positive".to_string()));
    }
    if let Some(discount) = req.discount_price_cents
        && discount <= 0
    {
        return Err(ApiError::BadRequest(
            "discount price must be positive".to_string(),
        ));
    }

    let product = state
        .catalog
        .set_price(
            ProductId::from_uuid(product_id),
            Money::from_cents(req.price_cents),
            req.discount_price_cents.map(Money::from_cents),
        )
        .await?;

    Ok(Json(ProductResponse::from(&product)))
}
