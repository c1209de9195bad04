//! Cart endpoints.
//!
//! Every handler resolves the caller's cart from their identity first; a
//! line is only reachable through the cart that owns it. When a request
//! arrives with no identity at all, cart resolution mints a session token
//! and the response carries it for the client to persist.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartLineId, ProductId, SessionToken};
use ordering::{CartSummary, LineChange};
use serde::{Deserialize, Serialize};
use store::{CartLine, ShopStore};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::ClientIdentity;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// Zero or below removes the line.
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartLineResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            product_id: line.product.id.to_string(),
            product_name: line.product.name.clone(),
            product_slug: line.product.slug.clone(),
            quantity: line.quantity,
            unit_price_cents: line.product.final_price().cents(),
            line_total_cents: line.line_total().cents(),
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: String,
    /// Present when the server minted a session token for this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    pub lines: Vec<CartLineResponse>,
    pub total_price_cents: i64,
    pub total_items: u32,
}

impl CartResponse {
    fn from_summary(summary: &CartSummary, minted: Option<SessionToken>) -> Self {
        Self {
            cart_id: summary.cart.id.to_string(),
            session_token: minted.map(|t| t.to_string()),
            lines: summary.lines.iter().map(CartLineResponse::from).collect(),
            total_price_cents: summary.total_price().cents(),
            total_items: summary.total_items(),
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's cart, created on first access.
#[tracing::instrument(skip(state, identity))]
pub async fn view<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
) -> Result<Json<CartResponse>, ApiError> {
    let (identity, minted) = identity.or_new_session();
    let summary = state.carts.resolve_cart(&identity).await?;
    Ok(Json(CartResponse::from_summary(&summary, minted)))
}

/// POST /cart/items — add a product (default quantity 1).
#[tracing::instrument(skip(state, identity, req))]
pub async fn add_item<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let (identity, minted) = identity.or_new_session();
    let summary = state.carts.resolve_cart(&identity).await?;

    state
        .carts
        .add_item(
            summary.cart.id,
            ProductId::from_uuid(req.product_id),
            req.quantity.unwrap_or(1),
        )
        .await?;

    let summary = state.carts.summary(summary.cart.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CartResponse::from_summary(&summary, minted)),
    ))
}

/// PUT /cart/items/{id} — assign a line quantity; zero removes the line.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update_item<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
    Path(line_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let identity = identity.require()?;
    let summary = state.carts.resolve_cart(&identity).await?;

    let quantity = u32::try_from(req.quantity.max(0)).unwrap_or(0);
    let change = state
        .carts
        .set_quantity(summary.cart.id, CartLineId::from_uuid(line_id), quantity)
        .await?;

    if let LineChange::Removed = change {
        tracing::debug!(%line_id, "cart line removed via zero quantity");
    }

    let summary = state.carts.summary(summary.cart.id).await?;
    Ok(Json(CartResponse::from_summary(&summary, None)))
}

/// DELETE /cart/items/{id} — remove a line.
#[tracing::instrument(skip(state, identity))]
pub async fn remove_item<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
    Path(line_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let identity = identity.require()?;
    let summary = state.carts.resolve_cart(&identity).await?;

    state
        .carts
        .remove_item(summary.cart.id, CartLineId::from_uuid(line_id))
        .await?;

    let summary = state.carts.summary(summary.cart.id).await?;
    Ok(Json(CartResponse::from_summary(&summary, None)))
}
