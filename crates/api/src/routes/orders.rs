//! Order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use serde::Serialize;
use store::{OrderLineRecord, OrderRecord, ShopStore};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::ClientIdentity;

// -- Response types --

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub payment_method: String,
    pub total_amount_cents: i64,
    pub created_at: String,
}

impl From<&OrderRecord> for OrderSummaryResponse {
    fn from(order: &OrderRecord) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.to_string(),
            status: order.status.to_string(),
            payment_method: order.payment_method.to_string(),
            total_amount_cents: order.total_amount.cents(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&OrderLineRecord> for OrderLineResponse {
    fn from(line: &OrderLineRecord) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.line_total().cents(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub summary: OrderSummaryResponse,
    pub shipping_address: String,
    pub billing_address: String,
    pub notes: String,
    pub lines: Vec<OrderLineResponse>,
}

impl OrderDetailResponse {
    pub fn new(order: &OrderRecord, lines: &[OrderLineRecord]) -> Self {
        Self {
            summary: OrderSummaryResponse::from(order),
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
            notes: order.notes.clone(),
            lines: lines.iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// GET /orders — the caller's orders, most recent first. Anonymous
/// shoppers get an empty history.
#[tracing::instrument(skip(state, identity))]
pub async fn list<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let Some(identity) = identity.0 else {
        return Ok(Json(Vec::new()));
    };

    let orders = state.orders.list_orders(&identity).await?;
    Ok(Json(orders.iter().map(OrderSummaryResponse::from).collect()))
}

/// GET /orders/{id} — one of the caller's orders, with its frozen lines.
#[tracing::instrument(skip(state, identity))]
pub async fn detail<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let identity = identity.require()?;
    let found = state
        .orders
        .get_order(&identity, OrderId::from_uuid(order_id))
        .await?;

    Ok(Json(OrderDetailResponse::new(&found.order, &found.lines)))
}
