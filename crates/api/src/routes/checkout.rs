//! The checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::PaymentMethod;
use ordering::CheckoutRequest;
use serde::Deserialize;
use store::{OrderStore, ShopStore};

use crate::AppState;
use crate::error::ApiError;
use crate::identity::ClientIdentity;
use crate::routes::orders::OrderDetailResponse;

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub shipping_address: String,
    #[serde(default)]
    pub billing_address: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: String,
}

/// POST /checkout — convert the caller's cart into a committed order.
#[tracing::instrument(skip(state, identity, body))]
pub async fn checkout<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), ApiError> {
    let identity = identity.require()?;
    let summary = state.carts.resolve_cart(&identity).await?;

    let order = state
        .checkout
        .checkout(
            summary.cart.id,
            CheckoutRequest {
                shipping_address: body.shipping_address,
                billing_address: body.billing_address,
                payment_method: body.payment_method,
                notes: body.notes,
            },
        )
        .await?;

    let lines = state.store.order_lines(order.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderDetailResponse::new(&order, &lines)),
    ))
}
