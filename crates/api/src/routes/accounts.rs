//! Account registration and profile endpoints.

use std::sync::Arc;

use accounts::{AccountOverview, RegisterRequest};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use store::{AccountRecord, ProfileRecord, ProfileUpdate, ShopStore};

use crate::AppState;
use crate::error::ApiError;
use crate::identity::ClientIdentity;
use crate::routes::orders::OrderSummaryResponse;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_newsletter")]
    pub newsletter: bool,
}

fn default_newsletter() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
pub struct ProfileBody {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub newsletter: Option<bool>,
}

// -- Response types --

#[derive(Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&AccountRecord> for AccountResponse {
    fn from(account: &AccountRecord) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub newsletter: bool,
}

impl From<&ProfileRecord> for ProfileResponse {
    fn from(profile: &ProfileRecord) -> Self {
        Self {
            phone: profile.phone.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            postal_code: profile.postal_code.clone(),
            country: profile.country.clone(),
            newsletter: profile.newsletter,
        }
    }
}

#[derive(Serialize)]
pub struct OverviewResponse {
    pub account: AccountResponse,
    pub profile: ProfileResponse,
    pub recent_orders: Vec<OrderSummaryResponse>,
    pub total_spent_cents: i64,
}

impl From<&AccountOverview> for OverviewResponse {
    fn from(overview: &AccountOverview) -> Self {
        Self {
            account: AccountResponse::from(&overview.account),
            profile: ProfileResponse::from(&overview.profile),
            recent_orders: overview
                .recent_orders
                .iter()
                .map(OrderSummaryResponse::from)
                .collect(),
            total_spent_cents: overview.total_spent.cents(),
        }
    }
}

// -- Handlers --

/// POST /accounts — register a new account with its profile.
#[tracing::instrument(skip(state, body), fields(username = %body.username))]
pub async fn register<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = state
        .accounts
        .register(RegisterRequest {
            username: body.username,
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
            newsletter: body.newsletter,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// GET /account/profile — the account page: profile, recent orders, and
/// total spent across delivered orders.
#[tracing::instrument(skip(state, identity))]
pub async fn profile<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
) -> Result<Json<OverviewResponse>, ApiError> {
    let account_id = identity.require_account()?;
    let overview = state.accounts.overview(account_id).await?;
    Ok(Json(OverviewResponse::from(&overview)))
}

/// PUT /account/profile — partial profile update.
#[tracing::instrument(skip(state, identity, body))]
pub async fn update_profile<S: ShopStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: ClientIdentity,
    Json(body): Json<ProfileBody>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let account_id = identity.require_account()?;

    state
        .accounts
        .update_profile(
            account_id,
            ProfileUpdate {
                first_name: body.first_name,
                last_name: body.last_name,
                phone: body.phone,
                address: body.address,
                city: body.city,
                postal_code: body.postal_code,
                country: body.country,
                newsletter: body.newsletter,
            },
        )
        .await?;

    let overview = state.accounts.overview(account_id).await?;
    Ok(Json(OverviewResponse::from(&overview)))
}
