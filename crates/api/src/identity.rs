//! Header-based shopper identity extraction.
//!
//! The identity provider is external: requests carry either an
//! `x-account-id` header (authenticated) or an `x-session-token` header
//! (anonymous). Neither header means the shopper has no identity yet; cart
//! resolution will mint a session token and hand it back in the payload.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{AccountId, SessionToken, ShopperIdentity};
use uuid::Uuid;

use crate::error::ApiError;

const ACCOUNT_HEADER: &str = "x-account-id";
const SESSION_HEADER: &str = "x-session-token";

/// The caller's identity, if any headers carried one.
#[derive(Debug, Clone)]
pub struct ClientIdentity(pub Option<ShopperIdentity>);

impl ClientIdentity {
    /// The identity, erring for endpoints that need one.
    pub fn require(self) -> Result<ShopperIdentity, ApiError> {
        self.0
            .ok_or_else(|| ApiError::Unauthorized("identity headers required".to_string()))
    }

    /// The account ID, erring for account-only endpoints.
    pub fn require_account(self) -> Result<AccountId, ApiError> {
        match self.0 {
            Some(ShopperIdentity::Account(id)) => Ok(id),
            _ => Err(ApiError::Unauthorized(
                "an authenticated account is required".to_string(),
            )),
        }
    }

    /// The identity, minting a fresh session token when none was supplied.
    /// Returns the token alongside when it was minted so handlers can hand
    /// it back to the client.
    pub fn or_new_session(self) -> (ShopperIdentity, Option<SessionToken>) {
        match self.0 {
            Some(identity) => (identity, None),
            None => {
                let token = SessionToken::generate();
                (ShopperIdentity::Session(token.clone()), Some(token))
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(ACCOUNT_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::BadRequest(format!("invalid {ACCOUNT_HEADER} header")))?;
            let uuid = Uuid::parse_str(raw)
                .map_err(|e| ApiError::BadRequest(format!("invalid {ACCOUNT_HEADER}: {e}")))?;
            return Ok(Self(Some(ShopperIdentity::Account(AccountId::from_uuid(
                uuid,
            )))));
        }

        if let Some(value) = parts.headers.get(SESSION_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::BadRequest(format!("invalid {SESSION_HEADER} header")))?;
            if raw.trim().is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "{SESSION_HEADER} must not be blank"
                )));
            }
            return Ok(Self(Some(ShopperIdentity::Session(SessionToken::new(
                raw.trim(),
            )))));
        }

        Ok(Self(None))
    }
}
