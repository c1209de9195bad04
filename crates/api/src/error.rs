//! API error types with HTTP response mapping.

use accounts::AccountError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use ordering::{CartError, CheckoutError, OrdersError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The caller must be authenticated for this operation.
    Unauthorized(String),
    /// The request conflicts with existing state.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Duplicate { .. } => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(_) | CatalogError::CategoryNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CatalogError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(_)
            | CartError::CartNotFound(_)
            | CartError::LineNotFound(_) => ApiError::NotFound(err.to_string()),
            CartError::InvalidQuantity => ApiError::BadRequest(err.to_string()),
            CartError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart | CheckoutError::BlankAddress(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CheckoutError::AccountRequired => ApiError::Unauthorized(err.to_string()),
            CheckoutError::CartNotFound(_) => ApiError::NotFound(err.to_string()),
            CheckoutError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<OrdersError> for ApiError {
    fn from(err: OrdersError) -> Self {
        match err {
            OrdersError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OrdersError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UsernameTaken | AccountError::EmailTaken => {
                ApiError::Conflict(err.to_string())
            }
            AccountError::BlankField(_)
            | AccountError::InvalidEmail
            | AccountError::InvalidPhone => ApiError::BadRequest(err.to_string()),
            AccountError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AccountError::Store(store_err) => store_err.into(),
        }
    }
}
