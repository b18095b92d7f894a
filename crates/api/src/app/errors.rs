//! Error-to-HTTP mapping. Every failure body is `{"detail": <message>}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use siphon_auth::AuthError;
use siphon_core::DomainError;
use siphon_infra::StoreError;
use siphon_inventory::StockError;
use siphon_sales::OrderError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Anything a handler can fail with, unified for response mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Order(OrderError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::Domain(DomainError::NotFound)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        // Keep the domain sub-error's own status mapping.
        match e {
            OrderError::Domain(d) => ApiError::Domain(d),
            other => ApiError::Order(other),
        }
    }
}

pub fn json_error(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": detail.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => {
                let status = match e {
                    AuthError::Forbidden => StatusCode::FORBIDDEN,
                    _ => StatusCode::UNAUTHORIZED,
                };
                json_error(status, e.to_string())
            }
            ApiError::Domain(e) => {
                let status = match e {
                    DomainError::NotFound => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                json_error(status, e.to_string())
            }
            ApiError::Order(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Stock(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Store(StoreError::NotFound) => {
                json_error(StatusCode::NOT_FOUND, "record not found")
            }
            ApiError::Store(StoreError::Backend(detail)) => {
                tracing::error!(%detail, "storage backend failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}
