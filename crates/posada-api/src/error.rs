use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use posada_db::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// HTTP-facing error type. Validation failures keep their messages; anything
/// internal is logged and collapsed to a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::Store(StoreError::NotFound(msg.into()))
    }

    /// Log the underlying cause, hand the client an opaque 500.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        error!("internal error: {}", err);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Store(err) => match err {
                StoreError::DateRange(msg)
                | StoreError::Conflict(msg)
                | StoreError::State(msg)
                | StoreError::Duplicate(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                StoreError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                StoreError::Sqlite(e) => {
                    error!("database failure: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                }
                StoreError::Internal(msg) => {
                    error!("store invariant broken: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
                }
            },
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
