use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use bustas_core::ResolveError;
use bustas_storage::StorageError;

/// Error surface of every handler. One variant per response class, one
/// place mapping them to status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    MalformedInput(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::DuplicateKey => ApiError::Conflict,
            StorageError::ForeignKeyViolation(what) => {
                ApiError::UnprocessableEntity(format!("unknown reference: {what}"))
            }
            StorageError::RowNotFound => ApiError::NotFound,
            StorageError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "request failed");
        }
        let body = serde_json::json!({"error": self.to_string()});
        (self.status(), axum::Json(body)).into_response()
    }
}
