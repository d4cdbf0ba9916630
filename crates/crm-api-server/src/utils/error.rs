use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Engine-level failures. Services return these so callers can tell a
/// recoverable skip condition from a hard stop.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Field '{0}' is mandatory and cannot be disabled or deleted")]
    MandatoryFieldProtected(String),

    #[error("Duplicate record: {0}")]
    DuplicateRecord(String),

    #[error("The file doesn't contain any data rows")]
    EmptyFile,

    #[error("No valid rows found in the file")]
    NoValidRows,

    #[error("Batch insert failed: {0}")]
    BatchInsertFailed(String),

    // The compensating delete after a failed line insert also failed. The
    // header row is still in the store without its lines.
    #[error("Orphaned header {0}: line insert failed and header cleanup also failed")]
    OrphanedHeader(Uuid),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::StoreUnavailable(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(_)
            | EngineError::MandatoryFieldProtected(_)
            | EngineError::DuplicateRecord(_)
            | EngineError::EmptyFile
            | EngineError::NoValidRows => ApiError::BadRequest(e.to_string()),
            EngineError::OrphanedHeader(_) => {
                tracing::error!("Compensation failure: {}", e);
                ApiError::InternalError(e.to_string())
            }
            EngineError::BatchInsertFailed(_) | EngineError::StoreUnavailable(_) => {
                ApiError::DatabaseError(e.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound", msg)
            },
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            },
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError", msg)
            },
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg)
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
