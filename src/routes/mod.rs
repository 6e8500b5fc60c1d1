use axum::http::StatusCode;
use axum::Json;

use crate::models::api::ErrorResponse;
use crate::services::approval::{ApprovalError, PhotoDeleteError};
use crate::services::lifecycle::LifecycleError;
use crate::services::storage::StorageError;

pub mod categories;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod photos;

/// Every failing handler returns the underlying error text as JSON.
pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

pub(crate) fn lifecycle_error(e: LifecycleError) -> ApiError {
    let status = match &e {
        LifecycleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

pub(crate) fn record_store_error(e: sqlx::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("record store error: {e}"))),
    )
}

pub(crate) fn storage_error(e: StorageError) -> ApiError {
    let status = match &e {
        StorageError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

pub(crate) fn approval_error(e: ApprovalError) -> ApiError {
    let status = match &e {
        ApprovalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApprovalError::NotFound(_) => StatusCode::NOT_FOUND,
        ApprovalError::Storage(StorageError::Config(_)) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = match e.step() {
        Some(step) => ErrorResponse::with_step(e.to_string(), step),
        None => ErrorResponse::new(e.to_string()),
    };
    (status, Json(body))
}

pub(crate) fn photo_delete_error(e: PhotoDeleteError) -> ApiError {
    let status = match &e {
        PhotoDeleteError::Storage(StorageError::Config(_)) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}
