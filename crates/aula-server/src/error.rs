use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::error;

use aula_service::ServiceError;

/// Error half of every handler result: a status and `{"error": "..."}`.
pub type ApiError = (StatusCode, Json<Value>);

pub fn to_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Configuration(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!(error = %e, "request failed");
    }
    (status, Json(json!({ "error": e.to_string() })))
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg.into() })))
}
