use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use boxoffice_infra::{ServiceError, StoreError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        ServiceError::InvalidQuantity => json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_quantity", message),
        ServiceError::InsufficientInventory { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_inventory", message)
        }
        ServiceError::DuplicateBooking => json_error(StatusCode::CONFLICT, "duplicate_booking", message),
        ServiceError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        ServiceError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        ServiceError::AlreadyCancelled => json_error(StatusCode::BAD_REQUEST, "already_cancelled", message),
        ServiceError::DuplicatePayment => json_error(StatusCode::BAD_REQUEST, "duplicate_payment", message),
        ServiceError::AlreadyRefunded => json_error(StatusCode::BAD_REQUEST, "already_refunded", message),
        ServiceError::CannotRefundFailed => json_error(StatusCode::BAD_REQUEST, "cannot_refund_failed", message),
        ServiceError::Validation(_) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message),
        ServiceError::InvalidTransition { .. } => json_error(StatusCode::CONFLICT, "invalid_transition", message),
        ServiceError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        ServiceError::Storage(e) => {
            tracing::error!(error = %e, "storage failure");
            let code = match e {
                StoreError::Timeout(_) => "storage_timeout",
                _ => "storage_unavailable",
            };
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                code,
                "Service temporarily unavailable. Please retry.",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path id, answering 400 on garbage.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
