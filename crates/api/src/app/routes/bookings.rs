use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use boxoffice_auth::Capability;
use boxoffice_core::BookingId;
use boxoffice_infra::TicketingServices;

use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bookings))
        .route("/:id/cancel", put(cancel_booking))
        .route("/:id/payment", post(pay_booking))
}

pub async fn list_bookings(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ViewOwnBookings) {
        return denied;
    }

    match services.bookings.list_for_user(principal.user_id()) {
        Ok(views) => dto::ok(StatusCode::OK, "Bookings retrieved successfully", views),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn cancel_booking(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::BookTickets) {
        return denied;
    }
    let booking_id: BookingId = match errors::parse_id(&id, "booking") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.bookings.cancel_booking(principal.user_id(), booking_id).await {
        Ok(booking) => dto::ok(StatusCode::OK, "Booking cancelled successfully", booking),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// 201 when the payment succeeds, 400 for failed or refunded outcomes.
pub async fn pay_booking(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::PayRequest>>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::PayBookings) {
        return denied;
    }
    let booking_id: BookingId = match errors::parse_id(&id, "booking") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let forced = match body.map(|Json(b)| b).unwrap_or_default().forced_outcome() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = match services.payments.pay(principal.user_id(), booking_id, forced).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };

    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };

    (
        status,
        Json(json!({
            "status": result.success,
            "success": result.success,
            "message": result.message,
            "data": {
                "payment": result.payment.details(),
                "booking": result.booking,
            },
        })),
    )
        .into_response()
}
