use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use boxoffice_auth::Capability;
use boxoffice_core::PaymentId;
use boxoffice_infra::TicketingServices;

use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_payment))
        .route("/:id/refund", post(refund_payment))
}

pub async fn get_payment(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ViewPayments) {
        return denied;
    }
    let payment_id: PaymentId = match errors::parse_id(&id, "payment") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.payments.payment_details(principal.principal(), payment_id) {
        Ok(details) => dto::ok(StatusCode::OK, "Payment retrieved successfully", details),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn refund_payment(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::RefundPayments) {
        return denied;
    }
    let payment_id: PaymentId = match errors::parse_id(&id, "payment") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let refund = match services.payments.refund(payment_id).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": true,
            "message": refund.message,
            "data": {
                "payment": refund.payment.details(),
                "booking": refund.booking,
            },
        })),
    )
        .into_response()
}
