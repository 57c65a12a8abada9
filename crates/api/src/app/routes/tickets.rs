use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{post, put},
};

use boxoffice_auth::Capability;
use boxoffice_core::TicketTypeId;
use boxoffice_infra::TicketingServices;

use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", put(update_ticket_type).delete(delete_ticket_type))
        .route("/:id/bookings", post(create_booking))
}

pub async fn update_ticket_type(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTicketTypeRequest>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageTicketTypes) {
        return denied;
    }
    let ticket_type_id: TicketTypeId = match errors::parse_id(&id, "ticket") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .catalog
        .update_ticket_type(principal.principal(), ticket_type_id, body.into())
    {
        Ok(ticket_type) => dto::ok(StatusCode::OK, "Ticket updated successfully", ticket_type),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_ticket_type(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageTicketTypes) {
        return denied;
    }
    let ticket_type_id: TicketTypeId = match errors::parse_id(&id, "ticket") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete_ticket_type(principal.principal(), ticket_type_id) {
        Ok(()) => dto::ok(StatusCode::OK, "Ticket deleted successfully", serde_json::Value::Null),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_booking(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateBookingRequest>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::BookTickets) {
        return denied;
    }
    let ticket_type_id: TicketTypeId = match errors::parse_id(&id, "ticket") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .bookings
        .create_booking(principal.user_id(), ticket_type_id, body.quantity)
        .await
    {
        Ok(booking) => dto::ok(StatusCode::CREATED, "Booking created successfully", booking),
        Err(e) => errors::service_error_to_response(e),
    }
}
