use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use boxoffice_auth::Capability;
use boxoffice_core::EventId;
use boxoffice_infra::TicketingServices;

use crate::app::{ApiSettings, dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/tickets", post(create_ticket_type))
}

pub async fn list_events(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(settings): Extension<ApiSettings>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::ListEventsParams>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ViewEvents) {
        return denied;
    }

    let listing = match services.catalog.list_events(params.into_query(settings.default_page_size)) {
        Ok(listing) => listing,
        Err(e) => return errors::service_error_to_response(e),
    };

    let message = if listing.cached {
        "Events retrieved successfully (cached)"
    } else {
        "Events retrieved successfully"
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": true,
            "message": message,
            "data": listing.page.items,
            "pagination": listing.page.pagination,
        })),
    )
        .into_response()
}

pub async fn get_event(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ViewEvents) {
        return denied;
    }
    let event_id: EventId = match errors::parse_id(&id, "event") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.get_event(event_id) {
        Ok(detail) => dto::ok(StatusCode::OK, "Event retrieved successfully", detail),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_event(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateEventRequest>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageEvents) {
        return denied;
    }

    match services.catalog.create_event(principal.principal(), body.into()) {
        Ok(event) => dto::ok(StatusCode::CREATED, "Event created successfully", event),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_event(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateEventRequest>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageEvents) {
        return denied;
    }
    let event_id: EventId = match errors::parse_id(&id, "event") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.update_event(principal.principal(), event_id, body.into()) {
        Ok(event) => dto::ok(StatusCode::OK, "Event updated successfully", event),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_event(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageEvents) {
        return denied;
    }
    let event_id: EventId = match errors::parse_id(&id, "event") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete_event(principal.principal(), event_id) {
        Ok(()) => dto::ok(StatusCode::OK, "Event deleted successfully", serde_json::Value::Null),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_ticket_type(
    Extension(services): Extension<Arc<TicketingServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateTicketTypeRequest>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageTicketTypes) {
        return denied;
    }
    let event_id: EventId = match errors::parse_id(&id, "event") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.create_ticket_type(principal.principal(), event_id, body.into()) {
        Ok(ticket_type) => dto::ok(StatusCode::CREATED, "Ticket created successfully", ticket_type),
        Err(e) => errors::service_error_to_response(e),
    }
}
