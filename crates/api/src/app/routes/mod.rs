use axum::{Router, routing::get};

pub mod bookings;
pub mod events;
pub mod payments;
pub mod system;
pub mod tickets;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/events", events::router())
        .nest("/tickets", tickets::router())
        .nest("/bookings", bookings::router())
        .nest("/payments", payments::router())
}
