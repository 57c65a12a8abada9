//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/service/bus wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and the success envelope
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use boxoffice_infra::{AppConfig, TicketingServices};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Request-independent settings handlers need.
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
    pub default_page_size: u32,
}

/// Build the full HTTP router with fresh in-memory services.
pub async fn build_app(config: AppConfig) -> Router {
    let services = services::build_services(&config);
    router(services, &config)
}

/// Router over already-wired services (lets `main` keep the bus for workers).
pub fn router(services: Arc<TicketingServices>, config: &AppConfig) -> Router {
    let jwt = Arc::new(boxoffice_auth::Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes()));
    let auth_state = middleware::AuthState { jwt };
    let settings = ApiSettings {
        default_page_size: config.default_page_size,
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(Extension(settings)),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
