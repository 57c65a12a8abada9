use std::sync::Arc;

use boxoffice_core::SystemClock;
use boxoffice_infra::{AppConfig, TicketingBus, TicketingServices};
use boxoffice_payments::SimulatedPaymentProcessor;

/// In-memory stores, the simulated payment gateway and a fresh bus.
pub fn build_services(config: &AppConfig) -> Arc<TicketingServices> {
    tracing::info!(
        cache_ttl_secs = config.event_cache_ttl.as_secs(),
        lock_timeout_ms = config.lock_timeout.as_millis() as u64,
        "wiring in-memory ticketing services"
    );

    Arc::new(TicketingServices::in_memory(
        config,
        Arc::new(SimulatedPaymentProcessor::new()),
        Arc::new(SystemClock),
        Arc::new(TicketingBus::new()),
    ))
}
