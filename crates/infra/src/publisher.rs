//! Best-effort publication of ticketing facts.

use boxoffice_events::{EventBus, EventEnvelope, InMemoryEventBus, TicketingEvent};

/// The bus the services publish to.
pub type TicketingBus = InMemoryEventBus<EventEnvelope<TicketingEvent>>;

/// Fire-and-forget publication seam.
///
/// Implementations must not block and must not fail the caller: the state
/// change that produced the event is already committed.
pub trait EventPublisher: Send + Sync {
    fn emit(&self, event: TicketingEvent);
}

impl<B> EventPublisher for B
where
    B: EventBus<EventEnvelope<TicketingEvent>>,
{
    fn emit(&self, event: TicketingEvent) {
        let envelope = EventEnvelope::wrap(event);
        let event_type = envelope.event_type().to_string();
        if let Err(err) = self.publish(envelope) {
            tracing::warn!(event_type = %event_type, error = %err, "failed to publish ticketing event");
        }
    }
}
