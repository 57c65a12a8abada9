//! Ticketing facts and the pub/sub plumbing that carries them.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod ticketing;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::DomainEvent;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use ticketing::{
    BookingCancelled, BookingConfirmed, CatalogChange, CatalogChanged, PaymentRefunded, TicketingEvent,
};
