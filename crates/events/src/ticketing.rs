//! Facts published by the ticketing services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{BookingId, EventId, Money, PaymentId, TicketTypeId, UserId};

use crate::DomainEvent;

/// A successful payment confirmed a booking. Drives the user notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmed {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub ticket_type_id: TicketTypeId,
    pub event_id: EventId,
    pub quantity: u32,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// A booking left the holding states and its units went back to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCancelled {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub ticket_type_id: TicketTypeId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRefunded {
    pub payment_id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogChange {
    EventCreated,
    EventUpdated,
    EventDeleted,
    TicketTypeCreated,
    TicketTypeUpdated,
    TicketTypeDeleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogChanged {
    pub change: CatalogChange,
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketingEvent {
    BookingConfirmed(BookingConfirmed),
    BookingCancelled(BookingCancelled),
    PaymentRefunded(PaymentRefunded),
    CatalogChanged(CatalogChanged),
}

impl DomainEvent for TicketingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TicketingEvent::BookingConfirmed(_) => "booking.confirmed",
            TicketingEvent::BookingCancelled(_) => "booking.cancelled",
            TicketingEvent::PaymentRefunded(_) => "payment.refunded",
            TicketingEvent::CatalogChanged(_) => "catalog.changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TicketingEvent::BookingConfirmed(e) => e.occurred_at,
            TicketingEvent::BookingCancelled(e) => e.occurred_at,
            TicketingEvent::PaymentRefunded(e) => e.occurred_at,
            TicketingEvent::CatalogChanged(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventEnvelope;

    #[test]
    fn envelope_carries_event_type() {
        let event = TicketingEvent::CatalogChanged(CatalogChanged {
            change: CatalogChange::EventDeleted,
            event_id: EventId::new(),
            occurred_at: Utc::now(),
        });

        let envelope = EventEnvelope::wrap(event.clone());
        assert_eq!(envelope.event_type(), "catalog.changed");
        assert_eq!(envelope.payload(), &event);
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = TicketingEvent::BookingConfirmed(BookingConfirmed {
            booking_id: BookingId::new(),
            user_id: UserId::new(),
            ticket_type_id: TicketTypeId::new(),
            event_id: EventId::new(),
            quantity: 2,
            amount: Money::from_minor(10_000),
            occurred_at: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "booking_confirmed");
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["amount"], 10_000);
    }
}
