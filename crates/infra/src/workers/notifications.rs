//! Booking confirmation notifications.
//!
//! Payment never calls a notifier directly. It publishes `BookingConfirmed`
//! and this worker delivers it off the request path, so a slow or failing
//! transport cannot delay or fail a payment.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use boxoffice_core::{BookingId, EventId, Money, TicketTypeId, UserId};
use boxoffice_events::{BookingConfirmed, EventBus, EventEnvelope, TicketingEvent};

use super::bus_worker::{BusWorker, WorkerHandle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub booking_id: BookingId,
    pub event_id: EventId,
    pub ticket_type_id: TicketTypeId,
    pub quantity: u32,
    pub amount: Money,
    pub confirmed_at: DateTime<Utc>,
}

impl From<&BookingConfirmed> for BookingSummary {
    fn from(e: &BookingConfirmed) -> Self {
        Self {
            booking_id: e.booking_id,
            event_id: e.event_id,
            ticket_type_id: e.ticket_type_id,
            quantity: e.quantity,
            amount: e.amount,
            confirmed_at: e.occurred_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Delivery seam for user notifications (push, mail, ...).
pub trait BookingNotifier: Send + Sync {
    fn notify_booking_confirmed(&self, user_id: UserId, summary: &BookingSummary) -> Result<(), NotifyError>;
}

impl<N> BookingNotifier for Arc<N>
where
    N: BookingNotifier + ?Sized,
{
    fn notify_booking_confirmed(&self, user_id: UserId, summary: &BookingSummary) -> Result<(), NotifyError> {
        (**self).notify_booking_confirmed(user_id, summary)
    }
}

/// Writes the notification to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl BookingNotifier for LoggingNotifier {
    fn notify_booking_confirmed(&self, user_id: UserId, summary: &BookingSummary) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %user_id,
            booking_id = %summary.booking_id,
            event_id = %summary.event_id,
            quantity = summary.quantity,
            amount = %summary.amount,
            "booking confirmed notification"
        );
        Ok(())
    }
}

#[derive(Debug)]
pub struct NotificationWorker;

impl NotificationWorker {
    /// Subscribe to `bus` and forward every `BookingConfirmed` to `notifier`.
    /// Delivery failures are logged by the worker loop and dropped.
    pub fn spawn<B>(bus: &B, notifier: Arc<dyn BookingNotifier>) -> io::Result<WorkerHandle>
    where
        B: EventBus<EventEnvelope<TicketingEvent>> + ?Sized,
    {
        BusWorker::spawn("booking-notifications", bus, move |envelope: EventEnvelope<TicketingEvent>| {
            match envelope.payload() {
                TicketingEvent::BookingConfirmed(confirmed) => {
                    notifier.notify_booking_confirmed(confirmed.user_id, &BookingSummary::from(confirmed))
                }
                _ => Ok(()),
            }
        })
    }
}
