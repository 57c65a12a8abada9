//! Booking creation and cancellation.

use std::sync::Arc;

use serde::Serialize;

use boxoffice_booking::{Booking, BookingStatus};
use boxoffice_core::{BookingId, Clock, TicketTypeId, UserId};
use boxoffice_events::{BookingCancelled, TicketingEvent};
use boxoffice_payments::Payment;

use crate::error::{ServiceError, StoreError};
use crate::locks::KeyedLocks;
use crate::publisher::EventPublisher;
use crate::services::releases::{OwedRelease, ReleaseQueue};
use crate::stores::{BookingLedger, InventoryStore, PaymentStore};

/// A booking together with its payment, if one was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    pub booking: Booking,
    pub payment: Option<Payment>,
}

pub struct BookingService {
    inventory: Arc<dyn InventoryStore>,
    ledger: Arc<dyn BookingLedger>,
    payments: Arc<dyn PaymentStore>,
    releases: Arc<ReleaseQueue>,
    pair_locks: KeyedLocks<(UserId, TicketTypeId)>,
    booking_locks: Arc<KeyedLocks<BookingId>>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        ledger: Arc<dyn BookingLedger>,
        payments: Arc<dyn PaymentStore>,
        releases: Arc<ReleaseQueue>,
        booking_locks: Arc<KeyedLocks<BookingId>>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        lock_timeout: std::time::Duration,
    ) -> Self {
        Self {
            inventory,
            ledger,
            payments,
            releases,
            pair_locks: KeyedLocks::new("booking pair", lock_timeout),
            booking_locks,
            publisher,
            clock,
        }
    }

    /// Reserve `quantity` units and record a Pending booking.
    ///
    /// The duplicate check, the reservation and the insert run inside one
    /// critical section per `(user, ticket type)`. The duplicate check comes
    /// first so a doomed request never touches shared inventory.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, ticket_type_id = %ticket_type_id))]
    pub async fn create_booking(
        &self,
        user_id: UserId,
        ticket_type_id: TicketTypeId,
        quantity: u32,
    ) -> Result<Booking, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidQuantity);
        }

        let _pair = self.pair_locks.acquire((user_id, ticket_type_id)).await?;

        if self.ledger.has_active_booking(user_id, ticket_type_id)? {
            tracing::debug!("duplicate booking rejected");
            return Err(ServiceError::DuplicateBooking);
        }

        // Owed units go back before they can cause a false sell-out.
        self.releases.settle();

        let remaining = self.inventory.reserve(ticket_type_id, quantity).map_err(|err| {
            tracing::debug!(quantity, error = %err, "reservation rejected");
            ServiceError::from(err)
        })?;

        let booking = match Booking::pending(BookingId::new(), user_id, ticket_type_id, quantity, self.clock.now()) {
            Ok(booking) => booking,
            Err(err) => {
                self.undo_reservation(ticket_type_id, quantity);
                return Err(err.into());
            }
        };

        if let Err(err) = self.ledger.create(booking.clone()) {
            self.undo_reservation(ticket_type_id, quantity);
            return Err(match err {
                StoreError::Conflict(_) => ServiceError::DuplicateBooking,
                other => other.into(),
            });
        }

        tracing::info!(booking_id = %booking.id_typed(), quantity, remaining, "booking created");
        Ok(booking)
    }

    /// Cancel a Pending or Confirmed booking and return its units exactly once.
    #[tracing::instrument(skip(self), fields(actor = %actor, booking_id = %booking_id))]
    pub async fn cancel_booking(&self, actor: UserId, booking_id: BookingId) -> Result<Booking, ServiceError> {
        let _guard = self.booking_locks.acquire(booking_id).await?;

        let booking = self.ledger.get(booking_id)?.ok_or(ServiceError::NotFound("Booking"))?;
        if !booking.is_owned_by(actor) {
            tracing::warn!("cancel attempted by non-owner");
            return Err(ServiceError::Forbidden);
        }
        if booking.status() == BookingStatus::Cancelled {
            return Err(ServiceError::AlreadyCancelled);
        }

        let cancelled = self
            .ledger
            .transition(booking_id, booking.status(), BookingStatus::Cancelled, self.clock.now())
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::InvalidTransition { .. } => ServiceError::AlreadyCancelled,
                other => other,
            })?;

        // The transition above is the once-only gate for this release. The
        // cancellation is committed; a release that keeps failing stays owed.
        let _ = self.releases.release(OwedRelease {
            booking_id: Some(booking_id),
            ticket_type_id: cancelled.ticket_type_id(),
            quantity: cancelled.quantity(),
        });

        tracing::info!(quantity = cancelled.quantity(), "booking cancelled");
        self.publisher.emit(TicketingEvent::BookingCancelled(BookingCancelled {
            booking_id,
            user_id: cancelled.user_id(),
            ticket_type_id: cancelled.ticket_type_id(),
            quantity: cancelled.quantity(),
            occurred_at: cancelled.updated_at(),
        }));

        Ok(cancelled)
    }

    pub fn get(&self, booking_id: BookingId) -> Result<Booking, ServiceError> {
        self.ledger.get(booking_id)?.ok_or(ServiceError::NotFound("Booking"))
    }

    /// The user's bookings, newest first, each with its payment.
    pub fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingView>, ServiceError> {
        self.ledger
            .list_for_user(user_id)?
            .into_iter()
            .map(|booking| {
                let payment = self.payments.find_by_booking(booking.id_typed())?;
                Ok(BookingView { booking, payment })
            })
            .collect()
    }

    fn undo_reservation(&self, ticket_type_id: TicketTypeId, quantity: u32) {
        let _ = self.releases.release(OwedRelease {
            booking_id: None,
            ticket_type_id,
            quantity,
        });
    }
}
