//! Payment attempts and refunds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use boxoffice_auth::{Principal, ensure_owner_or_admin};
use boxoffice_booking::{Booking, BookingStatus};
use boxoffice_core::{BookingId, Clock, PaymentId, UserId};
use boxoffice_events::{BookingCancelled, BookingConfirmed, PaymentRefunded, TicketingEvent};
use boxoffice_payments::{Payment, PaymentDetails, PaymentOutcome, PaymentProcessor, PaymentStatus};

use crate::error::{ServiceError, StoreError};
use crate::locks::KeyedLocks;
use crate::publisher::EventPublisher;
use crate::services::releases::{OwedRelease, ReleaseQueue};
use crate::stores::{BookingLedger, InventoryStore, PaymentStore};

pub const PAYMENT_SUCCEEDED: &str = "Payment processed successfully. Booking confirmed.";
pub const PAYMENT_FAILED: &str = "Payment failed. Please try again.";
pub const PAYMENT_REFUNDED_AT_PAY: &str = "Payment was refunded. Booking cancelled.";
pub const REFUND_SUCCEEDED: &str = "Payment refunded successfully. Booking cancelled.";

/// Outcome of [`PaymentService::pay`]. `success` is true only for `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub success: bool,
    pub payment: Payment,
    pub booking: Booking,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundResult {
    pub payment: Payment,
    pub booking: Booking,
    pub message: &'static str,
}

pub struct PaymentService {
    inventory: Arc<dyn InventoryStore>,
    ledger: Arc<dyn BookingLedger>,
    payments: Arc<dyn PaymentStore>,
    releases: Arc<ReleaseQueue>,
    processor: Arc<dyn PaymentProcessor>,
    booking_locks: Arc<KeyedLocks<BookingId>>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        ledger: Arc<dyn BookingLedger>,
        payments: Arc<dyn PaymentStore>,
        releases: Arc<ReleaseQueue>,
        processor: Arc<dyn PaymentProcessor>,
        booking_locks: Arc<KeyedLocks<BookingId>>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inventory,
            ledger,
            payments,
            releases,
            processor,
            booking_locks,
            publisher,
            clock,
        }
    }

    /// Record the single payment attempt for a booking and apply its outcome.
    ///
    /// Runs under the booking's lock, shared with cancel and refund. If the
    /// booking transition fails after the payment row was written, the
    /// payment is removed again.
    #[tracing::instrument(skip(self), fields(actor = %actor, booking_id = %booking_id))]
    pub async fn pay(
        &self,
        actor: UserId,
        booking_id: BookingId,
        forced: Option<PaymentOutcome>,
    ) -> Result<PaymentResult, ServiceError> {
        let _guard = self.booking_locks.acquire(booking_id).await?;

        let booking = self.ledger.get(booking_id)?.ok_or(ServiceError::NotFound("Booking"))?;
        if !booking.is_owned_by(actor) {
            tracing::warn!("payment attempted by non-owner");
            return Err(ServiceError::Forbidden);
        }
        if booking.status() == BookingStatus::Cancelled {
            return Err(ServiceError::AlreadyCancelled);
        }
        if self.payments.find_by_booking(booking_id)?.is_some() {
            tracing::debug!("duplicate payment rejected");
            return Err(ServiceError::DuplicatePayment);
        }

        let ticket_type = self
            .inventory
            .get(booking.ticket_type_id())?
            .ok_or(ServiceError::NotFound("Ticket type"))?;
        let amount = ticket_type.price().times(booking.quantity())?;

        let outcome = self.processor.evaluate(forced);
        let now = self.clock.now();
        let payment = Payment::record(PaymentId::new(), booking_id, amount, outcome, now);

        self.payments.insert(payment.clone()).map_err(|err| match err {
            StoreError::Conflict(_) => ServiceError::DuplicatePayment,
            other => other.into(),
        })?;

        let booking = match self.apply_outcome(&booking, outcome, now) {
            Ok(booking) => booking,
            Err(err) => {
                tracing::warn!(payment_id = %payment.id_typed(), error = %err, "rolling back payment");
                if let Err(remove_err) = self.payments.remove(payment.id_typed()) {
                    tracing::error!(payment_id = %payment.id_typed(), error = %remove_err, "failed to roll back payment");
                }
                return Err(err);
            }
        };

        if outcome == PaymentOutcome::Refunded {
            // The payment stays: the booking is already cancelled.
            let _ = self.releases.release(OwedRelease {
                booking_id: Some(booking_id),
                ticket_type_id: booking.ticket_type_id(),
                quantity: booking.quantity(),
            });
        }

        tracing::info!(
            payment_id = %payment.id_typed(),
            outcome = %outcome,
            amount = %amount,
            "payment recorded"
        );

        match outcome {
            PaymentOutcome::Success => {
                self.publisher.emit(TicketingEvent::BookingConfirmed(BookingConfirmed {
                    booking_id,
                    user_id: booking.user_id(),
                    ticket_type_id: booking.ticket_type_id(),
                    event_id: ticket_type.event_id(),
                    quantity: booking.quantity(),
                    amount,
                    occurred_at: now,
                }));
            }
            PaymentOutcome::Refunded => {
                self.emit_cancelled(&booking);
                self.emit_refunded(&payment, now);
            }
            PaymentOutcome::Failed => {}
        }

        let message = match outcome {
            PaymentOutcome::Success => PAYMENT_SUCCEEDED,
            PaymentOutcome::Failed => PAYMENT_FAILED,
            PaymentOutcome::Refunded => PAYMENT_REFUNDED_AT_PAY,
        };

        Ok(PaymentResult {
            success: outcome == PaymentOutcome::Success,
            payment,
            booking,
            message,
        })
    }

    fn apply_outcome(
        &self,
        booking: &Booking,
        outcome: PaymentOutcome,
        at: DateTime<Utc>,
    ) -> Result<Booking, ServiceError> {
        match outcome {
            PaymentOutcome::Success if booking.status() == BookingStatus::Confirmed => Ok(booking.clone()),
            PaymentOutcome::Success => Ok(self.ledger.transition(
                booking.id_typed(),
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                at,
            )?),
            // The hold stays so the user may retry.
            PaymentOutcome::Failed => Ok(booking.clone()),
            PaymentOutcome::Refunded => {
                Ok(self.ledger.transition(
                    booking.id_typed(),
                    BookingStatus::Pending,
                    BookingStatus::Cancelled,
                    at,
                )?)
            }
        }
    }

    /// Refund a successful payment, cancel its booking and release the hold once.
    #[tracing::instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn refund(&self, payment_id: PaymentId) -> Result<RefundResult, ServiceError> {
        let payment = self.payments.get(payment_id)?.ok_or(ServiceError::NotFound("Payment"))?;
        let booking_id = payment.booking_id();

        let _guard = self.booking_locks.acquire(booking_id).await?;

        // Re-read under the lock; a concurrent refund may have landed.
        let payment = self.payments.get(payment_id)?.ok_or(ServiceError::NotFound("Payment"))?;
        match payment.status() {
            PaymentStatus::Refunded => return Err(ServiceError::AlreadyRefunded),
            PaymentStatus::Failed => return Err(ServiceError::CannotRefundFailed),
            PaymentStatus::Success => {}
        }

        let now = self.clock.now();
        let booking = self.ledger.get(booking_id)?.ok_or(ServiceError::NotFound("Booking"))?;
        let payment = self.payments.mark_refunded(payment_id, now)?;

        let booking = if booking.is_holding() {
            let cancelled = self
                .ledger
                .transition(booking_id, booking.status(), BookingStatus::Cancelled, now)?;
            let _ = self.releases.release(OwedRelease {
                booking_id: Some(booking_id),
                ticket_type_id: cancelled.ticket_type_id(),
                quantity: cancelled.quantity(),
            });
            self.emit_cancelled(&cancelled);
            cancelled
        } else {
            booking
        };

        tracing::info!(booking_id = %booking_id, amount = %payment.amount(), "payment refunded");
        self.emit_refunded(&payment, now);

        Ok(RefundResult {
            payment,
            booking,
            message: REFUND_SUCCEEDED,
        })
    }

    pub fn get_payment(&self, payment_id: PaymentId) -> Result<Payment, ServiceError> {
        self.payments.get(payment_id)?.ok_or(ServiceError::NotFound("Payment"))
    }

    /// Payment details, visible to the booking's owner or an admin.
    pub fn payment_details(&self, principal: &Principal, payment_id: PaymentId) -> Result<PaymentDetails, ServiceError> {
        let payment = self.get_payment(payment_id)?;
        let booking = self
            .ledger
            .get(payment.booking_id())?
            .ok_or(ServiceError::NotFound("Booking"))?;

        ensure_owner_or_admin(principal, booking.user_id()).map_err(|_| ServiceError::Forbidden)?;
        Ok(payment.details())
    }

    fn emit_refunded(&self, payment: &Payment, at: DateTime<Utc>) {
        self.publisher.emit(TicketingEvent::PaymentRefunded(PaymentRefunded {
            payment_id: payment.id_typed(),
            booking_id: payment.booking_id(),
            amount: payment.amount(),
            occurred_at: at,
        }));
    }

    fn emit_cancelled(&self, booking: &Booking) {
        self.publisher.emit(TicketingEvent::BookingCancelled(BookingCancelled {
            booking_id: booking.id_typed(),
            user_id: booking.user_id(),
            ticket_type_id: booking.ticket_type_id(),
            quantity: booking.quantity(),
            occurred_at: booking.updated_at(),
        }));
    }
}
