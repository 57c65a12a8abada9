//! Payment records plus the booking index that keeps one payment per booking.
//!
//! The record and its index entry are written under the same lock, so a
//! second insert for a booking fails with `Conflict` instead of racing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use boxoffice_core::{BookingId, PaymentId};
use boxoffice_payments::Payment;

use crate::error::StoreError;

/// Payment records, unique per booking.
pub trait PaymentStore: Send + Sync {
    /// Insert a payment. A second payment for the same booking is a `Conflict`.
    fn insert(&self, payment: Payment) -> Result<(), StoreError>;

    fn get(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, StoreError>;

    /// `Success -> Refunded` as a compare-and-swap.
    fn mark_refunded(&self, id: PaymentId, at: DateTime<Utc>) -> Result<Payment, StoreError>;

    /// Undo an insert whose follow-up step failed.
    fn remove(&self, id: PaymentId) -> Result<(), StoreError>;
}

impl<S> PaymentStore for Arc<S>
where
    S: PaymentStore + ?Sized,
{
    fn insert(&self, payment: Payment) -> Result<(), StoreError> {
        (**self).insert(payment)
    }

    fn get(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        (**self).get(id)
    }

    fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, StoreError> {
        (**self).find_by_booking(booking_id)
    }

    fn mark_refunded(&self, id: PaymentId, at: DateTime<Utc>) -> Result<Payment, StoreError> {
        (**self).mark_refunded(id, at)
    }

    fn remove(&self, id: PaymentId) -> Result<(), StoreError> {
        (**self).remove(id)
    }
}

#[derive(Debug, Default)]
struct PaymentState {
    payments: HashMap<PaymentId, Payment>,
    by_booking: HashMap<BookingId, PaymentId>,
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    state: RwLock<PaymentState>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn insert(&self, payment: Payment) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned("payments"))?;

        if state.by_booking.contains_key(&payment.booking_id()) {
            return Err(StoreError::Conflict("payment already exists for this booking".to_string()));
        }

        state.by_booking.insert(payment.booking_id(), payment.id_typed());
        state.payments.insert(payment.id_typed(), payment);
        Ok(())
    }

    fn get(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned("payments"))?;
        Ok(state.payments.get(&id).cloned())
    }

    fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned("payments"))?;
        Ok(state
            .by_booking
            .get(&booking_id)
            .and_then(|id| state.payments.get(id))
            .cloned())
    }

    fn mark_refunded(&self, id: PaymentId, at: DateTime<Utc>) -> Result<Payment, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned("payments"))?;
        let payment = state.payments.get_mut(&id).ok_or(StoreError::NotFound("Payment"))?;
        payment.mark_refunded(at)?;
        Ok(payment.clone())
    }

    fn remove(&self, id: PaymentId) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned("payments"))?;
        if let Some(payment) = state.payments.remove(&id) {
            state.by_booking.remove(&payment.booking_id());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use boxoffice_core::{DomainError, Money};
    use boxoffice_payments::{PaymentOutcome, PaymentStatus};

    fn payment(booking_id: BookingId, outcome: PaymentOutcome) -> Payment {
        Payment::record(PaymentId::new(), booking_id, Money::from_minor(2_000), outcome, Utc::now())
    }

    #[test]
    fn one_payment_per_booking() {
        let store = InMemoryPaymentStore::new();
        let booking_id = BookingId::new();

        store.insert(payment(booking_id, PaymentOutcome::Failed)).unwrap();
        let err = store.insert(payment(booking_id, PaymentOutcome::Success)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.find_by_booking(booking_id).unwrap().unwrap();
        assert_eq!(found.status(), PaymentStatus::Failed);
    }

    #[test]
    fn mark_refunded_is_a_single_shot() {
        let store = InMemoryPaymentStore::new();
        let p = payment(BookingId::new(), PaymentOutcome::Success);
        let id = p.id_typed();
        store.insert(p).unwrap();

        assert_eq!(store.mark_refunded(id, Utc::now()).unwrap().status(), PaymentStatus::Refunded);
        assert!(matches!(
            store.mark_refunded(id, Utc::now()),
            Err(StoreError::Domain(DomainError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn remove_frees_the_booking_slot() {
        let store = InMemoryPaymentStore::new();
        let booking_id = BookingId::new();
        let p = payment(booking_id, PaymentOutcome::Success);
        let id = p.id_typed();

        store.insert(p).unwrap();
        store.remove(id).unwrap();

        assert!(store.get(id).unwrap().is_none());
        store.insert(payment(booking_id, PaymentOutcome::Success)).unwrap();
    }
}
