//! Booking ledger: booking records plus the active-booking index.
//!
//! The index maps `(user, ticket type)` to the one booking currently holding
//! inventory for that pair. It is maintained under the same write lock as the
//! records, so a status change and its index update are one step.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use boxoffice_booking::{Booking, BookingStatus};
use boxoffice_core::{BookingId, TicketTypeId, UserId};

use crate::error::StoreError;

pub trait BookingLedger: Send + Sync {
    /// True iff the pair has a Pending or Confirmed booking.
    fn has_active_booking(&self, user_id: UserId, ticket_type_id: TicketTypeId) -> Result<bool, StoreError>;

    /// Insert a new Pending booking. Rejects a second active booking for the
    /// same pair with `Conflict`.
    fn create(&self, booking: Booking) -> Result<(), StoreError>;

    fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// Compare-and-swap status change. At most one of several concurrent
    /// callers with the same `from` succeeds.
    fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Booking, StoreError>;

    /// A user's bookings, newest first.
    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError>;

    /// Bookings currently holding units of a ticket type.
    fn active_for_ticket_type(&self, ticket_type_id: TicketTypeId) -> Result<Vec<Booking>, StoreError>;
}

impl<S> BookingLedger for Arc<S>
where
    S: BookingLedger + ?Sized,
{
    fn has_active_booking(&self, user_id: UserId, ticket_type_id: TicketTypeId) -> Result<bool, StoreError> {
        (**self).has_active_booking(user_id, ticket_type_id)
    }

    fn create(&self, booking: Booking) -> Result<(), StoreError> {
        (**self).create(booking)
    }

    fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        (**self).get(id)
    }

    fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Booking, StoreError> {
        (**self).transition(id, from, to, at)
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError> {
        (**self).list_for_user(user_id)
    }

    fn active_for_ticket_type(&self, ticket_type_id: TicketTypeId) -> Result<Vec<Booking>, StoreError> {
        (**self).active_for_ticket_type(ticket_type_id)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    bookings: HashMap<BookingId, Booking>,
    active: HashMap<(UserId, TicketTypeId), BookingId>,
}

#[derive(Debug, Default)]
pub struct InMemoryBookingLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingLedger for InMemoryBookingLedger {
    fn has_active_booking(&self, user_id: UserId, ticket_type_id: TicketTypeId) -> Result<bool, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned("ledger"))?;
        Ok(state.active.contains_key(&(user_id, ticket_type_id)))
    }

    fn create(&self, booking: Booking) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned("ledger"))?;

        let id = booking.id_typed();
        if state.bookings.contains_key(&id) {
            return Err(StoreError::Conflict(format!("booking {id} already exists")));
        }

        let pair = (booking.user_id(), booking.ticket_type_id());
        if booking.is_holding() {
            if state.active.contains_key(&pair) {
                return Err(StoreError::Conflict("active booking exists for this user and ticket type".to_string()));
            }
            state.active.insert(pair, id);
        }

        state.bookings.insert(id, booking);
        Ok(())
    }

    fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned("ledger"))?;
        Ok(state.bookings.get(&id).cloned())
    }

    fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Booking, StoreError> {
        let mut guard = self.state.write().map_err(|_| StoreError::poisoned("ledger"))?;
        let state = &mut *guard;

        let booking = state.bookings.get_mut(&id).ok_or(StoreError::NotFound("Booking"))?;
        booking.transition(from, to, at)?;

        if !booking.is_holding() {
            let pair = (booking.user_id(), booking.ticket_type_id());
            if state.active.get(&pair) == Some(&id) {
                state.active.remove(&pair);
            }
        }

        Ok(booking.clone())
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned("ledger"))?;

        let mut out: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id() == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id_typed().cmp(&a.id_typed())));
        Ok(out)
    }

    fn active_for_ticket_type(&self, ticket_type_id: TicketTypeId) -> Result<Vec<Booking>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned("ledger"))?;
        Ok(state
            .active
            .iter()
            .filter(|((_, tt), _)| *tt == ticket_type_id)
            .filter_map(|(_, id)| state.bookings.get(id).cloned())
            .collect())
    }
}
