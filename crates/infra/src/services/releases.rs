//! Inventory releases owed after a committed cancellation.
//!
//! Once a booking has left its holding state the release is no longer
//! optional. A release that still fails after one retry is queued here and
//! settled later, instead of leaving the units held by a cancelled booking.

use std::sync::{Arc, Mutex};

use boxoffice_core::{BookingId, TicketTypeId};

use crate::error::StoreError;
use crate::stores::InventoryStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OwedRelease {
    /// `None` for a reservation undone before its booking was recorded.
    pub booking_id: Option<BookingId>,
    pub ticket_type_id: TicketTypeId,
    pub quantity: u32,
}

pub struct ReleaseQueue {
    inventory: Arc<dyn InventoryStore>,
    owed: Mutex<Vec<OwedRelease>>,
}

impl ReleaseQueue {
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self {
            inventory,
            owed: Mutex::new(Vec::new()),
        }
    }

    /// Release now, retrying once. On a second failure the release is queued
    /// and the error returned; the units are still owed, never dropped.
    pub fn release(&self, owed: OwedRelease) -> Result<(), StoreError> {
        self.settle();

        let first = match self.inventory.release(owed.ticket_type_id, owed.quantity) {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        tracing::warn!(ticket_type_id = %owed.ticket_type_id, error = %first, "release failed, retrying");

        match self.inventory.release(owed.ticket_type_id, owed.quantity) {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(
                    booking_id = ?owed.booking_id,
                    ticket_type_id = %owed.ticket_type_id,
                    quantity = owed.quantity,
                    error = %err,
                    "release queued for settlement"
                );
                self.lock_owed().push(owed);
                Err(err)
            }
        }
    }

    /// Retry every queued release. Returns how many settled.
    pub fn settle(&self) -> usize {
        let queued = std::mem::take(&mut *self.lock_owed());
        if queued.is_empty() {
            return 0;
        }

        let mut settled = 0;
        let mut still_owed = Vec::new();
        for owed in queued {
            match self.inventory.release(owed.ticket_type_id, owed.quantity) {
                Ok(_) => settled += 1,
                Err(err) => {
                    tracing::debug!(ticket_type_id = %owed.ticket_type_id, error = %err, "release still owed");
                    still_owed.push(owed);
                }
            }
        }

        if settled > 0 {
            tracing::info!(settled, remaining = still_owed.len(), "owed releases settled");
        }
        self.lock_owed().extend(still_owed);
        settled
    }

    pub fn owed(&self) -> Vec<OwedRelease> {
        self.lock_owed().clone()
    }

    // A queued release must survive a panic elsewhere, so poison is ignored.
    fn lock_owed(&self) -> std::sync::MutexGuard<'_, Vec<OwedRelease>> {
        self.owed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod flaky {
    use std::sync::atomic::{AtomicU32, Ordering};

    use boxoffice_core::{DomainResult, EventId};
    use boxoffice_inventory::{ReleaseReport, TicketType};

    use super::*;
    use crate::stores::InMemoryInventoryStore;

    /// Inventory whose next `failures` releases fail as unavailable.
    #[derive(Default)]
    pub(crate) struct FlakyInventory {
        pub(crate) inner: InMemoryInventoryStore,
        failures: AtomicU32,
    }

    impl FlakyInventory {
        pub(crate) fn fail_next_releases(&self, count: u32) {
            self.failures.store(count, Ordering::SeqCst);
        }
    }

    impl InventoryStore for FlakyInventory {
        fn insert(&self, ticket_type: TicketType) -> Result<(), StoreError> {
            self.inner.insert(ticket_type)
        }

        fn get(&self, id: TicketTypeId) -> Result<Option<TicketType>, StoreError> {
            self.inner.get(id)
        }

        fn list_for_event(&self, event_id: EventId) -> Result<Vec<TicketType>, StoreError> {
            self.inner.list_for_event(event_id)
        }

        fn reserve(&self, id: TicketTypeId, quantity: u32) -> Result<u32, StoreError> {
            self.inner.reserve(id, quantity)
        }

        fn release(&self, id: TicketTypeId, quantity: u32) -> Result<ReleaseReport, StoreError> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(StoreError::Unavailable("inventory row lock poisoned".to_string()));
            }
            self.inner.release(id, quantity)
        }

        fn update(
            &self,
            id: TicketTypeId,
            change: &mut dyn FnMut(&mut TicketType) -> DomainResult<()>,
        ) -> Result<TicketType, StoreError> {
            self.inner.update(id, change)
        }

        fn remove(&self, id: TicketTypeId) -> Result<TicketType, StoreError> {
            self.inner.remove(id)
        }

        fn remove_for_event(&self, event_id: EventId) -> Result<usize, StoreError> {
            self.inner.remove_for_event(event_id)
        }
    }
}
