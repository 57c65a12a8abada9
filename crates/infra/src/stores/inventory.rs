//! Ticket type inventory with per-row locking.
//!
//! The map lock only guards membership. Quantity changes take the row's own
//! mutex, so reservations on different ticket types never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use boxoffice_core::{DomainError, DomainResult, EventId, TicketTypeId};
use boxoffice_inventory::{ReleaseReport, TicketType};

use crate::error::StoreError;

pub trait InventoryStore: Send + Sync {
    fn insert(&self, ticket_type: TicketType) -> Result<(), StoreError>;

    fn get(&self, id: TicketTypeId) -> Result<Option<TicketType>, StoreError>;

    /// Ticket types of one event, oldest first.
    fn list_for_event(&self, event_id: EventId) -> Result<Vec<TicketType>, StoreError>;

    /// Check `remaining >= quantity` and decrement in one step. Returns the
    /// remaining quantity afterwards.
    fn reserve(&self, id: TicketTypeId, quantity: u32) -> Result<u32, StoreError>;

    /// Return units to the pool, capped at the total.
    fn release(&self, id: TicketTypeId, quantity: u32) -> Result<ReleaseReport, StoreError>;

    /// Apply `change` to a copy and commit only if it succeeds.
    fn update(
        &self,
        id: TicketTypeId,
        change: &mut dyn FnMut(&mut TicketType) -> DomainResult<()>,
    ) -> Result<TicketType, StoreError>;

    /// Remove a ticket type that holds no units.
    fn remove(&self, id: TicketTypeId) -> Result<TicketType, StoreError>;

    /// Remove every ticket type of an event, or none if any of them holds units.
    fn remove_for_event(&self, event_id: EventId) -> Result<usize, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn insert(&self, ticket_type: TicketType) -> Result<(), StoreError> {
        (**self).insert(ticket_type)
    }

    fn get(&self, id: TicketTypeId) -> Result<Option<TicketType>, StoreError> {
        (**self).get(id)
    }

    fn list_for_event(&self, event_id: EventId) -> Result<Vec<TicketType>, StoreError> {
        (**self).list_for_event(event_id)
    }

    fn reserve(&self, id: TicketTypeId, quantity: u32) -> Result<u32, StoreError> {
        (**self).reserve(id, quantity)
    }

    fn release(&self, id: TicketTypeId, quantity: u32) -> Result<ReleaseReport, StoreError> {
        (**self).release(id, quantity)
    }

    fn update(
        &self,
        id: TicketTypeId,
        change: &mut dyn FnMut(&mut TicketType) -> DomainResult<()>,
    ) -> Result<TicketType, StoreError> {
        (**self).update(id, change)
    }

    fn remove(&self, id: TicketTypeId) -> Result<TicketType, StoreError> {
        (**self).remove(id)
    }

    fn remove_for_event(&self, event_id: EventId) -> Result<usize, StoreError> {
        (**self).remove_for_event(event_id)
    }
}

#[derive(Debug)]
struct Row {
    ticket_type: TicketType,
    /// Set when the row leaves the map; late lockers must treat it as gone.
    retired: bool,
}

type RowHandle = Arc<Mutex<Row>>;

#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    rows: RwLock<HashMap<TicketTypeId, RowHandle>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, id: TicketTypeId) -> Result<RowHandle, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned("inventory"))?;
        rows.get(&id).cloned().ok_or(StoreError::NotFound("Ticket type"))
    }

    fn with_row<T>(
        &self,
        id: TicketTypeId,
        f: impl FnOnce(&mut TicketType) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let handle = self.row(id)?;
        let mut row = handle.lock().map_err(|_| StoreError::poisoned("ticket type row"))?;
        if row.retired {
            return Err(StoreError::NotFound("Ticket type"));
        }
        f(&mut row.ticket_type)
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn insert(&self, ticket_type: TicketType) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned("inventory"))?;
        let id = ticket_type.id_typed();
        if rows.contains_key(&id) {
            return Err(StoreError::Conflict(format!("ticket type {id} already exists")));
        }

        rows.insert(
            id,
            Arc::new(Mutex::new(Row {
                ticket_type,
                retired: false,
            })),
        );
        Ok(())
    }

    fn get(&self, id: TicketTypeId) -> Result<Option<TicketType>, StoreError> {
        match self.with_row(id, |tt| Ok(tt.clone())) {
            Ok(tt) => Ok(Some(tt)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn list_for_event(&self, event_id: EventId) -> Result<Vec<TicketType>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::poisoned("inventory"))?;

        let mut out = Vec::new();
        for handle in rows.values() {
            let row = handle.lock().map_err(|_| StoreError::poisoned("ticket type row"))?;
            if !row.retired && row.ticket_type.event_id() == event_id {
                out.push(row.ticket_type.clone());
            }
        }

        out.sort_by_key(|tt| tt.id_typed());
        Ok(out)
    }

    fn reserve(&self, id: TicketTypeId, quantity: u32) -> Result<u32, StoreError> {
        self.with_row(id, |tt| {
            tt.reserve(quantity)?;
            Ok(tt.remaining_quantity())
        })
    }

    fn release(&self, id: TicketTypeId, quantity: u32) -> Result<ReleaseReport, StoreError> {
        let report = self.with_row(id, |tt| Ok(tt.release(quantity)))?;
        if report.excess > 0 {
            tracing::error!(
                ticket_type_id = %id,
                requested = quantity,
                excess = report.excess,
                "release exceeded held units; remaining capped at total"
            );
        }
        Ok(report)
    }

    fn update(
        &self,
        id: TicketTypeId,
        change: &mut dyn FnMut(&mut TicketType) -> DomainResult<()>,
    ) -> Result<TicketType, StoreError> {
        self.with_row(id, |tt| {
            let mut draft = tt.clone();
            change(&mut draft)?;
            *tt = draft;
            Ok(tt.clone())
        })
    }

    fn remove(&self, id: TicketTypeId) -> Result<TicketType, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned("inventory"))?;
        let handle = rows.get(&id).cloned().ok_or(StoreError::NotFound("Ticket type"))?;

        let mut row = handle.lock().map_err(|_| StoreError::poisoned("ticket type row"))?;
        let held = row.ticket_type.held();
        if held > 0 {
            return Err(DomainError::conflict(format!(
                "ticket type still has {held} units held by bookings"
            ))
            .into());
        }

        row.retired = true;
        let removed = row.ticket_type.clone();
        drop(row);
        rows.remove(&id);
        Ok(removed)
    }

    fn remove_for_event(&self, event_id: EventId) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::poisoned("inventory"))?;

        let mut doomed = Vec::new();
        for (id, handle) in rows.iter() {
            let row = handle.lock().map_err(|_| StoreError::poisoned("ticket type row"))?;
            if row.ticket_type.event_id() != event_id {
                continue;
            }
            if row.ticket_type.held() > 0 {
                return Err(DomainError::conflict("event has ticket types with active bookings").into());
            }
            doomed.push(*id);
        }

        for id in &doomed {
            if let Some(handle) = rows.remove(id) {
                if let Ok(mut row) = handle.lock() {
                    row.retired = true;
                }
            }
        }

        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use boxoffice_core::Money;

    fn seeded(total: u32) -> (InMemoryInventoryStore, TicketTypeId, EventId) {
        let store = InMemoryInventoryStore::new();
        let event_id = EventId::new();
        let id = TicketTypeId::new();
        store
            .insert(TicketType::new(id, event_id, "GA", Money::from_minor(5_000), total).unwrap())
            .unwrap();
        (store, id, event_id)
    }

    #[test]
    fn reserve_and_release_round_trip() {
        let (store, id, _) = seeded(10);
        assert_eq!(store.reserve(id, 2).unwrap(), 8);

        let report = store.release(id, 2).unwrap();
        assert_eq!(report.excess, 0);
        assert_eq!(store.get(id).unwrap().unwrap().remaining_quantity(), 10);
    }

    #[test]
    fn reserve_unknown_ticket_type_is_not_found() {
        let store = InMemoryInventoryStore::new();
        assert_eq!(
            store.reserve(TicketTypeId::new(), 1),
            Err(StoreError::NotFound("Ticket type"))
        );
    }

    #[test]
    fn over_reserve_has_no_side_effect() {
        let (store, id, _) = seeded(5);
        store.reserve(id, 3).unwrap();

        let err = store.reserve(id, 3).unwrap_err();
        assert_eq!(
            err,
            StoreError::Domain(DomainError::InsufficientInventory {
                requested: 3,
                remaining: 2
            })
        );
        assert_eq!(store.get(id).unwrap().unwrap().remaining_quantity(), 2);
    }

    #[test]
    fn concurrent_reserves_never_oversell() {
        let (store, id, _) = seeded(25);
        let store = Arc::new(store);

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.reserve(id, 1).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 25);
        assert_eq!(store.get(id).unwrap().unwrap().remaining_quantity(), 0);
    }

    #[test]
    fn failed_update_leaves_row_untouched() {
        let (store, id, _) = seeded(10);
        store.reserve(id, 4).unwrap();

        let err = store.update(id, &mut |tt| tt.resize(2)).unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));

        let tt = store.get(id).unwrap().unwrap();
        assert_eq!((tt.total_quantity(), tt.remaining_quantity()), (10, 6));
    }

    #[test]
    fn remove_is_rejected_while_units_are_held() {
        let (store, id, event_id) = seeded(10);
        store.reserve(id, 1).unwrap();

        assert!(store.remove(id).is_err());
        assert!(store.remove_for_event(event_id).is_err());

        store.release(id, 1).unwrap();
        assert_eq!(store.remove_for_event(event_id).unwrap(), 1);
        assert!(store.get(id).unwrap().is_none());
        assert_eq!(store.reserve(id, 1), Err(StoreError::NotFound("Ticket type")));
    }
}
