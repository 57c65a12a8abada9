//! Published events, keyed by id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use boxoffice_catalog::Event;
use boxoffice_core::EventId;

use crate::error::StoreError;

/// Published events.
pub trait CatalogStore: Send + Sync {
    fn insert(&self, event: Event) -> Result<(), StoreError>;

    fn get(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// Replace an existing event.
    fn save(&self, event: Event) -> Result<(), StoreError>;

    fn remove(&self, id: EventId) -> Result<Event, StoreError>;

    /// All events, latest `starts_at` first.
    fn list(&self) -> Result<Vec<Event>, StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn insert(&self, event: Event) -> Result<(), StoreError> {
        (**self).insert(event)
    }

    fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        (**self).get(id)
    }

    fn save(&self, event: Event) -> Result<(), StoreError> {
        (**self).save(event)
    }

    fn remove(&self, id: EventId) -> Result<Event, StoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<Event>, StoreError> {
        (**self).list()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn insert(&self, event: Event) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(|_| StoreError::poisoned("catalog"))?;
        let id = event.id_typed();
        if events.contains_key(&id) {
            return Err(StoreError::Conflict(format!("event {id} already exists")));
        }
        events.insert(id, event);
        Ok(())
    }

    fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let events = self.events.read().map_err(|_| StoreError::poisoned("catalog"))?;
        Ok(events.get(&id).cloned())
    }

    fn save(&self, event: Event) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(|_| StoreError::poisoned("catalog"))?;
        match events.get_mut(&event.id_typed()) {
            Some(slot) => {
                *slot = event;
                Ok(())
            }
            None => Err(StoreError::NotFound("Event")),
        }
    }

    fn remove(&self, id: EventId) -> Result<Event, StoreError> {
        let mut events = self.events.write().map_err(|_| StoreError::poisoned("catalog"))?;
        events.remove(&id).ok_or(StoreError::NotFound("Event"))
    }

    fn list(&self) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().map_err(|_| StoreError::poisoned("catalog"))?;
        let mut out: Vec<Event> = events.values().cloned().collect();
        out.sort_by(|a, b| {
            b.starts_at()
                .cmp(&a.starts_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_catalog::NewEvent;
    use boxoffice_core::UserId;
    use chrono::{Duration, Utc};

    fn event_in(days: i64) -> Event {
        let now = Utc::now();
        Event::create(
            EventId::new(),
            UserId::new(),
            NewEvent {
                title: format!("Show in {days} days"),
                description: "desc".to_string(),
                starts_at: now + Duration::days(days),
                location: "Lisbon".to_string(),
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn list_orders_latest_first() {
        let store = InMemoryCatalogStore::new();
        let soon = event_in(1);
        let later = event_in(10);
        store.insert(soon.clone()).unwrap();
        store.insert(later.clone()).unwrap();

        let ids: Vec<_> = store.list().unwrap().iter().map(|e| e.id_typed()).collect();
        assert_eq!(ids, vec![later.id_typed(), soon.id_typed()]);
    }

    #[test]
    fn save_requires_existing_event() {
        let store = InMemoryCatalogStore::new();
        assert_eq!(store.save(event_in(3)), Err(StoreError::NotFound("Event")));
    }
}
