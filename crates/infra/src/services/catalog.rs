//! Event and ticket type management, plus the cached listing read path.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use boxoffice_auth::{Principal, ensure_owner_or_admin};
use boxoffice_catalog::{Event, EventListing, EventPatch, ListingPage, ListingQuery, NewEvent, TicketTypeSummary, paginate};
use boxoffice_core::{Clock, EventId, TicketTypeId};
use boxoffice_events::{CatalogChange, CatalogChanged, TicketingEvent};
use boxoffice_inventory::{NewTicketType, TicketType, TicketTypePatch};

use crate::cache::{CacheKey, EventCache};
use crate::error::{ServiceError, StoreError};
use crate::publisher::EventPublisher;
use crate::stores::{CatalogStore, InventoryStore};

pub type ListingCache = EventCache<ListingPage<EventListing>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetail {
    pub event: Event,
    pub tickets: Vec<TicketType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingResult {
    pub page: ListingPage<EventListing>,
    /// Served from the listing cache.
    pub cached: bool,
}

pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    inventory: Arc<dyn InventoryStore>,
    cache: Arc<ListingCache>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    max_per_page: u32,
    /// Serializes catalog mutations, so an ownership check and the write it
    /// guards see the same event.
    writes: Mutex<()>,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        inventory: Arc<dyn InventoryStore>,
        cache: Arc<ListingCache>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        max_per_page: u32,
    ) -> Self {
        Self {
            catalog,
            inventory,
            cache,
            publisher,
            clock,
            max_per_page,
            writes: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    #[tracing::instrument(skip(self, input), fields(user_id = %actor.user_id))]
    pub fn create_event(&self, actor: &Principal, input: NewEvent) -> Result<Event, ServiceError> {
        let _writes = self.write_guard()?;
        let event = Event::create(EventId::new(), actor.user_id, input, self.clock.now())?;
        self.catalog.insert(event.clone())?;

        tracing::info!(event_id = %event.id_typed(), "event created");
        self.catalog_changed(CatalogChange::EventCreated, event.id_typed());
        Ok(event)
    }

    #[tracing::instrument(skip(self, patch), fields(user_id = %actor.user_id, event_id = %event_id))]
    pub fn update_event(&self, actor: &Principal, event_id: EventId, patch: EventPatch) -> Result<Event, ServiceError> {
        let _writes = self.write_guard()?;
        let mut event = self.owned_event(actor, event_id)?;
        event.apply(patch, self.clock.now())?;
        self.catalog.save(event.clone())?;

        tracing::info!("event updated");
        self.catalog_changed(CatalogChange::EventUpdated, event_id);
        Ok(event)
    }

    /// Delete an event and its ticket types. Rejected while any unit is held.
    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id, event_id = %event_id))]
    pub fn delete_event(&self, actor: &Principal, event_id: EventId) -> Result<(), ServiceError> {
        let _writes = self.write_guard()?;
        self.owned_event(actor, event_id)?;

        let removed = self.inventory.remove_for_event(event_id)?;
        self.catalog.remove(event_id)?;

        tracing::info!(ticket_types = removed, "event deleted");
        self.catalog_changed(CatalogChange::EventDeleted, event_id);
        Ok(())
    }

    pub fn get_event(&self, event_id: EventId) -> Result<EventDetail, ServiceError> {
        let event = self.catalog.get(event_id)?.ok_or(ServiceError::NotFound("Event"))?;
        let tickets = self.inventory.list_for_event(event_id)?;
        Ok(EventDetail { event, tickets })
    }

    /// Paginated listing, latest event first.
    ///
    /// Unfiltered windows are read through the cache; filtered queries always
    /// go to the store.
    pub fn list_events(&self, query: ListingQuery) -> Result<ListingResult, ServiceError> {
        let query = query.clamped(self.max_per_page);

        if query.is_filtered() {
            return Ok(ListingResult {
                page: self.build_listing(&query)?,
                cached: false,
            });
        }

        let key = CacheKey {
            page: query.page,
            per_page: query.per_page,
        };
        if let Some(page) = self.cache.get(key) {
            return Ok(ListingResult { page, cached: true });
        }

        // Taken before the read so a concurrent invalidation wins.
        let token = self.cache.fill_token();
        let page = self.build_listing(&query)?;
        self.cache.put(key, page.clone(), token);

        Ok(ListingResult { page, cached: false })
    }

    #[tracing::instrument(skip(self, input), fields(user_id = %actor.user_id, event_id = %event_id))]
    pub fn create_ticket_type(
        &self,
        actor: &Principal,
        event_id: EventId,
        input: NewTicketType,
    ) -> Result<TicketType, ServiceError> {
        let _writes = self.write_guard()?;
        self.owned_event(actor, event_id)?;

        let ticket_type = TicketType::from_input(TicketTypeId::new(), event_id, input)?;
        self.inventory.insert(ticket_type.clone())?;

        tracing::info!(
            ticket_type_id = %ticket_type.id_typed(),
            quantity = ticket_type.total_quantity(),
            "ticket type created"
        );
        self.catalog_changed(CatalogChange::TicketTypeCreated, event_id);
        Ok(ticket_type)
    }

    /// A new total must cover every held unit; remaining becomes `total - held`.
    #[tracing::instrument(skip(self, patch), fields(user_id = %actor.user_id, ticket_type_id = %ticket_type_id))]
    pub fn update_ticket_type(
        &self,
        actor: &Principal,
        ticket_type_id: TicketTypeId,
        patch: TicketTypePatch,
    ) -> Result<TicketType, ServiceError> {
        let _writes = self.write_guard()?;
        let event_id = self.owned_ticket_type(actor, ticket_type_id)?;

        let updated = self
            .inventory
            .update(ticket_type_id, &mut |ticket_type| ticket_type.apply(patch.clone()))?;

        tracing::info!(
            total = updated.total_quantity(),
            remaining = updated.remaining_quantity(),
            "ticket type updated"
        );
        self.catalog_changed(CatalogChange::TicketTypeUpdated, event_id);
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(user_id = %actor.user_id, ticket_type_id = %ticket_type_id))]
    pub fn delete_ticket_type(&self, actor: &Principal, ticket_type_id: TicketTypeId) -> Result<(), ServiceError> {
        let _writes = self.write_guard()?;
        let event_id = self.owned_ticket_type(actor, ticket_type_id)?;
        self.inventory.remove(ticket_type_id)?;

        tracing::info!("ticket type deleted");
        self.catalog_changed(CatalogChange::TicketTypeDeleted, event_id);
        Ok(())
    }

    fn build_listing(&self, query: &ListingQuery) -> Result<ListingPage<EventListing>, ServiceError> {
        let events: Vec<Event> = self
            .catalog
            .list()?
            .into_iter()
            .filter(|event| query.matches(event))
            .collect();

        let page = paginate(events, query.page, query.per_page);
        let mut items = Vec::with_capacity(page.items.len());
        for event in &page.items {
            let tickets = self
                .inventory
                .list_for_event(event.id_typed())?
                .iter()
                .map(TicketTypeSummary::from)
                .collect();
            items.push(EventListing::new(event, tickets));
        }

        Ok(ListingPage {
            items,
            pagination: page.pagination,
        })
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, ServiceError> {
        self.writes
            .lock()
            .map_err(|_| ServiceError::Storage(StoreError::poisoned("catalog writes")))
    }

    fn owned_event(&self, actor: &Principal, event_id: EventId) -> Result<Event, ServiceError> {
        let event = self.catalog.get(event_id)?.ok_or(ServiceError::NotFound("Event"))?;
        ensure_owner_or_admin(actor, event.created_by()).map_err(|_| {
            tracing::warn!("catalog change attempted by non-owner");
            ServiceError::Forbidden
        })?;
        Ok(event)
    }

    fn owned_ticket_type(&self, actor: &Principal, ticket_type_id: TicketTypeId) -> Result<EventId, ServiceError> {
        let ticket_type = self
            .inventory
            .get(ticket_type_id)?
            .ok_or(ServiceError::NotFound("Ticket type"))?;
        self.owned_event(actor, ticket_type.event_id())?;
        Ok(ticket_type.event_id())
    }

    /// Clear the listing cache before the mutation's response goes out.
    fn catalog_changed(&self, change: CatalogChange, event_id: EventId) {
        self.cache.invalidate_all();
        self.publisher.emit(TicketingEvent::CatalogChanged(CatalogChanged {
            change,
            event_id,
            occurred_at: self.clock.now(),
        }));
    }
}
