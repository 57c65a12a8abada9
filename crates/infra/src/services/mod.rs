//! Ticketing orchestration: bookings, payments and the catalog.
//!
//! Services own the cross-store critical sections. Stores only guarantee
//! single-row atomicity; everything spanning two stores happens here under a
//! keyed lock.

pub mod booking;
pub mod catalog;
pub mod payment;
pub mod releases;

use std::sync::Arc;

use boxoffice_core::{BookingId, Clock};
use boxoffice_payments::PaymentProcessor;

use crate::cache::EventCache;
use crate::config::AppConfig;
use crate::locks::KeyedLocks;
use crate::publisher::{EventPublisher, TicketingBus};
use crate::stores::{
    BookingLedger, CatalogStore, InMemoryBookingLedger, InMemoryCatalogStore, InMemoryInventoryStore,
    InMemoryPaymentStore, InventoryStore, PaymentStore,
};

pub use booking::{BookingService, BookingView};
pub use catalog::{CatalogService, EventDetail, ListingCache, ListingResult};
pub use payment::{PaymentResult, PaymentService, RefundResult};
pub use releases::{OwedRelease, ReleaseQueue};

/// Every service wired over one set of stores.
pub struct TicketingServices {
    pub bookings: BookingService,
    pub payments: PaymentService,
    pub catalog: CatalogService,
    pub inventory: Arc<dyn InventoryStore>,
    pub ledger: Arc<dyn BookingLedger>,
    pub payment_store: Arc<dyn PaymentStore>,
    /// Releases still owed after a committed cancellation.
    pub releases: Arc<ReleaseQueue>,
    pub bus: Arc<TicketingBus>,
}

impl TicketingServices {
    /// In-memory stores, process-local locks and the given bus.
    pub fn in_memory(
        config: &AppConfig,
        processor: Arc<dyn PaymentProcessor>,
        clock: Arc<dyn Clock>,
        bus: Arc<TicketingBus>,
    ) -> Self {
        Self::with_inventory(config, Arc::new(InMemoryInventoryStore::new()), processor, clock, bus)
    }

    /// In-memory stores around a caller-supplied inventory.
    pub fn with_inventory(
        config: &AppConfig,
        inventory: Arc<dyn InventoryStore>,
        processor: Arc<dyn PaymentProcessor>,
        clock: Arc<dyn Clock>,
        bus: Arc<TicketingBus>,
    ) -> Self {
        let ledger: Arc<dyn BookingLedger> = Arc::new(InMemoryBookingLedger::new());
        let payment_store: Arc<dyn PaymentStore> = Arc::new(InMemoryPaymentStore::new());
        let catalog_store: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::new());

        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let booking_locks = Arc::new(KeyedLocks::<BookingId>::new("booking", config.lock_timeout));
        let releases = Arc::new(ReleaseQueue::new(inventory.clone()));
        let cache = Arc::new(EventCache::new(clock.clone(), config.cache_ttl()));

        let bookings = BookingService::new(
            inventory.clone(),
            ledger.clone(),
            payment_store.clone(),
            releases.clone(),
            booking_locks.clone(),
            publisher.clone(),
            clock.clone(),
            config.lock_timeout,
        );
        let payments = PaymentService::new(
            inventory.clone(),
            ledger.clone(),
            payment_store.clone(),
            releases.clone(),
            processor,
            booking_locks,
            publisher.clone(),
            clock.clone(),
        );
        let catalog = CatalogService::new(
            catalog_store,
            inventory.clone(),
            cache,
            publisher,
            clock,
            config.max_page_size,
        );

        Self {
            bookings,
            payments,
            catalog,
            inventory,
            ledger,
            payment_store,
            releases,
            bus,
        }
    }
}
