//! Infrastructure layer: stores, keyed locks, the listing cache, services,
//! background workers and configuration.

pub mod cache;
pub mod config;
pub mod error;
pub mod locks;
pub mod publisher;
pub mod services;
pub mod stores;
pub mod workers;


pub use cache::{CacheKey, CacheStats, EventCache, FillToken};
pub use config::AppConfig;
pub use error::{ServiceError, StoreError};
pub use locks::{KeyGuard, KeyedLocks};
pub use publisher::{EventPublisher, TicketingBus};
pub use services::{
    BookingService, BookingView, CatalogService, EventDetail, ListingResult, OwedRelease, PaymentResult,
    PaymentService, RefundResult, ReleaseQueue, TicketingServices,
};
