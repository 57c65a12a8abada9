//! Storage boundaries and their in-memory implementations.
//!
//! Each store is a trait with an `impl for Arc<S>` so services can hold
//! `Arc<dyn Store>` and tests can keep a second handle for inspection.

pub mod catalog;
pub mod inventory;
pub mod ledger;
pub mod payments;

pub use catalog::{CatalogStore, InMemoryCatalogStore};
pub use inventory::{InMemoryInventoryStore, InventoryStore};
pub use ledger::{BookingLedger, InMemoryBookingLedger};
pub use payments::{InMemoryPaymentStore, PaymentStore};
