//! Catalog domain module.
//!
//! Events, their listing snapshots and the query/pagination rules applied to
//! them. Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod event;
pub mod listing;

pub use event::{Event, EventPatch, NewEvent};
pub use listing::{DEFAULT_PER_PAGE, EventListing, ListingPage, ListingQuery, PaginationMeta, TicketTypeSummary, paginate};
