//! Inventory domain module.
//!
//! This crate contains business rules for ticket inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Locking and
//! linearizability live in `boxoffice-infra`.

pub mod ticket_type;

pub use ticket_type::{NewTicketType, ReleaseReport, TicketType, TicketTypePatch};
