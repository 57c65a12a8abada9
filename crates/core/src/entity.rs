//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Ticket types, bookings and payments are entities: their state moves through
/// transitions, but they are always addressed by the same identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
