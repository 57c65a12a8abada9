use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{BookingId, DomainError, DomainResult, Entity, TicketTypeId, UserId};

/// Booking status lifecycle.
///
/// ```text
/// Pending ──► Confirmed
///    │            │
///    └──► Cancelled ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Pending and Confirmed bookings hold inventory.
    pub fn is_holding(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        matches!(
            (self, to),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's claim on `quantity` units of one ticket type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    user_id: UserId,
    ticket_type_id: TicketTypeId,
    quantity: u32,
    status: BookingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Booking {
    /// Start a new booking in `Pending`.
    pub fn pending(
        id: BookingId,
        user_id: UserId,
        ticket_type_id: TicketTypeId,
        quantity: u32,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        Ok(Self {
            id,
            user_id,
            ticket_type_id,
            quantity,
            status: BookingStatus::Pending,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn id_typed(&self) -> BookingId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn ticket_type_id(&self) -> TicketTypeId {
        self.ticket_type_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_holding(&self) -> bool {
        self.status.is_holding()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Compare-and-swap on the status.
    ///
    /// Fails with `InvalidTransition` when the current status is not `from`, or
    /// when `from -> to` is not an edge of the lifecycle.
    pub fn transition(&mut self, from: BookingStatus, to: BookingStatus, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != from || !from.can_transition_to(to) {
            return Err(DomainError::invalid_transition(self.status, to));
        }

        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}

impl Entity for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
