//! Event listing queries and pagination.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{EventId, Money, TicketTypeId, UserId};
use boxoffice_inventory::TicketType;

use crate::event::Event;

pub const DEFAULT_PER_PAGE: u32 = 15;

/// Listing request: a page window plus optional filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub location: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            location: None,
            date_from: None,
            date_to: None,
        }
    }
}

impl ListingQuery {
    /// Unfiltered window.
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }

    /// Any filter present. Filtered listings never touch the cache.
    pub fn is_filtered(&self) -> bool {
        self.search.is_some() || self.location.is_some() || self.date_from.is_some() || self.date_to.is_some()
    }

    /// Clamp the window: `page >= 1`, `1 <= per_page <= max_per_page`.
    pub fn clamped(mut self, max_per_page: u32) -> Self {
        self.page = self.page.max(1);
        self.per_page = self.per_page.clamp(1, max_per_page.max(1));
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let hit = event.title().to_lowercase().contains(&needle)
                || event.description().to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }

        if let Some(location) = &self.location {
            if event.location() != location {
                return false;
            }
        }

        let day = event.starts_at().date_naive();
        if let Some(from) = self.date_from {
            if day < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if day > to {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub count: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Cut one page out of an already ordered result set.
///
/// Pages past the end come back empty with correct totals.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> ListingPage<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let last_page = total.div_ceil(u64::from(per_page)).max(1) as u32;

    let skip = (u64::from(page) - 1) * u64::from(per_page);
    let items: Vec<T> = items
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(per_page as usize)
        .collect();

    ListingPage {
        pagination: PaginationMeta {
            total,
            count: items.len() as u64,
            per_page,
            current_page: page,
            last_page,
        },
        items,
    }
}

/// Ticket type fields embedded in a listing.
///
/// Remaining quantity is left out: bookings do not invalidate listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeSummary {
    pub id: TicketTypeId,
    pub name: String,
    pub price: Money,
    pub total_quantity: u32,
}

impl From<&TicketType> for TicketTypeSummary {
    fn from(tt: &TicketType) -> Self {
        Self {
            id: tt.id_typed(),
            name: tt.name().to_string(),
            price: tt.price(),
            total_quantity: tt.total_quantity(),
        }
    }
}

/// Snapshot of an event as served by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListing {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub created_by: UserId,
    pub tickets: Vec<TicketTypeSummary>,
}

impl EventListing {
    pub fn new(event: &Event, tickets: Vec<TicketTypeSummary>) -> Self {
        Self {
            id: event.id_typed(),
            title: event.title().to_string(),
            description: event.description().to_string(),
            starts_at: event.starts_at(),
            location: event.location().to_string(),
            created_by: event.created_by(),
            tickets,
        }
    }
}
