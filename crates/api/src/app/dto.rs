use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use boxoffice_catalog::{EventPatch, ListingQuery, NewEvent};
use boxoffice_core::Money;
use boxoffice_inventory::{NewTicketType, TicketTypePatch};
use boxoffice_payments::PaymentOutcome;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(body: CreateEventRequest) -> Self {
        NewEvent {
            title: body.title,
            description: body.description,
            starts_at: body.date,
            location: body.location,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl From<UpdateEventRequest> for EventPatch {
    fn from(body: UpdateEventRequest) -> Self {
        EventPatch {
            title: body.title,
            description: body.description,
            starts_at: body.date,
            location: body.location,
        }
    }
}

/// Prices travel in minor units (cents).
#[derive(Debug, Deserialize)]
pub struct CreateTicketTypeRequest {
    pub name: String,
    pub price: u64,
    pub quantity: u32,
}

impl From<CreateTicketTypeRequest> for NewTicketType {
    fn from(body: CreateTicketTypeRequest) -> Self {
        NewTicketType {
            name: body.name,
            price: Money::from_minor(body.price),
            quantity: body.quantity,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketTypeRequest {
    pub name: Option<String>,
    pub price: Option<u64>,
    pub quantity: Option<u32>,
}

impl From<UpdateTicketTypeRequest> for TicketTypePatch {
    fn from(body: UpdateTicketTypeRequest) -> Self {
        TicketTypePatch {
            name: body.name,
            price: body.price.map(Money::from_minor),
            total_quantity: body.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    /// Forces the simulated gateway outcome.
    pub status: Option<String>,
}

impl PayRequest {
    pub fn forced_outcome(&self) -> Result<Option<PaymentOutcome>, axum::response::Response> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e: boxoffice_core::DomainError| {
                errors::json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", e.to_string())
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ListEventsParams {
    /// Blank filters count as absent so they do not bypass the cache.
    pub fn into_query(self, default_per_page: u32) -> ListingQuery {
        fn present(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        ListingQuery {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(default_per_page),
            search: present(self.search),
            location: present(self.location),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

// -------------------------
// Response envelope
// -------------------------

/// `{ "status": true, "message": ..., "data": ... }`
pub fn ok<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": true,
            "message": message.into(),
            "data": data,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_ignored() {
        let query = ListEventsParams {
            search: Some("   ".to_string()),
            location: Some("".to_string()),
            ..ListEventsParams::default()
        }
        .into_query(15);

        assert!(!query.is_filtered());
        assert_eq!((query.page, query.per_page), (1, 15));
    }

    #[test]
    fn forced_outcome_is_validated() {
        let pay = PayRequest {
            status: Some("refunded".to_string()),
        };
        assert_eq!(pay.forced_outcome().unwrap(), Some(PaymentOutcome::Refunded));

        let bogus = PayRequest {
            status: Some("maybe".to_string()),
        };
        assert_eq!(bogus.forced_outcome().unwrap_err().status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(PayRequest::default().forced_outcome().unwrap(), None);
    }
}
