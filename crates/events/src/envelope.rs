use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainEvent;

/// Unit of publication on the bus: a payload plus delivery metadata.
///
/// `event_id` lets idempotent consumers drop redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    payload: E,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Wrap a payload with a fresh UUIDv7 id.
    pub fn wrap(payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: payload.event_type().to_string(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
