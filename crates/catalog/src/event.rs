use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, Entity, EventId, UserId};

const MAX_TEXT_LEN: usize = 255;

/// Input for publishing a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
}

/// Partial update; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.starts_at.is_none() && self.location.is_none()
    }
}

/// A published event. Ticket types reference it by `EventId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    title: String,
    description: String,
    starts_at: DateTime<Utc>,
    location: String,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Event {
    /// Validate and build a new event. `starts_at` must lie after `now`.
    pub fn create(id: EventId, created_by: UserId, input: NewEvent, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_title(&input.title)?;
        validate_description(&input.description)?;
        validate_location(&input.location)?;
        validate_start(input.starts_at, now)?;

        Ok(Self {
            id,
            title: input.title,
            description: input.description,
            starts_at: input.starts_at,
            location: input.location,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a patch atomically: either every provided field is valid and
    /// written, or nothing changes.
    pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(description) = &patch.description {
            validate_description(description)?;
        }
        if let Some(location) = &patch.location {
            validate_location(location)?;
        }
        if let Some(starts_at) = patch.starts_at {
            validate_start(starts_at, now)?;
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(starts_at) = patch.starts_at {
            self.starts_at = starts_at;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> EventId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    if title.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::validation("title may not exceed 255 characters"));
    }
    Ok(())
}

fn validate_description(description: &str) -> DomainResult<()> {
    if description.trim().is_empty() {
        return Err(DomainError::validation("description cannot be empty"));
    }
    Ok(())
}

fn validate_location(location: &str) -> DomainResult<()> {
    if location.trim().is_empty() {
        return Err(DomainError::validation("location cannot be empty"));
    }
    if location.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::validation("location may not exceed 255 characters"));
    }
    Ok(())
}

fn validate_start(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
    if starts_at <= now {
        return Err(DomainError::validation("date must be in the future"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn new_event(now: DateTime<Utc>) -> NewEvent {
        NewEvent {
            title: "Rust Meetup".to_string(),
            description: "Talks and pizza".to_string(),
            starts_at: now + Duration::days(30),
            location: "Berlin".to_string(),
        }
    }

    #[test]
    fn create_event_keeps_creator() {
        let now = test_time();
        let creator = UserId::new();
        let event = Event::create(EventId::new(), creator, new_event(now), now).unwrap();

        assert_eq!(event.created_by(), creator);
        assert_eq!(event.title(), "Rust Meetup");
        assert_eq!(event.created_at(), now);
    }

    #[test]
    fn create_event_rejects_past_date() {
        let now = test_time();
        let mut input = new_event(now);
        input.starts_at = now - Duration::hours(1);

        let err = Event::create(EventId::new(), UserId::new(), input, now).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_event_rejects_blank_fields() {
        let now = test_time();

        let mut input = new_event(now);
        input.title = "   ".to_string();
        assert!(Event::create(EventId::new(), UserId::new(), input, now).is_err());

        let mut input = new_event(now);
        input.location = "x".repeat(256);
        assert!(Event::create(EventId::new(), UserId::new(), input, now).is_err());
    }

    #[test]
    fn apply_patch_updates_only_given_fields() {
        let now = test_time();
        let mut event = Event::create(EventId::new(), UserId::new(), new_event(now), now).unwrap();

        let later = now + Duration::minutes(5);
        event
            .apply(
                EventPatch {
                    location: Some("Hamburg".to_string()),
                    ..EventPatch::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(event.location(), "Hamburg");
        assert_eq!(event.title(), "Rust Meetup");
        assert_eq!(event.updated_at(), later);
    }

    #[test]
    fn invalid_patch_changes_nothing() {
        let now = test_time();
        let mut event = Event::create(EventId::new(), UserId::new(), new_event(now), now).unwrap();
        let before = event.clone();

        let err = event
            .apply(
                EventPatch {
                    title: Some("New title".to_string()),
                    description: Some(String::new()),
                    ..EventPatch::default()
                },
                now,
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(event, before);
    }
}
