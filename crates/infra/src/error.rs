//! Store- and service-level error taxonomy.

use thiserror::Error;

use boxoffice_core::DomainError;

/// Failure inside a store.
///
/// `Unavailable` and `Timeout` are the infrastructure class: the caller may
/// retry, and no partial state was written. Everything else is a value the
/// service layer translates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StoreError {
    pub(crate) fn poisoned(what: &str) -> Self {
        StoreError::Unavailable(format!("{what} lock poisoned"))
    }
}

/// Service-level failure, one variant per user-visible outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("Not enough tickets available.")]
    InsufficientInventory { requested: u32, remaining: u32 },

    #[error("You have already booked tickets for this event.")]
    DuplicateBooking,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You are not authorized to perform this action")]
    Forbidden,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Payment already exists for this booking")]
    DuplicatePayment,

    #[error("Payment is already refunded.")]
    AlreadyRefunded,

    #[error("Cannot refund a failed payment.")]
    CannotRefundFailed,

    /// Lost a race on a status change.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl ServiceError {
    /// Only storage failures are retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(StoreError::Unavailable(_) | StoreError::Timeout(_))
        )
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::Conflict(msg),
            DomainError::InsufficientInventory { requested, remaining } => {
                ServiceError::InsufficientInventory { requested, remaining }
            }
            DomainError::InvalidTransition { from, to } => ServiceError::InvalidTransition { from, to },
            DomainError::NotFound => ServiceError::NotFound("Resource"),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            DomainError::Forbidden => ServiceError::Forbidden,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Domain(err) => err.into(),
            other => ServiceError::Storage(other),
        }
    }
}
