use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{BookingId, DomainError, DomainResult, Entity, Money, PaymentId};

use crate::processor::PaymentOutcome;

/// Payment status lifecycle.
///
/// `Success -> Refunded` is the only transition after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PaymentOutcome> for PaymentStatus {
    fn from(outcome: PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Success => PaymentStatus::Success,
            PaymentOutcome::Failed => PaymentStatus::Failed,
            PaymentOutcome::Refunded => PaymentStatus::Refunded,
        }
    }
}

/// The single payment attempt recorded for a booking.
///
/// `amount` is fixed at creation; later price changes never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    booking_id: BookingId,
    amount: Money,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn record(
        id: PaymentId,
        booking_id: BookingId,
        amount: Money,
        outcome: PaymentOutcome,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            booking_id,
            amount,
            status: outcome.into(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn booking_id(&self) -> BookingId {
        self.booking_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Success
    }

    pub fn is_refunded(&self) -> bool {
        self.status == PaymentStatus::Refunded
    }

    pub fn is_failed(&self) -> bool {
        self.status == PaymentStatus::Failed
    }

    /// `Success -> Refunded`. Any other starting status is an invalid transition.
    pub fn mark_refunded(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != PaymentStatus::Success {
            return Err(DomainError::invalid_transition(self.status, PaymentStatus::Refunded));
        }

        self.status = PaymentStatus::Refunded;
        self.updated_at = at;
        Ok(())
    }

    pub fn details(&self) -> PaymentDetails {
        PaymentDetails {
            id: self.id,
            booking_id: self.booking_id,
            amount: self.amount,
            status: self.status,
            is_successful: self.is_successful(),
            is_refunded: self.is_refunded(),
            is_failed: self.is_failed(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Read-only view of a payment with its status flags spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub is_successful: bool,
    pub is_refunded: bool,
    pub is_failed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(outcome: PaymentOutcome) -> Payment {
        Payment::record(
            PaymentId::new(),
            BookingId::new(),
            Money::from_minor(10_000),
            outcome,
            Utc::now(),
        )
    }

    #[test]
    fn record_takes_status_from_outcome() {
        assert_eq!(payment(PaymentOutcome::Success).status(), PaymentStatus::Success);
        assert_eq!(payment(PaymentOutcome::Failed).status(), PaymentStatus::Failed);
        assert_eq!(payment(PaymentOutcome::Refunded).status(), PaymentStatus::Refunded);
    }

    #[test]
    fn successful_payment_can_be_refunded_once() {
        let mut p = payment(PaymentOutcome::Success);
        p.mark_refunded(Utc::now()).unwrap();
        assert!(p.is_refunded());

        let err = p.mark_refunded(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn failed_payment_cannot_be_refunded() {
        let mut p = payment(PaymentOutcome::Failed);
        assert!(p.mark_refunded(Utc::now()).is_err());
        assert_eq!(p.status(), PaymentStatus::Failed);
    }

    #[test]
    fn refund_keeps_amount() {
        let mut p = payment(PaymentOutcome::Success);
        p.mark_refunded(Utc::now()).unwrap();
        assert_eq!(p.amount(), Money::from_minor(10_000));
    }

    #[test]
    fn details_flags_match_status() {
        let details = payment(PaymentOutcome::Failed).details();
        assert!(details.is_failed);
        assert!(!details.is_successful);
        assert!(!details.is_refunded);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["amount"], 10_000);
    }
}
