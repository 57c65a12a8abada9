//! Payment outcome evaluation.
//!
//! There is no real gateway. `SimulatedPaymentProcessor` draws a weighted
//! outcome (80% success, 15% failed, 5% refunded); tests and explicit client
//! requests bypass the draw with a forced outcome.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use boxoffice_core::DomainError;

/// Result of a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Failed,
    Refunded,
}

impl PaymentOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentOutcome::Success => "success",
            PaymentOutcome::Failed => "failed",
            PaymentOutcome::Refunded => "refunded",
        }
    }
}

impl core::fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PaymentOutcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(PaymentOutcome::Success),
            "failed" => Ok(PaymentOutcome::Failed),
            "refunded" => Ok(PaymentOutcome::Refunded),
            other => Err(DomainError::validation(format!(
                "status must be one of success, failed, refunded (got {other:?})"
            ))),
        }
    }
}

/// Decides how a payment attempt ends.
pub trait PaymentProcessor: Send + Sync {
    /// Return `forced` unchanged when present, otherwise pick an outcome.
    fn evaluate(&self, forced: Option<PaymentOutcome>) -> PaymentOutcome;
}

impl<P> PaymentProcessor for std::sync::Arc<P>
where
    P: PaymentProcessor + ?Sized,
{
    fn evaluate(&self, forced: Option<PaymentOutcome>) -> PaymentOutcome {
        (**self).evaluate(forced)
    }
}

/// Map a roll in `1..=100` onto the simulation policy.
pub fn outcome_for_roll(roll: u8) -> PaymentOutcome {
    match roll {
        0..=80 => PaymentOutcome::Success,
        81..=95 => PaymentOutcome::Failed,
        _ => PaymentOutcome::Refunded,
    }
}

/// Weighted pseudo-random processor.
///
/// Not a security boundary, so a plain seedable PRNG is fine.
#[derive(Debug)]
pub struct SimulatedPaymentProcessor {
    rng: Mutex<StdRng>,
}

impl SimulatedPaymentProcessor {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn roll(&self) -> u8 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(1..=100),
            // A poisoned lock still holds a usable generator.
            Err(poisoned) => poisoned.into_inner().gen_range(1..=100),
        }
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentProcessor for SimulatedPaymentProcessor {
    fn evaluate(&self, forced: Option<PaymentOutcome>) -> PaymentOutcome {
        forced.unwrap_or_else(|| outcome_for_roll(self.roll()))
    }
}

/// Always answers with the same outcome unless one is forced.
#[derive(Debug, Clone, Copy)]
pub struct FixedPaymentProcessor(pub PaymentOutcome);

impl PaymentProcessor for FixedPaymentProcessor {
    fn evaluate(&self, forced: Option<PaymentOutcome>) -> PaymentOutcome {
        forced.unwrap_or(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_outcome_is_returned_unchanged() {
        let processor = SimulatedPaymentProcessor::seeded(7);
        for outcome in [PaymentOutcome::Success, PaymentOutcome::Failed, PaymentOutcome::Refunded] {
            assert_eq!(processor.evaluate(Some(outcome)), outcome);
        }
    }

    #[test]
    fn roll_boundaries() {
        assert_eq!(outcome_for_roll(1), PaymentOutcome::Success);
        assert_eq!(outcome_for_roll(80), PaymentOutcome::Success);
        assert_eq!(outcome_for_roll(81), PaymentOutcome::Failed);
        assert_eq!(outcome_for_roll(95), PaymentOutcome::Failed);
        assert_eq!(outcome_for_roll(96), PaymentOutcome::Refunded);
        assert_eq!(outcome_for_roll(100), PaymentOutcome::Refunded);
    }

    #[test]
    fn seeded_processor_is_reproducible() {
        let a = SimulatedPaymentProcessor::seeded(42);
        let b = SimulatedPaymentProcessor::seeded(42);
        let left: Vec<_> = (0..50).map(|_| a.evaluate(None)).collect();
        let right: Vec<_> = (0..50).map(|_| b.evaluate(None)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn distribution_is_roughly_weighted() {
        let processor = SimulatedPaymentProcessor::seeded(2024);
        let draws = 10_000;
        let successes = (0..draws)
            .filter(|_| processor.evaluate(None) == PaymentOutcome::Success)
            .count();

        // 80% with generous slack.
        assert!((7_500..=8_500).contains(&successes), "successes = {successes}");
    }

    #[test]
    fn fixed_processor_answers_its_outcome() {
        let processor = FixedPaymentProcessor(PaymentOutcome::Failed);
        assert_eq!(processor.evaluate(None), PaymentOutcome::Failed);
        assert_eq!(processor.evaluate(Some(PaymentOutcome::Success)), PaymentOutcome::Success);
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert_eq!("refunded".parse::<PaymentOutcome>().unwrap(), PaymentOutcome::Refunded);
        assert!(matches!("pending".parse::<PaymentOutcome>(), Err(DomainError::Validation(_))));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every roll in range maps to exactly the policy band.
            #[test]
            fn every_roll_has_an_outcome(roll in 1u8..=100) {
                let outcome = outcome_for_roll(roll);
                let expected = if roll <= 80 {
                    PaymentOutcome::Success
                } else if roll <= 95 {
                    PaymentOutcome::Failed
                } else {
                    PaymentOutcome::Refunded
                };
                prop_assert_eq!(outcome, expected);
            }
        }
    }
}
