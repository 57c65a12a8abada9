//! Payments domain module.
//!
//! Payment records and the processor seam that decides an attempt's outcome.
//! Pure domain logic: the processor is the only source of randomness and it is
//! injected by the caller.

pub mod payment;
pub mod processor;

pub use payment::{Payment, PaymentDetails, PaymentStatus};
pub use processor::{
    FixedPaymentProcessor, PaymentOutcome, PaymentProcessor, SimulatedPaymentProcessor, outcome_for_roll,
};
