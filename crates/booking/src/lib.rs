//! Booking domain module.
//!
//! A booking is a customer's claim on a quantity of one ticket type. It moves
//! through a small status machine driven by cancellation and payment outcomes.

pub mod booking;

pub use booking::{Booking, BookingStatus};
