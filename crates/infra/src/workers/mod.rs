//! Background consumers of the ticketing bus.

pub mod bus_worker;
pub mod notifications;

pub use bus_worker::{BusWorker, WorkerHandle};
pub use notifications::{
    BookingNotifier, BookingSummary, LoggingNotifier, NotificationWorker, NotifyError,
};
