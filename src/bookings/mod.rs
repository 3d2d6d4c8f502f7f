pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod status_machine;

pub use error::BookingError;
pub use models::*;
pub use repository::{BookingStore, PgBookingStore};
pub use service::BookingService;
pub use status_machine::{BookingAction, StatusMachine};
