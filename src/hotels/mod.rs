pub mod availability;
pub mod conditions;
pub mod error;
pub mod filter;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod repository;
pub mod service;
pub mod sort;

pub use error::HotelError;
pub use models::*;
pub use repository::{HotelRepository, PgHotelRepository};
pub use service::SearchService;
