use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::hotels::pricing::PriceOverflow;

/// Error types for hotel search and detail reads
#[derive(Debug, thiserror::Error)]
pub enum HotelError {
    #[error("Hotel {0} not found")]
    NotFound(i32),

    #[error(transparent)]
    Pricing(#[from] PriceOverflow),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<HotelError> for ApiError {
    fn from(err: HotelError) -> Self {
        match err {
            HotelError::NotFound(id) => ApiError::NotFound {
                resource: "Hotel".to_string(),
                id: id.to_string(),
            },
            HotelError::Pricing(overflow) => ApiError::InternalError(overflow.to_string()),
            HotelError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

impl IntoResponse for HotelError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
