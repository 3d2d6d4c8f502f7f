use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::bookings::models::BookingStatus;
use crate::db::is_serialization_failure;
use crate::error::ApiError;

/// Error types for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking {0} not found")]
    NotFound(Uuid),

    #[error("Hotel {0} not found")]
    HotelNotFound(i32),

    #[error("Room type {0} not found")]
    RoomTypeNotFound(i32),

    #[error("Room type {0} has no stock left")]
    StockExhausted(i32),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Promotion {0} does not apply to this room type")]
    InvalidPromotion(i32),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Concurrent update, retry the request")]
    Retryable,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        if is_serialization_failure(&err) {
            BookingError::Retryable
        } else {
            BookingError::Database(err)
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(id) => ApiError::NotFound {
                resource: "Booking".to_string(),
                id: id.to_string(),
            },
            BookingError::HotelNotFound(id) => ApiError::NotFound {
                resource: "Hotel".to_string(),
                id: id.to_string(),
            },
            BookingError::RoomTypeNotFound(id) => ApiError::NotFound {
                resource: "Room type".to_string(),
                id: id.to_string(),
            },
            BookingError::StockExhausted(_) | BookingError::InvalidTransition { .. } => {
                ApiError::Conflict {
                    message: err.to_string(),
                    retryable: false,
                }
            }
            BookingError::Retryable => ApiError::Conflict {
                message: err.to_string(),
                retryable: true,
            },
            BookingError::InvalidPromotion(_) => ApiError::BadRequest(err.to_string()),
            BookingError::Validation(errors) => ApiError::ValidationError(errors),
            BookingError::Forbidden(msg) => ApiError::Forbidden(msg),
            BookingError::Auth(auth) => ApiError::from(auth),
            BookingError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
