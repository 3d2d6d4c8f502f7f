use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Booking status enum representing the lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Cancelled and completed bookings accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Pending and confirmed bookings hold one unit of room stock
    pub fn holds_stock(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// Domain model representing a booking in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: i32,
    pub hotel_id: i32,
    pub room_type_id: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub promotion_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Values for a booking row about to be inserted as `pending`
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: i32,
    pub hotel_id: i32,
    pub room_type_id: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: Decimal,
    pub promotion_id: Option<i32>,
}

/// Request DTO for creating a booking
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "crate::validation::validate_stay_window"))]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "hotelId must be a positive id"))]
    pub hotel_id: i32,
    #[validate(range(min = 1, message = "roomTypeId must be a positive id"))]
    pub room_type_id: i32,
    #[schema(value_type = String, example = "2024-06-01")]
    pub check_in: NaiveDate,
    #[schema(value_type = String, example = "2024-06-03")]
    pub check_out: NaiveDate,
    #[validate(range(min = 1, message = "promotionId must be a positive id"))]
    pub promotion_id: Option<i32>,
}

/// Query parameters for the booking list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// Optional status filter
    pub status: Option<BookingStatus>,
}

/// Response DTO for a booking
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: i32,
    pub hotel_id: i32,
    pub room_type_id: i32,
    #[schema(value_type = String, example = "2024-06-01")]
    pub check_in: NaiveDate,
    #[schema(value_type = String, example = "2024-06-03")]
    pub check_out: NaiveDate,
    pub nights: i64,
    #[schema(value_type = String, example = "640.00")]
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub promotion_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id,
            hotel_id: booking.hotel_id,
            room_type_id: booking.room_type_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            nights: (booking.check_out - booking.check_in).num_days(),
            total_price: booking.total_price,
            status: booking.status,
            promotion_id: booking.promotion_id,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}
