use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::bookings::{
    error::BookingError,
    models::{Booking, BookingStatus, NewBooking},
};
use crate::db::is_check_violation;
use crate::hotels::models::{Hotel, Promotion, RoomType};

const BOOKING_COLUMNS: &str = "id, user_id, hotel_id, room_type_id, check_in, check_out, \
     total_price, status, promotion_id, created_at, updated_at, deleted_at";

/// Persistence for bookings and the room stock they reserve
///
/// Writes that touch stock run in a single transaction with a guarded
/// conditional update, so concurrent callers can never drive stock negative
/// or restock the same booking twice.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Room type by id, soft-deleted rows included
    async fn find_room_type(&self, id: i32) -> Result<Option<RoomType>, BookingError>;

    /// Hotel by id, whatever its status
    async fn find_hotel(&self, id: i32) -> Result<Option<Hotel>, BookingError>;

    async fn find_promotion(&self, id: i32) -> Result<Option<Promotion>, BookingError>;

    /// Decrement stock where `stock > 0` and insert a pending booking
    ///
    /// Fails with `StockExhausted` when the decrement matches no row.
    async fn create_reserving_stock(&self, booking: NewBooking) -> Result<Booking, BookingError>;

    /// Non-deleted booking by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, BookingError>;

    /// Non-deleted bookings of a user, newest first
    async fn find_by_user(
        &self,
        user_id: i32,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError>;

    /// Move a booking to `to` if its status is one of `from`
    ///
    /// Returns `None` when the guard matched nothing. With `restock` the room
    /// type gets its unit back in the same transaction.
    async fn transition(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
        restock: bool,
    ) -> Result<Option<Booking>, BookingError>;

    /// Mark a booking deleted; false when it was missing or already deleted
    async fn soft_delete(&self, id: Uuid) -> Result<bool, BookingError>;
}

/// PostgreSQL implementation of `BookingStore`
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_names(statuses: &[BookingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_room_type(&self, id: i32) -> Result<Option<RoomType>, BookingError> {
        let room_type = sqlx::query_as::<_, RoomType>(
            "SELECT id, hotel_id, name, price, stock, capacity, deleted_at FROM room_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room_type)
    }

    async fn find_hotel(&self, id: i32) -> Result<Option<Hotel>, BookingError> {
        let hotel = sqlx::query_as::<_, Hotel>(
            r#"
            SELECT id, merchant_id, name, name_en, address, latitude, longitude, star_rating,
                   opening_date, facilities, tags, nearby_attractions, images, average_rating,
                   rating_count, status, status_reason, created_at, deleted_at
            FROM hotels
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hotel)
    }

    async fn find_promotion(&self, id: i32) -> Result<Option<Promotion>, BookingError> {
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, hotel_id, room_type_id, name, promotion_type, value,
                   start_date, end_date, deleted_at
            FROM promotions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    async fn create_reserving_stock(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;

        let reserved = sqlx::query(
            "UPDATE room_types SET stock = stock - 1 WHERE id = $1 AND stock > 0 AND deleted_at IS NULL",
        )
        .bind(booking.room_type_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_check_violation(&e) {
                BookingError::StockExhausted(booking.room_type_id)
            } else {
                BookingError::from(e)
            }
        })?;

        if reserved.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(BookingError::StockExhausted(booking.room_type_id));
        }

        let created = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings
                (user_id, hotel_id, room_type_id, check_in, check_out, total_price, status, promotion_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.user_id)
        .bind(booking.hotel_id)
        .bind(booking.room_type_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.total_price)
        .bind(BookingStatus::Pending.as_str())
        .bind(booking.promotion_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE id = $1 AND deleted_at IS NULL",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
        restock: bool,
    ) -> Result<Option<Booking>, BookingError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND status = ANY($3)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(to.as_str())
        .bind(status_names(from))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(booking) = updated else {
            return Ok(None);
        };

        if restock {
            sqlx::query("UPDATE room_types SET stock = stock + 1 WHERE id = $1")
                .bind(booking.room_type_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Some(booking))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, BookingError> {
        let result = sqlx::query(
            "UPDATE bookings SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
