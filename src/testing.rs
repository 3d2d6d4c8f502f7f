// Test support: an in-memory store for service and HTTP tests, plus
// PostgreSQL fixtures for the database-backed tests
//
// The store implements both repository traits over plain vectors behind one
// async mutex, so every stock-touching write is atomic.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::bookings::{
    error::BookingError,
    models::{Booking, BookingStatus, NewBooking},
    repository::BookingStore,
};
use crate::db;
use crate::hotels::{
    availability::ReservedWindow,
    conditions::{ConditionSet, HotelSnapshot},
    error::HotelError,
    filter::PageRequest,
    geo::GeoPoint,
    models::{Hotel, HotelStatus, HotelWithRelations, Promotion, PromotionType, RoomType},
    pricing::DiscountCalculator,
    repository::{CandidatePage, HotelRepository},
    sort::SortPlan,
};

#[derive(Default)]
struct Inner {
    hotels: Vec<Hotel>,
    room_types: Vec<RoomType>,
    promotions: Vec<Promotion>,
    bookings: Vec<Booking>,
}

impl Inner {
    /// Soft-deleted bookings keep their stock, so they still block windows
    fn reserved_windows(&self) -> Vec<ReservedWindow> {
        self.bookings
            .iter()
            .filter(|b| b.status.holds_stock())
            .map(|b| ReservedWindow {
                room_type_id: b.room_type_id,
                check_in: b.check_in,
                check_out: b.check_out,
            })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_hotel(&self, hotel: Hotel) {
        self.inner.lock().await.hotels.push(hotel);
    }

    pub async fn insert_room_type(&self, room_type: RoomType) {
        self.inner.lock().await.room_types.push(room_type);
    }

    pub async fn insert_promotion(&self, promotion: Promotion) {
        self.inner.lock().await.promotions.push(promotion);
    }

    pub async fn insert_booking(&self, booking: Booking) {
        self.inner.lock().await.bookings.push(booking);
    }

    /// Current stock of a room type; panics in tests when it is missing
    pub async fn stock(&self, room_type_id: i32) -> i32 {
        self.inner
            .lock()
            .await
            .room_types
            .iter()
            .find(|rt| rt.id == room_type_id)
            .map(|rt| rt.stock)
            .expect("room type exists")
    }

    pub async fn booking_count(&self) -> usize {
        self.inner.lock().await.bookings.len()
    }
}

#[async_trait]
impl HotelRepository for MemoryStore {
    async fn find_candidates(
        &self,
        conditions: &ConditionSet,
        plan: &SortPlan,
        origin: Option<GeoPoint>,
        page: Option<PageRequest>,
    ) -> Result<CandidatePage, HotelError> {
        let inner = self.inner.lock().await;
        let reserved = inner.reserved_windows();

        let mut matching: Vec<&Hotel> = inner
            .hotels
            .iter()
            .filter(|&hotel| {
                let room_types: Vec<RoomType> = inner
                    .room_types
                    .iter()
                    .filter(|rt| rt.hotel_id == hotel.id)
                    .cloned()
                    .collect();
                conditions.matches(&HotelSnapshot {
                    hotel,
                    room_types: &room_types,
                    reserved: &reserved,
                })
            })
            .collect();

        matching.sort_by(|a, b| plan.compare_hotels(a, b, origin));

        let total = matching.len() as i64;
        let ids = matching.iter().map(|h| h.id);
        let ids: Vec<i32> = match page {
            Some(page) => ids
                .skip(page.offset() as usize)
                .take(page.page_size as usize)
                .collect(),
            None => ids.collect(),
        };

        Ok(CandidatePage { ids, total })
    }

    async fn load_with_relations(&self, ids: &[i32]) -> Result<Vec<HotelWithRelations>, HotelError> {
        let inner = self.inner.lock().await;

        Ok(inner
            .hotels
            .iter()
            .filter(|h| ids.contains(&h.id))
            .map(|hotel| HotelWithRelations {
                hotel: hotel.clone(),
                room_types: inner
                    .room_types
                    .iter()
                    .filter(|rt| rt.hotel_id == hotel.id && !rt.is_deleted())
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn active_promotions(
        &self,
        hotel_ids: &[i32],
        today: NaiveDate,
    ) -> Result<Vec<Promotion>, HotelError> {
        let inner = self.inner.lock().await;
        let in_hotels = |room_type_id: i32| {
            inner
                .room_types
                .iter()
                .any(|rt| rt.id == room_type_id && hotel_ids.contains(&rt.hotel_id))
        };

        let mut promotions: Vec<Promotion> = inner
            .promotions
            .iter()
            .filter(|p| DiscountCalculator::is_active(p, today))
            .filter(|p| p.hotel_id.map_or(true, |id| hotel_ids.contains(&id)))
            .filter(|p| p.room_type_id.map_or(true, |id| in_hotels(id)))
            .cloned()
            .collect();
        promotions.sort_by_key(|p| p.id);

        Ok(promotions)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_room_type(&self, id: i32) -> Result<Option<RoomType>, BookingError> {
        let inner = self.inner.lock().await;
        Ok(inner.room_types.iter().find(|rt| rt.id == id).cloned())
    }

    async fn find_hotel(&self, id: i32) -> Result<Option<Hotel>, BookingError> {
        let inner = self.inner.lock().await;
        Ok(inner.hotels.iter().find(|h| h.id == id).cloned())
    }

    async fn find_promotion(&self, id: i32) -> Result<Option<Promotion>, BookingError> {
        let inner = self.inner.lock().await;
        Ok(inner.promotions.iter().find(|p| p.id == id).cloned())
    }

    async fn create_reserving_stock(&self, booking: NewBooking) -> Result<Booking, BookingError> {
        let mut inner = self.inner.lock().await;

        let room_type = inner
            .room_types
            .iter_mut()
            .find(|rt| rt.id == booking.room_type_id && !rt.is_deleted() && rt.stock > 0)
            .ok_or(BookingError::StockExhausted(booking.room_type_id))?;
        room_type.stock -= 1;

        let now = Utc::now() + Duration::milliseconds(inner.bookings.len() as i64);
        let created = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            hotel_id: booking.hotel_id,
            room_type_id: booking.room_type_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            total_price: booking.total_price,
            status: BookingStatus::Pending,
            promotion_id: booking.promotion_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.bookings.push(created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bookings
            .iter()
            .find(|b| b.id == id && b.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_user(
        &self,
        user_id: i32,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        let inner = self.inner.lock().await;

        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id && b.deleted_at.is_none())
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(bookings)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: &[BookingStatus],
        to: BookingStatus,
        restock: bool,
    ) -> Result<Option<Booking>, BookingError> {
        let mut inner = self.inner.lock().await;

        let Some(booking) = inner
            .bookings
            .iter_mut()
            .find(|b| b.id == id && b.deleted_at.is_none() && from.contains(&b.status))
        else {
            return Ok(None);
        };
        booking.status = to;
        booking.updated_at = Utc::now();
        let updated = booking.clone();

        if restock {
            if let Some(room_type) = inner
                .room_types
                .iter_mut()
                .find(|rt| rt.id == updated.room_type_id)
            {
                room_type.stock += 1;
            }
        }

        Ok(Some(updated))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, BookingError> {
        let mut inner = self.inner.lock().await;

        match inner
            .bookings
            .iter_mut()
            .find(|b| b.id == id && b.deleted_at.is_none())
        {
            Some(booking) => {
                booking.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// Fixtures

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Fixed "today" inside every fixture promotion's window
pub fn today() -> NaiveDate {
    date(2024, 5, 20)
}

pub fn timestamp(days: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(days)
}

/// Approved hotel without coordinates, created `id` days into 2024
pub fn hotel(id: i32, merchant_id: i32) -> Hotel {
    Hotel {
        id,
        merchant_id,
        name: format!("Hotel {}", id),
        name_en: None,
        address: String::new(),
        latitude: None,
        longitude: None,
        star_rating: 3,
        opening_date: None,
        facilities: Vec::new(),
        tags: Vec::new(),
        nearby_attractions: Vec::new(),
        images: Vec::new(),
        average_rating: 4.0,
        rating_count: 10,
        status: HotelStatus::Approved,
        status_reason: None,
        created_at: timestamp(i64::from(id)),
        deleted_at: None,
    }
}

pub fn hotel_at(id: i32, merchant_id: i32, latitude: f64, longitude: f64) -> Hotel {
    Hotel {
        latitude: Some(latitude),
        longitude: Some(longitude),
        ..hotel(id, merchant_id)
    }
}

pub fn room_type(id: i32, hotel_id: i32, price: Decimal, stock: i32) -> RoomType {
    RoomType {
        id,
        hotel_id,
        name: format!("Room {}", id),
        price,
        stock,
        capacity: Some(2),
        deleted_at: None,
    }
}

/// Promotion active through 2024
pub fn promotion(
    id: i32,
    hotel_id: Option<i32>,
    room_type_id: Option<i32>,
    promotion_type: PromotionType,
    value: Decimal,
) -> Promotion {
    Promotion {
        id,
        hotel_id,
        room_type_id,
        name: format!("Promotion {}", id),
        promotion_type,
        value,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        deleted_at: None,
    }
}

// PostgreSQL fixtures for the database-backed tests

/// Pool over `TEST_DATABASE_URL` with migrations applied; `None` when unset
pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Letter-led token that is unique per call, usable as a keyword tag
pub fn unique_token() -> String {
    format!("t{}", Uuid::new_v4().simple())
}

/// Approved hotel tagged with `tag`; returns its id
pub async fn insert_pg_hotel(
    pool: &PgPool,
    merchant_id: i32,
    tag: &str,
    location: Option<(f64, f64)>,
) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO hotels (merchant_id, name, star_rating, tags, status, latitude, longitude)
        VALUES ($1, $2, 4, $3, 'approved', $4, $5)
        RETURNING id
        "#,
    )
    .bind(merchant_id)
    .bind(format!("Hotel {}", tag))
    .bind(vec![tag.to_string()])
    .bind(location.map(|(lat, _)| lat))
    .bind(location.map(|(_, lng)| lng))
    .fetch_one(pool)
    .await
    .expect("Failed to create test hotel");

    id
}

pub async fn insert_pg_room_type(pool: &PgPool, hotel_id: i32, price: Decimal, stock: i32) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO room_types (hotel_id, name, price, stock) VALUES ($1, 'Standard', $2, $3) RETURNING id",
    )
    .bind(hotel_id)
    .bind(price)
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to create test room type");

    id
}

/// Room-type scoped percentage promotion active through 2024
pub async fn insert_pg_promotion(pool: &PgPool, room_type_id: i32, value: Decimal) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO promotions (room_type_id, promotion_type, value, start_date, end_date)
        VALUES ($1, 'percentage', $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(room_type_id)
    .bind(value)
    .bind(date(2024, 1, 1))
    .bind(date(2024, 12, 31))
    .fetch_one(pool)
    .await
    .expect("Failed to create test promotion");

    id
}

/// Booking row for 2024-06-01..03, written straight to the table
pub async fn insert_pg_booking(
    pool: &PgPool,
    hotel_id: i32,
    room_type_id: i32,
    status: BookingStatus,
    soft_deleted: bool,
) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO bookings
            (user_id, hotel_id, room_type_id, check_in, check_out, total_price, status, deleted_at)
        VALUES ($1, $2, $3, $4, $5, 0, $6, CASE WHEN $7 THEN NOW() END)
        RETURNING id
        "#,
    )
    .bind(1)
    .bind(hotel_id)
    .bind(room_type_id)
    .bind(date(2024, 6, 1))
    .bind(date(2024, 6, 3))
    .bind(status.as_str())
    .bind(soft_deleted)
    .fetch_one(pool)
    .await
    .expect("Failed to create test booking");

    id
}

pub async fn pg_stock(pool: &PgPool, room_type_id: i32) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM room_types WHERE id = $1")
        .bind(room_type_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read stock");

    stock
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_active_promotions_are_limited_to_requested_hotels() {
        let store = MemoryStore::new();
        store.insert_hotel(hotel(1, 100)).await;
        store.insert_hotel(hotel(2, 100)).await;
        store.insert_room_type(room_type(10, 1, dec!(100), 1)).await;
        store.insert_room_type(room_type(20, 2, dec!(100), 1)).await;

        for promotion in [
            promotion(4, None, None, PromotionType::Direct, dec!(1)),
            promotion(3, Some(1), None, PromotionType::Direct, dec!(1)),
            promotion(2, Some(2), None, PromotionType::Direct, dec!(1)),
            promotion(1, None, Some(10), PromotionType::Direct, dec!(1)),
            promotion(5, None, Some(20), PromotionType::Direct, dec!(1)),
        ] {
            store.insert_promotion(promotion).await;
        }

        let found: Vec<i32> = store
            .active_promotions(&[1], today())
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(found, vec![1, 3, 4]);
    }
}
