use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::hotels::geo::GeoPoint;

/// Approval state of a hotel; only `Approved` hotels are searchable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HotelStatus {
    Pending,
    Approved,
    Rejected,
    Offline,
}

impl HotelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotelStatus::Pending => "pending",
            HotelStatus::Approved => "approved",
            HotelStatus::Rejected => "rejected",
            HotelStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for HotelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hotel row as persisted
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hotel {
    pub id: i32,
    pub merchant_id: i32,
    pub name: String,
    pub name_en: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub star_rating: i32,
    pub opening_date: Option<NaiveDate>,
    pub facilities: Vec<String>,
    pub tags: Vec<String>,
    pub nearby_attractions: Vec<String>,
    pub images: Vec<String>,
    pub average_rating: f64,
    pub rating_count: i32,
    pub status: HotelStatus,
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Hotel {
    /// Approved and not soft-deleted
    pub fn is_visible(&self) -> bool {
        self.status == HotelStatus::Approved && self.deleted_at.is_none()
    }

    /// Location of the hotel, `None` when either coordinate is missing
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
            _ => None,
        }
    }
}

/// Bookable unit category of a hotel with a finite stock counter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoomType {
    pub id: i32,
    pub hotel_id: i32,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub capacity: Option<i32>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RoomType {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// How a promotion changes the running price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PromotionType {
    /// Subtract a fixed amount
    Direct,
    /// Multiply by a fraction (0.8 means 20% off)
    Percentage,
    /// Subtract a fixed amount; no minimum-spend threshold is checked
    SpendAndSave,
}

/// Discount rule scoped to a room type, a hotel, or globally
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Promotion {
    pub id: i32,
    pub hotel_id: Option<i32>,
    pub room_type_id: Option<i32>,
    pub name: String,
    pub promotion_type: PromotionType,
    pub value: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A hotel hydrated with its non-deleted room types
#[derive(Debug, Clone)]
pub struct HotelWithRelations {
    pub hotel: Hotel,
    pub room_types: Vec<RoomType>,
}

/// Room type as returned to callers, with its promotion-adjusted price
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeResult {
    pub id: i32,
    pub hotel_id: i32,
    pub name: String,
    #[schema(value_type = String, example = "400.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "320.00")]
    pub discounted_price: Decimal,
    pub stock: i32,
    pub capacity: Option<i32>,
}

/// Hotel as returned by search and detail reads
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelResult {
    pub id: i32,
    pub merchant_id: i32,
    pub name: String,
    pub name_en: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub star_rating: i32,
    pub opening_date: Option<NaiveDate>,
    pub facilities: Vec<String>,
    pub tags: Vec<String>,
    pub nearby_attractions: Vec<String>,
    pub images: Vec<String>,
    pub average_rating: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub room_types: Vec<RoomTypeResult>,
    /// Lowest discounted room price, absent when the hotel has no room types
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    /// Kilometres from the supplied location; only present for geo searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub items: Vec<HotelResult>,
    /// Size of the full filtered set, not just this page
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}
