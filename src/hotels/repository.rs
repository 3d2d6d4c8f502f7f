use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgArguments, query::QueryScalar, PgPool, Postgres};

use crate::hotels::{
    conditions::{ConditionSet, SqlParam, SqlQueryBuilder},
    error::HotelError,
    filter::PageRequest,
    geo::GeoPoint,
    models::{Hotel, HotelWithRelations, Promotion, RoomType},
    sort::SortPlan,
};

const HOTEL_COLUMNS: &str = "id, merchant_id, name, name_en, address, latitude, longitude, \
     star_rating, opening_date, facilities, tags, nearby_attractions, images, average_rating, \
     rating_count, status, status_reason, created_at, deleted_at";

/// Ordered candidate ids for one page plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    pub ids: Vec<i32>,
    pub total: i64,
}

/// Read access to hotels, room types and promotions
#[async_trait]
pub trait HotelRepository: Send + Sync {
    /// Ids matching `conditions`, ordered by `plan`. `page = None` returns all.
    async fn find_candidates(
        &self,
        conditions: &ConditionSet,
        plan: &SortPlan,
        origin: Option<GeoPoint>,
        page: Option<PageRequest>,
    ) -> Result<CandidatePage, HotelError>;

    /// Hotels with their non-deleted room types, in no particular order
    async fn load_with_relations(&self, ids: &[i32]) -> Result<Vec<HotelWithRelations>, HotelError>;

    /// Active promotions that could apply to room types of these hotels, by id
    async fn active_promotions(
        &self,
        hotel_ids: &[i32],
        today: NaiveDate,
    ) -> Result<Vec<Promotion>, HotelError>;
}

/// PostgreSQL implementation of `HotelRepository`
#[derive(Clone)]
pub struct PgHotelRepository {
    pool: PgPool,
}

impl PgHotelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_params<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value.clone()),
            SqlParam::TextArray(values) => query.bind(values.clone()),
            SqlParam::Float(value) => query.bind(*value),
            SqlParam::Date(value) => query.bind(*value),
        };
    }
    query
}

#[async_trait]
impl HotelRepository for PgHotelRepository {
    async fn find_candidates(
        &self,
        conditions: &ConditionSet,
        plan: &SortPlan,
        origin: Option<GeoPoint>,
        page: Option<PageRequest>,
    ) -> Result<CandidatePage, HotelError> {
        let builder = SqlQueryBuilder::from_conditions(conditions);
        let count = builder.build_count();
        let page_query = builder.build_ids(plan, origin, page);

        tracing::debug!("Candidate query: {}", page_query.sql);

        // Count and page read the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total = bind_params(sqlx::query_scalar::<_, i64>(&count.sql), &count.params)
            .fetch_one(&mut *tx)
            .await?;
        let ids = bind_params(sqlx::query_scalar::<_, i32>(&page_query.sql), &page_query.params)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CandidatePage { ids, total })
    }

    async fn load_with_relations(&self, ids: &[i32]) -> Result<Vec<HotelWithRelations>, HotelError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let hotels = sqlx::query_as::<_, Hotel>(&format!(
            "SELECT {} FROM hotels WHERE id = ANY($1)",
            HOTEL_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let room_types = sqlx::query_as::<_, RoomType>(
            r#"
            SELECT id, hotel_id, name, price, stock, capacity, deleted_at
            FROM room_types
            WHERE hotel_id = ANY($1) AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut by_hotel: HashMap<i32, Vec<RoomType>> = HashMap::new();
        for room_type in room_types {
            by_hotel.entry(room_type.hotel_id).or_default().push(room_type);
        }

        Ok(hotels
            .into_iter()
            .map(|hotel| {
                let room_types = by_hotel.remove(&hotel.id).unwrap_or_default();
                HotelWithRelations { hotel, room_types }
            })
            .collect())
    }

    async fn active_promotions(
        &self,
        hotel_ids: &[i32],
        today: NaiveDate,
    ) -> Result<Vec<Promotion>, HotelError> {
        let promotions = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, hotel_id, room_type_id, name, promotion_type, value,
                   start_date, end_date, deleted_at
            FROM promotions
            WHERE deleted_at IS NULL
              AND start_date <= $2 AND end_date >= $2
              AND (hotel_id IS NULL OR hotel_id = ANY($1))
              AND (room_type_id IS NULL
                   OR room_type_id IN (SELECT id FROM room_types WHERE hotel_id = ANY($1)))
            ORDER BY id
            "#,
        )
        .bind(hotel_ids.to_vec())
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }
}
