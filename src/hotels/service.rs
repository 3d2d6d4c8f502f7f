use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::hotels::{
    conditions::ConditionSet,
    error::HotelError,
    filter::{FilterNormalizer, SearchParams, SearchQuery},
    geo::{distance_km, GeoPoint},
    models::{HotelResult, HotelWithRelations, Promotion, RoomTypeResult, SearchResponse},
    pricing::{DiscountCalculator, PriceOverflow},
    repository::HotelRepository,
    sort::{sort_by_min_price, SortPlan},
};

/// Search and detail reads over approved hotels
#[derive(Clone)]
pub struct SearchService {
    repository: Arc<dyn HotelRepository>,
    max_page_size: u32,
}

impl SearchService {
    pub fn new(repository: Arc<dyn HotelRepository>, max_page_size: u32) -> Self {
        Self {
            repository,
            max_page_size,
        }
    }

    /// Normalize raw parameters and run the search
    pub async fn search(
        &self,
        params: &SearchParams,
        today: NaiveDate,
    ) -> Result<SearchResponse, HotelError> {
        let query = FilterNormalizer::normalize(params, self.max_page_size);
        self.search_query(&query, today).await
    }

    /// Filter, order, paginate and price
    ///
    /// Push-down sorts fetch only the requested page of ids. Price sorting has
    /// to price every candidate before it can order and slice them.
    pub async fn search_query(
        &self,
        query: &SearchQuery,
        today: NaiveDate,
    ) -> Result<SearchResponse, HotelError> {
        let plan = SortPlan::resolve(&query.sort, query.location.is_some());
        let conditions = ConditionSet::build(query, &plan);
        let page = query.page;

        tracing::debug!(
            "Searching hotels: {} conditions, sort {:?} {:?}, page {} size {}",
            conditions.conditions().len(),
            plan.key,
            plan.direction,
            page.page,
            page.page_size
        );

        let (items, total) = if plan.is_pushdown() {
            let candidates = self
                .repository
                .find_candidates(&conditions, &plan, query.location, Some(page))
                .await?;
            let items = self.hydrate(&candidates.ids, query.location, today).await?;
            (items, candidates.total)
        } else {
            let candidates = self
                .repository
                .find_candidates(&conditions, &plan, query.location, None)
                .await?;
            let mut items = self.hydrate(&candidates.ids, query.location, today).await?;
            sort_by_min_price(&mut items, plan.direction);

            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            let items: Vec<HotelResult> = items
                .into_iter()
                .skip(offset)
                .take(page.page_size as usize)
                .collect();
            (items, candidates.total)
        };

        Ok(SearchResponse {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// One approved hotel with priced room types
    pub async fn hotel_detail(
        &self,
        id: i32,
        params: &SearchParams,
        today: NaiveDate,
    ) -> Result<HotelResult, HotelError> {
        let location = FilterNormalizer::normalize(params, self.max_page_size).location;
        self.get_hotel(id, location, today).await
    }

    pub async fn get_hotel(
        &self,
        id: i32,
        location: Option<GeoPoint>,
        today: NaiveDate,
    ) -> Result<HotelResult, HotelError> {
        let relation = self
            .repository
            .load_with_relations(&[id])
            .await?
            .into_iter()
            .find(|r| r.hotel.id == id && r.hotel.is_visible())
            .ok_or(HotelError::NotFound(id))?;

        let promotions = self.repository.active_promotions(&[id], today).await?;
        Ok(price_hotel(relation, &promotions, today, location)?)
    }

    /// Load hotels with relations and price them, keeping the order of `ids`
    async fn hydrate(
        &self,
        ids: &[i32],
        origin: Option<GeoPoint>,
        today: NaiveDate,
    ) -> Result<Vec<HotelResult>, HotelError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut loaded: HashMap<i32, HotelWithRelations> = self
            .repository
            .load_with_relations(ids)
            .await?
            .into_iter()
            .map(|r| (r.hotel.id, r))
            .collect();
        let promotions = self.repository.active_promotions(ids, today).await?;

        let items = ids
            .iter()
            .filter_map(|id| loaded.remove(id))
            .map(|relation| price_hotel(relation, &promotions, today, origin))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

/// Attach discounted prices, the minimum price and the optional distance
pub fn price_hotel(
    relation: HotelWithRelations,
    promotions: &[Promotion],
    today: NaiveDate,
    origin: Option<GeoPoint>,
) -> Result<HotelResult, PriceOverflow> {
    let HotelWithRelations { hotel, room_types } = relation;

    let room_types = room_types
        .iter()
        .filter(|rt| !rt.is_deleted())
        .map(|rt| {
            Ok(RoomTypeResult {
                id: rt.id,
                hotel_id: rt.hotel_id,
                name: rt.name.clone(),
                price: rt.price,
                discounted_price: DiscountCalculator::discounted_price(rt, promotions, today)?,
                stock: rt.stock,
                capacity: rt.capacity,
            })
        })
        .collect::<Result<Vec<RoomTypeResult>, PriceOverflow>>()?;

    let min_price = room_types.iter().map(|rt| rt.discounted_price).min();
    let distance = origin
        .zip(hotel.location())
        .map(|(from, to)| distance_km(from, to));

    Ok(HotelResult {
        id: hotel.id,
        merchant_id: hotel.merchant_id,
        name: hotel.name,
        name_en: hotel.name_en,
        address: hotel.address,
        latitude: hotel.latitude,
        longitude: hotel.longitude,
        star_rating: hotel.star_rating,
        opening_date: hotel.opening_date,
        facilities: hotel.facilities,
        tags: hotel.tags,
        nearby_attractions: hotel.nearby_attractions,
        images: hotel.images,
        average_rating: hotel.average_rating,
        rating_count: hotel.rating_count,
        created_at: hotel.created_at,
        room_types,
        min_price,
        distance,
    })
}
