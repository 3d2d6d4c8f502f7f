// Sort coordinator
//
// Distance, rating and creation time are pushed down into the candidate
// query. Price sorting needs discounted prices, so candidates are hydrated
// and priced first and ordered here.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hotels::{
    geo::{distance_km, GeoPoint},
    models::{Hotel, HotelResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Distance,
    Price,
    Rating,
    CreatedAt,
}

impl SortKey {
    /// Accepts the wire names plus snake_case / lowercase spellings
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('_', "").as_str() {
            "distance" => Some(SortKey::Distance),
            "price" => Some(SortKey::Price),
            "rating" => Some(SortKey::Rating),
            "createdat" => Some(SortKey::CreatedAt),
            _ => None,
        }
    }

    /// Natural direction before `reversed` is applied
    fn natural_direction(self) -> SortDirection {
        match self {
            SortKey::Distance | SortKey::Price => SortDirection::Asc,
            SortKey::Rating | SortKey::CreatedAt => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Caller's sort choice after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortRequest {
    pub key: Option<SortKey>,
    pub reversed: bool,
}

/// Effective sort key and direction for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortPlan {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortPlan {
    /// Defaults to distance with a location and creation time without one.
    /// A distance sort without a location falls back to that default.
    pub fn resolve(request: &SortRequest, has_location: bool) -> Self {
        let default_key = if has_location {
            SortKey::Distance
        } else {
            SortKey::CreatedAt
        };

        let key = match request.key {
            Some(SortKey::Distance) if !has_location => default_key,
            Some(key) => key,
            None => default_key,
        };

        let natural = key.natural_direction();
        let direction = if request.reversed {
            natural.flipped()
        } else {
            natural
        };

        Self { key, direction }
    }

    /// Whether the store can order candidates itself
    pub fn is_pushdown(&self) -> bool {
        self.key != SortKey::Price
    }

    /// Order two hotels by a push-down key; ties go to the lower id
    pub fn compare_hotels(&self, a: &Hotel, b: &Hotel, origin: Option<GeoPoint>) -> Ordering {
        let primary = match self.key {
            SortKey::Distance => {
                let da = distance_to(a, origin);
                let db = distance_to(b, origin);
                self.direction
                    .apply(da.partial_cmp(&db).unwrap_or(Ordering::Equal))
            }
            SortKey::Rating => self.direction.apply(
                a.average_rating
                    .partial_cmp(&b.average_rating)
                    .unwrap_or(Ordering::Equal),
            ),
            SortKey::CreatedAt => self.direction.apply(a.created_at.cmp(&b.created_at)),
            SortKey::Price => Ordering::Equal,
        };
        primary.then(a.id.cmp(&b.id))
    }
}

fn distance_to(hotel: &Hotel, origin: Option<GeoPoint>) -> f64 {
    match (origin, hotel.location()) {
        (Some(o), Some(p)) => distance_km(o, p),
        _ => f64::INFINITY,
    }
}

/// Order priced hotels by their lowest discounted price.
/// Hotels with no room types go last in both directions.
pub fn sort_by_min_price(items: &mut [HotelResult], direction: SortDirection) {
    items.sort_by(|a, b| compare_min_price(a.min_price, b.min_price, direction).then(a.id.cmp(&b.id)));
}

fn compare_min_price(a: Option<Decimal>, b: Option<Decimal>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
