// Condition builder
//
// A `SearchQuery` becomes an AND-combined `ConditionSet`. The same set renders
// to parameterised SQL (count and page queries share the WHERE clause and its
// parameters) and evaluates in memory against a hotel snapshot.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;

use crate::hotels::{
    availability::{availability_sql, hotel_available, DateWindow, ReservedWindow},
    filter::{Band, PageRequest, SearchQuery},
    geo::{distance_km, distance_sql, GeoPoint},
    models::{Hotel, RoomType},
    sort::{SortKey, SortPlan},
};

/// Composite text the keyword search runs over
const KEYWORD_DOCUMENT_SQL: &str = "coalesce(h.name, '') || ' ' || coalesce(h.name_en, '') || ' ' || \
     coalesce(h.address, '') || ' ' || array_to_string(h.tags, ' ') || ' ' || \
     array_to_string(h.facilities, ' ') || ' ' || array_to_string(h.nearby_attractions, ' ')";

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid"))
}

/// Lowercased letter/digit runs; everything else separates words
pub fn keyword_tokens(keyword: &str) -> Vec<String> {
    word_pattern()
        .find_iter(keyword)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// `tok1:* & tok2:*` for `to_tsquery('simple', ...)`
pub fn prefix_tsquery(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| format!("{}:*", t))
        .collect::<Vec<_>>()
        .join(" & ")
}

/// One predicate over a hotel row
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Not soft-deleted and approved; always present
    Visible,
    /// Every token prefix-matches a word of the keyword document
    Keyword(Vec<String>),
    /// Hotel has at least one of the facilities
    FacilitiesOverlap(Vec<String>),
    /// Some non-deleted room type has a base price inside the band
    PriceBand(Band),
    StarRating(Band),
    AverageRating(Band),
    /// Some non-deleted room type has no overlapping pending/confirmed booking
    Available(DateWindow),
    HasCoordinates,
    WithinDistance { origin: GeoPoint, band: Band },
}

/// What in-memory evaluation needs to know about one hotel
#[derive(Debug, Clone, Copy)]
pub struct HotelSnapshot<'a> {
    pub hotel: &'a Hotel,
    /// All room types of the hotel, deleted ones included
    pub room_types: &'a [RoomType],
    /// Pending/confirmed stays on those room types
    pub reserved: &'a [ReservedWindow],
}

impl Condition {
    pub fn matches(&self, snapshot: &HotelSnapshot<'_>) -> bool {
        let hotel = snapshot.hotel;
        match self {
            Condition::Visible => hotel.is_visible(),
            Condition::Keyword(tokens) => {
                let words = document_words(hotel);
                tokens
                    .iter()
                    .all(|token| words.iter().any(|word| word.starts_with(token.as_str())))
            }
            Condition::FacilitiesOverlap(wanted) => {
                hotel.facilities.iter().any(|f| wanted.contains(f))
            }
            Condition::PriceBand(band) => snapshot
                .room_types
                .iter()
                .filter(|rt| !rt.is_deleted())
                .any(|rt| rt.price.to_f64().map_or(false, |p| band.contains(p))),
            Condition::StarRating(band) => band.contains(f64::from(hotel.star_rating)),
            Condition::AverageRating(band) => band.contains(hotel.average_rating),
            Condition::Available(window) => {
                hotel_available(snapshot.room_types, window, snapshot.reserved)
            }
            Condition::HasCoordinates => hotel.latitude.is_some() && hotel.longitude.is_some(),
            Condition::WithinDistance { origin, band } => hotel
                .location()
                .map_or(false, |point| band.contains(distance_km(*origin, point))),
        }
    }
}

fn document_words(hotel: &Hotel) -> Vec<String> {
    let mut document = vec![hotel.name.as_str(), hotel.address.as_str()];
    if let Some(name_en) = hotel.name_en.as_deref() {
        document.push(name_en);
    }
    document.extend(hotel.tags.iter().map(String::as_str));
    document.extend(hotel.facilities.iter().map(String::as_str));
    document.extend(hotel.nearby_attractions.iter().map(String::as_str));

    document
        .into_iter()
        .flat_map(keyword_tokens)
        .collect()
}

/// AND-combination of conditions in a fixed order
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    /// Empty filters contribute nothing. Coordinates are required whenever
    /// distance is filtered on or sorted by.
    pub fn build(query: &SearchQuery, plan: &SortPlan) -> Self {
        let mut conditions = vec![Condition::Visible];

        if let Some(keyword) = query.keyword.as_deref() {
            let tokens = keyword_tokens(keyword);
            if !tokens.is_empty() {
                conditions.push(Condition::Keyword(tokens));
            }
        }

        if !query.facilities.is_empty() {
            conditions.push(Condition::FacilitiesOverlap(query.facilities.clone()));
        }

        let rules = &query.rules;
        if let Some(band) = rules.price {
            conditions.push(Condition::PriceBand(band));
        }
        if let Some(band) = rules.star_rating {
            conditions.push(Condition::StarRating(band));
        }
        if let Some(band) = rules.average_rating {
            conditions.push(Condition::AverageRating(band));
        }
        if let Some(window) = rules.check_date {
            conditions.push(Condition::Available(window));
        }

        let distance_filter = query.location.zip(rules.distance);
        if distance_filter.is_some() || plan.key == SortKey::Distance {
            conditions.push(Condition::HasCoordinates);
        }
        if let Some((origin, band)) = distance_filter {
            conditions.push(Condition::WithinDistance { origin, band });
        }

        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, snapshot: &HotelSnapshot<'_>) -> bool {
        self.conditions.iter().all(|c| c.matches(snapshot))
    }
}

/// Typed bind value for a rendered query
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
    Float(f64),
    Date(NaiveDate),
}

/// SQL text plus the values for its `$n` placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Renders a `ConditionSet` over `hotels h`
#[derive(Debug, Clone, Default)]
pub struct SqlQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<SqlParam>,
}

impl SqlQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_conditions(set: &ConditionSet) -> Self {
        let mut builder = Self::new();
        for condition in set.conditions() {
            builder.add_condition(condition);
        }
        builder
    }

    /// Appends a bind value and returns its placeholder
    fn push_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn band_clause(&mut self, column: &str, band: &Band) -> String {
        let min = self.push_param(SqlParam::Float(band.min));
        if band.has_upper() {
            let max = self.push_param(SqlParam::Float(band.max));
            format!("{} >= {} AND {} <= {}", column, min, column, max)
        } else {
            format!("{} >= {}", column, min)
        }
    }

    pub fn add_condition(&mut self, condition: &Condition) {
        let clause = match condition {
            Condition::Visible => "h.deleted_at IS NULL AND h.status = 'approved'".to_string(),
            Condition::Keyword(tokens) => {
                let query = self.push_param(SqlParam::Text(prefix_tsquery(tokens)));
                format!(
                    "to_tsvector('simple', {}) @@ to_tsquery('simple', {})",
                    KEYWORD_DOCUMENT_SQL, query
                )
            }
            Condition::FacilitiesOverlap(facilities) => {
                let wanted = self.push_param(SqlParam::TextArray(facilities.clone()));
                format!("h.facilities && {}", wanted)
            }
            Condition::PriceBand(band) => {
                let range = self.band_clause("rt.price::float8", band);
                format!(
                    "EXISTS (SELECT 1 FROM room_types rt WHERE rt.hotel_id = h.id \
                     AND rt.deleted_at IS NULL AND {})",
                    range
                )
            }
            Condition::StarRating(band) => self.band_clause("h.star_rating", band),
            Condition::AverageRating(band) => self.band_clause("h.average_rating", band),
            Condition::Available(window) => {
                let check_in = self.push_param(SqlParam::Date(window.check_in()));
                let check_out = self.push_param(SqlParam::Date(window.check_out()));
                availability_sql(&check_in, &check_out)
            }
            Condition::HasCoordinates => {
                "h.latitude IS NOT NULL AND h.longitude IS NOT NULL".to_string()
            }
            Condition::WithinDistance { origin, band } => {
                let lat = self.push_param(SqlParam::Float(origin.latitude));
                let lng = self.push_param(SqlParam::Float(origin.longitude));
                self.band_clause(&distance_sql(&lat, &lng), band)
            }
        };
        self.where_clauses.push(format!("({})", clause));
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// `SELECT COUNT(*)` over the filtered set
    pub fn build_count(&self) -> BuiltQuery {
        BuiltQuery {
            sql: format!("SELECT COUNT(*) FROM hotels h{}", self.where_sql()),
            params: self.params.clone(),
        }
    }

    /// Ordered candidate ids. Price plans fall back to id order since the
    /// caller sorts after pricing. `page = None` returns every candidate.
    pub fn build_ids(
        &self,
        plan: &SortPlan,
        origin: Option<GeoPoint>,
        page: Option<PageRequest>,
    ) -> BuiltQuery {
        let mut params = self.params.clone();
        let direction = plan.direction.as_sql();

        let order_by = match (plan.key, origin) {
            (SortKey::Distance, Some(origin)) => {
                params.push(SqlParam::Float(origin.latitude));
                let lat = format!("${}", params.len());
                params.push(SqlParam::Float(origin.longitude));
                let lng = format!("${}", params.len());
                format!("{} {}, h.id ASC", distance_sql(&lat, &lng), direction)
            }
            (SortKey::Rating, _) => format!("h.average_rating {}, h.id ASC", direction),
            (SortKey::CreatedAt, _) => format!("h.created_at {}, h.id ASC", direction),
            _ => "h.id ASC".to_string(),
        };

        let mut sql = format!("SELECT h.id FROM hotels h{} ORDER BY {}", self.where_sql(), order_by);
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.page_size, page.offset()));
        }

        BuiltQuery { sql, params }
    }
}
