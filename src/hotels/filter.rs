// Filter normalizer
//
// Search parameters arrive either as legacy flat scalars (`radius`,
// `checkIn`/`checkOut`, `priceMin`/`priceMax`, `starRating`) or as a
// structured `rules` object of range tuples. Both shapes are folded into one
// `SearchQuery` here and nothing past this module sees the raw parameters.
//
// Normalization never fails: values of the wrong shape are dropped.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::hotels::{
    availability::DateWindow,
    geo::GeoPoint,
    sort::{SortKey, SortRequest},
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw search parameters from the query string (GET) or JSON body (POST)
///
/// Every field is kept as an untyped JSON value so malformed input degrades to
/// "filter not applied" instead of a rejected request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    /// Whitespace separated, prefix matched search terms
    #[schema(value_type = Option<String>, example = "bund river")]
    pub keyword: Option<Value>,
    #[schema(value_type = Option<f64>, example = 31.23)]
    #[serde(alias = "lat")]
    pub latitude: Option<Value>,
    #[schema(value_type = Option<f64>, example = 121.47)]
    #[serde(alias = "lng")]
    pub longitude: Option<Value>,
    /// Legacy radius in km, same as `rules.distance = [0, radius]`
    #[schema(value_type = Option<f64>)]
    pub radius: Option<Value>,
    #[schema(value_type = Option<String>, example = "2024-06-01")]
    pub check_in: Option<Value>,
    #[schema(value_type = Option<String>, example = "2024-06-03")]
    pub check_out: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub price_min: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub price_max: Option<Value>,
    /// Legacy exact star rating, same as `rules.starRating = [s, s]`
    #[schema(value_type = Option<f64>)]
    pub star_rating: Option<Value>,
    /// List of facilities or a comma separated string
    #[schema(value_type = Option<Vec<String>>)]
    pub facilities: Option<Value>,
    /// One of `distance`, `price`, `rating`, `createdAt`
    #[schema(value_type = Option<String>)]
    pub sort_by: Option<Value>,
    #[schema(value_type = Option<bool>)]
    pub reversed: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub page: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub page_size: Option<Value>,
    /// Structured filters: `distance`, `checkDate`, `price`, `starRating`,
    /// `avarageRating` as `[min, max]` tuples; a JSON string in query strings
    #[schema(value_type = Option<Object>)]
    pub rules: Option<Value>,
}

/// Inclusive numeric range; `max` may be `+inf`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn new(min: f64, max: f64) -> Option<Self> {
        let valid = min.is_finite() && !max.is_nan() && max != f64::NEG_INFINITY && min <= max;
        valid.then_some(Self { min, max })
    }

    /// Missing bounds default to `0` and `+inf`
    fn from_bounds(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            return None;
        }
        Self::new(min.unwrap_or(0.0), max.unwrap_or(f64::INFINITY))
    }

    pub fn has_upper(&self) -> bool {
        self.max.is_finite()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The canonical filter set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRules {
    pub distance: Option<Band>,
    pub check_date: Option<DateWindow>,
    pub price: Option<Band>,
    pub star_rating: Option<Band>,
    pub average_rating: Option<Band>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Normalized search request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub facilities: Vec<String>,
    pub rules: FilterRules,
    pub location: Option<GeoPoint>,
    pub sort: SortRequest,
    pub page: PageRequest,
}

/// Turns `SearchParams` into a `SearchQuery`
pub struct FilterNormalizer;

impl FilterNormalizer {
    /// Structured `rules` win over legacy values for the same concern
    pub fn normalize(params: &SearchParams, max_page_size: u32) -> SearchQuery {
        let rules = params.rules.as_ref().and_then(rules_object);
        let rules = rules.as_ref();
        let rule = move |key: &str| rules.and_then(|r| r.get(key));

        let legacy_distance = params
            .radius
            .as_ref()
            .and_then(number)
            .and_then(|r| Band::new(0.0, r));
        let legacy_window = match (
            params.check_in.as_ref().and_then(date),
            params.check_out.as_ref().and_then(date),
        ) {
            (Some(check_in), Some(check_out)) => DateWindow::new(check_in, check_out),
            _ => None,
        };
        let legacy_price = Band::from_bounds(
            params.price_min.as_ref().and_then(number),
            params.price_max.as_ref().and_then(number),
        );
        let legacy_star = params.star_rating.as_ref().and_then(|v| match v {
            Value::Array(_) => band(v),
            _ => number(v).and_then(|s| Band::new(s, s)),
        });

        let filter_rules = FilterRules {
            distance: rule("distance").and_then(band).or(legacy_distance),
            check_date: rule("checkDate").and_then(date_window).or(legacy_window),
            price: rule("price").and_then(band).or(legacy_price),
            star_rating: rule("starRating").and_then(band).or(legacy_star),
            average_rating: rule("avarageRating")
                .or_else(|| rule("averageRating"))
                .and_then(band),
        };

        let location = match (
            params.latitude.as_ref().and_then(number),
            params.longitude.as_ref().and_then(number),
        ) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
            _ => None,
        };

        let sort = SortRequest {
            key: params
                .sort_by
                .as_ref()
                .and_then(text)
                .and_then(|s| SortKey::parse(&s)),
            reversed: params.reversed.as_ref().and_then(boolean).unwrap_or(false),
        };

        SearchQuery {
            keyword: params.keyword.as_ref().and_then(text),
            facilities: params.facilities.as_ref().map(text_list).unwrap_or_default(),
            rules: filter_rules,
            location,
            sort,
            page: page_request(params, max_page_size),
        }
    }
}

fn page_request(params: &SearchParams, max_page_size: u32) -> PageRequest {
    let max_page_size = max_page_size.max(1);
    let page = params
        .page
        .as_ref()
        .and_then(number)
        .map(clamp_to_u32)
        .unwrap_or(1);
    let page_size = params
        .page_size
        .as_ref()
        .and_then(number)
        .map(clamp_to_u32)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    PageRequest {
        page: page.max(1),
        page_size: page_size.clamp(1, max_page_size),
    }
}

fn clamp_to_u32(value: f64) -> u32 {
    value.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}

fn rules_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Finite number from a JSON number or a numeric string
fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

/// Array of strings or one comma separated string; blanks and repeats dropped
fn text_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(values) => values.iter().filter_map(text).collect(),
        Value::String(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
        _ => Vec::new(),
    };

    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_empty() && !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

fn band(value: &Value) -> Option<Band> {
    let bounds = value.as_array()?;
    Band::from_bounds(
        bounds.first().and_then(number),
        bounds.get(1).and_then(number),
    )
}

fn date_window(value: &Value) -> Option<DateWindow> {
    let bounds = value.as_array()?;
    DateWindow::new(bounds.first().and_then(date)?, bounds.get(1).and_then(date)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params(value: Value) -> SearchParams {
        serde_json::from_value(value).unwrap()
    }

    fn normalize(value: Value) -> SearchQuery {
        FilterNormalizer::normalize(&params(value), 100)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_empty_params_produce_defaults() {
        let query = normalize(json!({}));

        assert_eq!(query, SearchQuery::default());
        assert_eq!(query.page.page, 1);
        assert_eq!(query.page.page_size, 10);
    }

    #[test]
    fn test_legacy_values_are_lifted() {
        let query = normalize(json!({
            "radius": 5,
            "checkIn": "2024-06-01",
            "checkOut": "2024-06-03",
            "priceMax": "1000",
            "starRating": 4
        }));

        assert_eq!(query.rules.distance, Band::new(0.0, 5.0));
        assert_eq!(query.rules.check_date, DateWindow::new(day(1), day(3)));
        assert_eq!(query.rules.price, Band::new(0.0, 1000.0));
        assert_eq!(query.rules.star_rating, Band::new(4.0, 4.0));
        assert_eq!(query.rules.average_rating, None);
    }

    #[test]
    fn test_price_min_only_is_open_ended() {
        let query = normalize(json!({ "priceMin": 200 }));
        let price = query.rules.price.unwrap();

        assert_eq!(price.min, 200.0);
        assert!(!price.has_upper());
    }

    #[test]
    fn test_structured_rules_win_over_legacy() {
        let query = normalize(json!({
            "radius": 5,
            "priceMin": 1,
            "priceMax": 2,
            "rules": {
                "distance": [1, 10],
                "price": [100, 500],
                "checkDate": ["2024-06-10", "2024-06-12"],
                "starRating": [3, 5],
                "avarageRating": [4.5, 5]
            },
            "checkIn": "2024-06-01",
            "checkOut": "2024-06-03"
        }));

        assert_eq!(query.rules.distance, Band::new(1.0, 10.0));
        assert_eq!(query.rules.price, Band::new(100.0, 500.0));
        assert_eq!(query.rules.check_date, DateWindow::new(day(10), day(12)));
        assert_eq!(query.rules.star_rating, Band::new(3.0, 5.0));
        assert_eq!(query.rules.average_rating, Band::new(4.5, 5.0));
    }

    #[test]
    fn test_rules_accepted_as_json_string() {
        let query = normalize(json!({
            "rules": "{\"averageRating\":[4,null],\"price\":[null,300]}"
        }));

        assert_eq!(query.rules.average_rating, Band::new(4.0, f64::INFINITY));
        assert_eq!(query.rules.price, Band::new(0.0, 300.0));
    }

    #[test]
    fn test_invalid_shapes_are_ignored() {
        let query = normalize(json!({
            "radius": "far",
            "checkIn": "2024-06-05",
            "checkOut": "2024-06-01",
            "priceMin": 500,
            "priceMax": 100,
            "starRating": {"min": 3},
            "latitude": 200,
            "longitude": 10,
            "rules": {"distance": "5", "checkDate": ["tomorrow", "2024-06-02"]},
            "sortBy": "popularity",
            "reversed": "maybe",
            "page": -3,
            "pageSize": "lots"
        }));

        assert_eq!(query.rules, FilterRules::default());
        assert_eq!(query.location, None);
        assert_eq!(query.sort, SortRequest::default());
        assert_eq!(query.page, PageRequest::default());
    }

    #[test]
    fn test_unparsable_rules_string_falls_back_to_legacy() {
        let query = normalize(json!({ "rules": "{not json", "radius": 3 }));
        assert_eq!(query.rules.distance, Band::new(0.0, 3.0));
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(normalize(json!({ "pageSize": 500 })).page.page_size, 100);
        assert_eq!(normalize(json!({ "pageSize": 0 })).page.page_size, 1);
        assert_eq!(
            FilterNormalizer::normalize(&params(json!({ "pageSize": 50 })), 20)
                .page
                .page_size,
            20
        );

        let page = normalize(json!({ "page": "3", "pageSize": "25" })).page;
        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn test_location_keyword_facilities_and_sort() {
        let query = normalize(json!({
            "keyword": "  bund view ",
            "latitude": "31.23",
            "longitude": 121.47,
            "facilities": "wifi, pool,,wifi",
            "sortBy": "price",
            "reversed": "true"
        }));

        assert_eq!(query.keyword.as_deref(), Some("bund view"));
        assert_eq!(query.location, GeoPoint::new(31.23, 121.47));
        assert_eq!(query.facilities, vec!["wifi".to_string(), "pool".to_string()]);
        assert_eq!(query.sort.key, Some(SortKey::Price));
        assert!(query.sort.reversed);
    }

    #[test]
    fn test_facilities_as_array() {
        let query = normalize(json!({ "facilities": ["gym", " ", "spa"] }));
        assert_eq!(query.facilities, vec!["gym".to_string(), "spa".to_string()]);
    }

    #[test]
    fn test_blank_keyword_is_dropped() {
        assert_eq!(normalize(json!({ "keyword": "   " })).keyword, None);
    }

    fn loose_value() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            any::<String>().prop_map(|s| Some(Value::String(s))),
            any::<i32>().prop_map(|n| Some(json!(n))),
            (-1e6f64..1e6).prop_map(|n| Some(json!(n))),
            any::<bool>().prop_map(|b| Some(Value::Bool(b))),
            Just(Some(json!([1, 2]))),
            Just(Some(json!(["2024-06-01", "2024-06-03"]))),
        ]
    }

    prop_compose! {
        fn arbitrary_params()(
            keyword in loose_value(),
            latitude in loose_value(),
            radius in loose_value(),
            check_in in loose_value(),
            check_out in loose_value(),
            price_min in loose_value(),
            price_max in loose_value(),
            star_rating in loose_value(),
            facilities in loose_value(),
            page in loose_value(),
            page_size in loose_value(),
            rules in loose_value(),
        ) -> SearchParams {
            SearchParams {
                keyword,
                longitude: latitude.clone(),
                latitude,
                radius,
                check_in,
                check_out,
                price_min,
                price_max,
                star_rating,
                facilities,
                sort_by: None,
                reversed: None,
                page,
                page_size,
                rules,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_is_deterministic(p in arbitrary_params()) {
            let first = FilterNormalizer::normalize(&p, 100);
            let second = FilterNormalizer::normalize(&p.clone(), 100);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_page_always_within_bounds(p in arbitrary_params(), max in 1u32..500) {
            let query = FilterNormalizer::normalize(&p, max);
            prop_assert!(query.page.page >= 1);
            prop_assert!(query.page.page_size >= 1);
            prop_assert!(query.page.page_size <= max);
        }

        #[test]
        fn prop_bands_are_ordered(p in arbitrary_params()) {
            let rules = FilterNormalizer::normalize(&p, 100).rules;
            for band in [rules.distance, rules.price, rules.star_rating, rules.average_rating]
                .into_iter()
                .flatten()
            {
                prop_assert!(band.min <= band.max);
                prop_assert!(!band.min.is_nan());
            }
        }
    }
}
