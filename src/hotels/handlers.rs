// HTTP handlers for hotel search and detail

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::hotels::{
    filter::SearchParams,
    models::{HotelResult, SearchResponse},
};
use crate::AppState;

/// Handler for GET /api/hotels/search
/// Legacy scalars and a JSON-encoded `rules` value in the query string
#[utoipa::path(
    get,
    path = "/api/hotels/search",
    params(
        ("keyword" = Option<String>, Query, description = "Prefix-matched search terms"),
        ("latitude" = Option<f64>, Query, description = "User latitude"),
        ("longitude" = Option<f64>, Query, description = "User longitude"),
        ("radius" = Option<f64>, Query, description = "Legacy radius in km"),
        ("checkIn" = Option<String>, Query, description = "Legacy check-in date"),
        ("checkOut" = Option<String>, Query, description = "Legacy check-out date"),
        ("priceMin" = Option<f64>, Query, description = "Legacy minimum base price"),
        ("priceMax" = Option<f64>, Query, description = "Legacy maximum base price"),
        ("starRating" = Option<f64>, Query, description = "Legacy exact star rating"),
        ("facilities" = Option<String>, Query, description = "Comma separated facilities"),
        ("sortBy" = Option<String>, Query, description = "distance, price, rating or createdAt"),
        ("reversed" = Option<bool>, Query, description = "Flip the sort direction"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page"),
        ("rules" = Option<String>, Query, description = "JSON-encoded structured filters")
    ),
    responses(
        (status = 200, description = "One page of matching hotels", body = SearchResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "hotels"
)]
pub async fn search_hotels_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let today = chrono::Local::now().date_naive();
    let response = state.search_service.search(&params, today).await?;
    Ok(Json(response))
}

/// Handler for POST /api/hotels/search
/// Same search with a JSON body and `rules` as an object
#[utoipa::path(
    post,
    path = "/api/hotels/search",
    request_body = SearchParams,
    responses(
        (status = 200, description = "One page of matching hotels", body = SearchResponse),
        (status = 400, description = "Body is not a JSON object"),
        (status = 500, description = "Internal server error")
    ),
    tag = "hotels"
)]
pub async fn search_hotels_post(
    State(state): State<AppState>,
    body: Result<Json<SearchParams>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(params) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let today = chrono::Local::now().date_naive();
    let response = state.search_service.search(&params, today).await?;
    Ok(Json(response))
}

/// Handler for GET /api/hotels/:id
/// Approved hotel with priced room types; distance when a location is given
#[utoipa::path(
    get,
    path = "/api/hotels/{id}",
    params(
        ("id" = i32, Path, description = "Hotel ID"),
        ("latitude" = Option<f64>, Query, description = "User latitude"),
        ("longitude" = Option<f64>, Query, description = "User longitude")
    ),
    responses(
        (status = 200, description = "Hotel found", body = HotelResult),
        (status = 404, description = "Hotel not found or not approved"),
        (status = 500, description = "Internal server error")
    ),
    tag = "hotels"
)]
pub async fn get_hotel(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<SearchParams>,
) -> Result<Json<HotelResult>, ApiError> {
    tracing::debug!("Fetching hotel with id: {}", id);

    let today = chrono::Local::now().date_naive();
    let hotel = state.search_service.hotel_detail(id, &params, today).await?;
    Ok(Json(hotel))
}
