// Hotel booking API: hotel search with promotion pricing and
// stock-safe bookings over PostgreSQL

pub mod auth;
pub mod bookings;
pub mod config;
pub mod db;
pub mod error;
pub mod hotels;
pub mod validation;

use axum::{
    extract::FromRef,
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenService;
use crate::bookings::{
    handlers as booking_handlers, BookingResponse, BookingService, BookingStatus,
    CreateBookingRequest,
};
use crate::hotels::{
    filter::SearchParams,
    geo::GeoPoint,
    handlers as hotel_handlers,
    models::{HotelResult, RoomTypeResult, SearchResponse},
    SearchService,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        hotel_handlers::search_hotels_get,
        hotel_handlers::search_hotels_post,
        hotel_handlers::get_hotel,
        booking_handlers::create_booking,
        booking_handlers::list_bookings,
        booking_handlers::get_booking,
        booking_handlers::confirm_booking,
        booking_handlers::cancel_booking,
        booking_handlers::complete_booking,
        booking_handlers::delete_booking,
    ),
    components(
        schemas(
            SearchParams,
            SearchResponse,
            HotelResult,
            RoomTypeResult,
            GeoPoint,
            CreateBookingRequest,
            BookingResponse,
            BookingStatus
        )
    ),
    tags(
        (name = "hotels", description = "Hotel search and detail"),
        (name = "bookings", description = "Room bookings; requires a bearer token")
    ),
    info(
        title = "Hotel Booking API",
        version = "1.0.0",
        description = "Hotel search with promotion pricing and stock-safe bookings"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub search_service: SearchService,
    pub booking_service: BookingService,
    pub token_service: TokenService,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.token_service.clone()
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS and tracing middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route(
            "/api/hotels/search",
            get(hotel_handlers::search_hotels_get).post(hotel_handlers::search_hotels_post),
        )
        .route("/api/hotels/:id", get(hotel_handlers::get_hotel))
        .route(
            "/api/bookings",
            get(booking_handlers::list_bookings).post(booking_handlers::create_booking),
        )
        .route(
            "/api/bookings/:id",
            get(booking_handlers::get_booking).delete(booking_handlers::delete_booking),
        )
        .route(
            "/api/bookings/:id/confirm",
            patch(booking_handlers::confirm_booking),
        )
        .route(
            "/api/bookings/:id/cancel",
            patch(booking_handlers::cancel_booking),
        )
        .route(
            "/api/bookings/:id/complete",
            patch(booking_handlers::complete_booking),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod testing;
