use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use hotel_booking_api::{
    auth::TokenService,
    bookings::{BookingService, PgBookingStore},
    config::AppConfig,
    create_router, db,
    hotels::{PgHotelRepository, SearchService},
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Hotel Booking API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let state = AppState {
        search_service: SearchService::new(
            Arc::new(PgHotelRepository::new(db_pool.clone())),
            config.search_max_page_size,
        ),
        booking_service: BookingService::new(Arc::new(PgBookingStore::new(db_pool))),
        token_service: TokenService::new(&config.jwt_secret),
    };

    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Hotel Booking API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
