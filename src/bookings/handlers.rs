// HTTP handlers for booking endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::bookings::models::{BookingListQuery, BookingResponse, CreateBookingRequest};
use crate::error::ApiError;
use crate::AppState;

/// Handler for POST /api/bookings
/// Reserves one unit of the room type for the authenticated customer
#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as pending", body = BookingResponse),
        (status = 400, description = "Invalid request or promotion"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Only customers can book"),
        (status = 404, description = "Hotel or room type not found"),
        (status = 409, description = "Room type sold out")
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let today = chrono::Local::now().date_naive();
    let booking = state.booking_service.create(&user, request, today).await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// Handler for GET /api/bookings
/// Caller's own bookings, newest first
#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings of the caller", body = Vec<BookingResponse>),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.booking_service.list(&user, query.status).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// Handler for GET /api/bookings/:id
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking found", body = BookingResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the guest, the hotel's merchant or an admin"),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    tracing::debug!("Fetching booking {} for user {}", id, user.user_id);

    let booking = state.booking_service.get(&user, id).await?;
    Ok(Json(booking.into()))
}

/// Handler for PATCH /api/bookings/:id/confirm
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking confirmed", body = BookingResponse),
        (status = 403, description = "Not the hotel's merchant or an admin"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not pending")
    ),
    tag = "bookings"
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.booking_service.confirm(&user, id).await?;
    Ok(Json(booking.into()))
}

/// Handler for PATCH /api/bookings/:id/cancel
/// Gives the reserved stock unit back
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 403, description = "Not the guest, the hotel's merchant or an admin"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is already cancelled or completed")
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.booking_service.cancel(&user, id).await?;
    Ok(Json(booking.into()))
}

/// Handler for PATCH /api/bookings/:id/complete
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/complete",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking completed", body = BookingResponse),
        (status = 403, description = "Not the hotel's merchant or an admin"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not confirmed")
    ),
    tag = "bookings"
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.booking_service.complete(&user, id).await?;
    Ok(Json(booking.into()))
}

/// Handler for DELETE /api/bookings/:id
/// Soft delete, admin only
#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Booking not found")
    ),
    tag = "bookings"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.booking_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
