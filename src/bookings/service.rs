use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Role};
use crate::bookings::{
    error::BookingError,
    models::{Booking, BookingStatus, CreateBookingRequest, NewBooking},
    repository::BookingStore,
    status_machine::{BookingAction, StatusMachine},
};
use crate::hotels::{
    models::Hotel,
    pricing::{round_money, DiscountCalculator},
};
use crate::validation::validate_total_price;

/// Booking creation and lifecycle over finite room stock
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Reserve one unit of a room type for a stay
    ///
    /// # Validation
    /// - Caller must have the customer role
    /// - `checkOut` must be after `checkIn`
    /// - Room type must exist, not be deleted and belong to `hotelId`
    /// - Hotel must be approved and not deleted
    /// - A selected promotion must be active and scoped to the room type
    /// - Stock must be positive; the decrement itself is re-checked atomically
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateBookingRequest,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        user.require_any(&[Role::Customer])?;
        request.validate()?;

        let room_type = self
            .store
            .find_room_type(request.room_type_id)
            .await?
            .filter(|rt| !rt.is_deleted() && rt.hotel_id == request.hotel_id)
            .ok_or(BookingError::RoomTypeNotFound(request.room_type_id))?;

        self.store
            .find_hotel(request.hotel_id)
            .await?
            .filter(Hotel::is_visible)
            .ok_or(BookingError::HotelNotFound(request.hotel_id))?;

        let promotion = match request.promotion_id {
            Some(promotion_id) => {
                let promotion = self
                    .store
                    .find_promotion(promotion_id)
                    .await?
                    .filter(|p| {
                        DiscountCalculator::is_active(p, today)
                            && DiscountCalculator::applies_to(p, &room_type)
                    })
                    .ok_or(BookingError::InvalidPromotion(promotion_id))?;
                Some(promotion)
            }
            None => None,
        };

        if room_type.stock <= 0 {
            tracing::warn!("Room type {} is sold out", room_type.id);
            return Err(BookingError::StockExhausted(room_type.id));
        }

        let nights = (request.check_out - request.check_in).num_days();
        let stay_total = room_type
            .price
            .checked_mul(Decimal::from(nights))
            .map(|total| total.max(Decimal::ZERO));
        let discounted = match &promotion {
            Some(promotion) => {
                stay_total.and_then(|total| DiscountCalculator::apply(total, promotion).ok())
            }
            None => stay_total,
        };
        let total_price = validate_total_price(discounted.map(round_money))?;

        let booking = self
            .store
            .create_reserving_stock(NewBooking {
                user_id: user.user_id,
                hotel_id: request.hotel_id,
                room_type_id: room_type.id,
                check_in: request.check_in,
                check_out: request.check_out,
                total_price,
                promotion_id: request.promotion_id,
            })
            .await
            .map_err(|e| {
                if matches!(e, BookingError::StockExhausted(_)) {
                    tracing::warn!("Lost the race for room type {}", room_type.id);
                }
                e
            })?;

        tracing::info!(
            "Booking {} created: user_id={}, room_type={}, nights={}, total={}",
            booking.id,
            booking.user_id,
            booking.room_type_id,
            nights,
            booking.total_price
        );
        Ok(booking)
    }

    /// `pending -> confirmed`; owning merchant or admin
    pub async fn confirm(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        self.apply(user, id, BookingAction::Confirm).await
    }

    /// `pending|confirmed -> cancelled`, giving the stock unit back;
    /// the booking's customer, owning merchant or admin
    pub async fn cancel(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        self.apply(user, id, BookingAction::Cancel).await
    }

    /// `confirmed -> completed`; owning merchant or admin
    pub async fn complete(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        self.apply(user, id, BookingAction::Complete).await
    }

    /// Soft delete; admin only, no effect on status or stock
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<(), BookingError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(BookingError::NotFound(id));
        }
        user.require_any(&[Role::Admin])?;

        if !self.store.soft_delete(id).await? {
            return Err(BookingError::NotFound(id));
        }

        tracing::info!("Booking {} deleted by admin {}", id, user.user_id);
        Ok(())
    }

    /// One booking; its customer, owning merchant or admin
    pub async fn get(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Booking, BookingError> {
        let booking = self.find(id).await?;

        if booking.user_id == user.user_id && user.role == Role::Customer {
            return Ok(booking);
        }
        if user.is_admin() || self.is_hotel_owner(user, booking.hotel_id).await? {
            return Ok(booking);
        }

        tracing::warn!("User {} may not read booking {}", user.user_id, id);
        Err(BookingError::Forbidden(
            "You can only view your own bookings".to_string(),
        ))
    }

    /// The caller's own bookings, newest first
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, BookingError> {
        self.store.find_by_user(user.user_id, status).await
    }

    async fn find(&self, id: Uuid) -> Result<Booking, BookingError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    async fn is_hotel_owner(
        &self,
        user: &AuthenticatedUser,
        hotel_id: i32,
    ) -> Result<bool, BookingError> {
        if user.role != Role::Merchant {
            return Ok(false);
        }
        Ok(self
            .store
            .find_hotel(hotel_id)
            .await?
            .map_or(false, |hotel| user.is_merchant_owner(hotel.merchant_id)))
    }

    async fn authorize(
        &self,
        user: &AuthenticatedUser,
        booking: &Booking,
        action: BookingAction,
    ) -> Result<(), BookingError> {
        if user.is_admin() || self.is_hotel_owner(user, booking.hotel_id).await? {
            return Ok(());
        }

        match action {
            BookingAction::Cancel => {
                if user.role == Role::Customer && user.user_id == booking.user_id {
                    return Ok(());
                }
                tracing::warn!("User {} may not cancel booking {}", user.user_id, booking.id);
                Err(BookingError::Forbidden(
                    "Only the guest, the hotel's merchant or an admin can cancel this booking"
                        .to_string(),
                ))
            }
            BookingAction::Confirm | BookingAction::Complete => {
                user.require_any(&[Role::Merchant, Role::Admin])?;
                tracing::warn!(
                    "Merchant {} does not own the hotel of booking {}",
                    user.user_id,
                    booking.id
                );
                Err(BookingError::Forbidden(
                    "Only the hotel's merchant or an admin can change this booking".to_string(),
                ))
            }
        }
    }

    /// Check, authorize and run one guarded status change
    async fn apply(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        action: BookingAction,
    ) -> Result<Booking, BookingError> {
        let booking = self.find(id).await?;
        self.authorize(user, &booking, action).await?;

        let to = action.target();
        StatusMachine::transition(booking.status, to)?;

        let updated = self
            .store
            .transition(id, StatusMachine::sources_for(to), to, action.restocks())
            .await?;

        match updated {
            Some(updated) => {
                tracing::info!(
                    "Booking {} moved from {} to {} by user {}",
                    id,
                    booking.status,
                    updated.status,
                    user.user_id
                );
                Ok(updated)
            }
            None => {
                // Another request changed the booking between the read and the guarded update
                let current = self.find(id).await?;
                tracing::warn!(
                    "Booking {} changed concurrently to {}, cannot move to {}",
                    id,
                    current.status,
                    to
                );
                Err(BookingError::InvalidTransition {
                    from: current.status,
                    to,
                })
            }
        }
    }
}
