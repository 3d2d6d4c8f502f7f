// Validation utilities module
// Custom validation functions used by the request DTOs

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::bookings::models::CreateBookingRequest;

/// Longest stay a single booking may cover
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Largest amount the `NUMERIC(12, 2)` total column holds
pub fn max_total_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Validates that check-out is after check-in by 1 to `MAX_STAY_NIGHTS` nights
pub fn validate_stay_window(request: &CreateBookingRequest) -> Result<(), ValidationError> {
    let nights = (request.check_out - request.check_in).num_days();

    if nights < 1 {
        let mut error = ValidationError::new("check_out_not_after_check_in");
        error.message = Some(Cow::from("checkOut must be at least one day after checkIn"));
        return Err(error);
    }

    if nights > MAX_STAY_NIGHTS {
        let mut error = ValidationError::new("stay_too_long");
        error.message = Some(Cow::from(format!(
            "A booking covers at most {} nights",
            MAX_STAY_NIGHTS
        )));
        return Err(error);
    }

    Ok(())
}

/// Validates a computed stay total against the storable range
pub fn validate_total_price(total: Option<Decimal>) -> Result<Decimal, ValidationErrors> {
    match total {
        Some(total) if total <= max_total_price() => Ok(total),
        _ => {
            let mut error = ValidationError::new("total_price_out_of_range");
            error.message = Some(Cow::from("Stay total exceeds the largest bookable amount"));

            let mut errors = ValidationErrors::new();
            errors.add("totalPrice", error);
            Err(errors)
        }
    }
}
