// Discount pricing engine
//
// Folds every active, scope-matching promotion over a base price. Prices are
// recomputed on each read since promotion activity depends on the date.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::hotels::models::{Promotion, PromotionType, RoomType};

/// A promotion pushed the price outside the representable decimal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Price overflow while applying promotion {0}")]
pub struct PriceOverflow(pub i32);

/// Round to cents, half away from zero, as prices are stored
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Stateless calculator for promotion-adjusted prices
pub struct DiscountCalculator;

impl DiscountCalculator {
    /// Not deleted and `start_date <= today <= end_date`
    pub fn is_active(promotion: &Promotion, today: NaiveDate) -> bool {
        promotion.deleted_at.is_none()
            && promotion.start_date <= today
            && today <= promotion.end_date
    }

    /// Room-type scope wins over hotel scope; neither set means global
    pub fn applies_to(promotion: &Promotion, room_type: &RoomType) -> bool {
        match (promotion.room_type_id, promotion.hotel_id) {
            (Some(room_type_id), _) => room_type_id == room_type.id,
            (None, Some(hotel_id)) => hotel_id == room_type.hotel_id,
            (None, None) => true,
        }
    }

    /// Active promotions for `room_type`, in ascending id order
    pub fn applicable<'a>(
        promotions: &'a [Promotion],
        room_type: &RoomType,
        today: NaiveDate,
    ) -> Vec<&'a Promotion> {
        let mut matching: Vec<&Promotion> = promotions
            .iter()
            .filter(|p| Self::is_active(p, today) && Self::applies_to(p, room_type))
            .collect();
        matching.sort_by_key(|p| p.id);
        matching
    }

    /// Apply one promotion; the result never drops below zero
    pub fn apply(price: Decimal, promotion: &Promotion) -> Result<Decimal, PriceOverflow> {
        let next = match promotion.promotion_type {
            PromotionType::Percentage => price.checked_mul(promotion.value),
            PromotionType::Direct | PromotionType::SpendAndSave => {
                price.checked_sub(promotion.value)
            }
        };
        next.map(|price| price.max(Decimal::ZERO))
            .ok_or(PriceOverflow(promotion.id))
    }

    /// Fold promotions over `base` in the order given
    pub fn fold<'a, I>(base: Decimal, promotions: I) -> Result<Decimal, PriceOverflow>
    where
        I: IntoIterator<Item = &'a Promotion>,
    {
        promotions
            .into_iter()
            .try_fold(base.max(Decimal::ZERO), |price, promotion| {
                Self::apply(price, promotion)
            })
    }

    /// Discounted nightly price for a room type, rounded to cents
    pub fn discounted_price(
        room_type: &RoomType,
        promotions: &[Promotion],
        today: NaiveDate,
    ) -> Result<Decimal, PriceOverflow> {
        Self::fold(
            room_type.price,
            Self::applicable(promotions, room_type, today),
        )
        .map(round_money)
    }
}
