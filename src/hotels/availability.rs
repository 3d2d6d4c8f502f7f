// Half-open date window overlap between a requested stay and existing bookings

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::hotels::models::RoomType;

/// Booking statuses that hold a unit of stock for their window
pub const BLOCKING_STATUSES: [&str; 2] = ["pending", "confirmed"];

/// A `[check_in, check_out)` stay of at least one night
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl DateWindow {
    /// Returns `None` unless `check_out` is strictly after `check_in`
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_out > check_in).then_some(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights, always >= 1
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// `self.check_in < other_out && self.check_out > other_in`
    pub fn overlaps(&self, other_in: NaiveDate, other_out: NaiveDate) -> bool {
        self.check_in < other_out && self.check_out > other_in
    }
}

/// A stay on a room type held by a pending or confirmed booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedWindow {
    pub room_type_id: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// No reservation on the room type overlaps the window
pub fn room_type_available(
    room_type_id: i32,
    window: &DateWindow,
    reserved: &[ReservedWindow],
) -> bool {
    !reserved
        .iter()
        .filter(|r| r.room_type_id == room_type_id)
        .any(|r| window.overlaps(r.check_in, r.check_out))
}

/// At least one non-deleted room type is free for the window
pub fn hotel_available(
    room_types: &[RoomType],
    window: &DateWindow,
    reserved: &[ReservedWindow],
) -> bool {
    room_types
        .iter()
        .filter(|rt| !rt.is_deleted())
        .any(|rt| room_type_available(rt.id, window, reserved))
}

/// SQL predicate over hotel alias `h`; `check_in_ref`/`check_out_ref` are placeholders
pub fn availability_sql(check_in_ref: &str, check_out_ref: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM room_types rt WHERE rt.hotel_id = h.id AND rt.deleted_at IS NULL \
         AND NOT EXISTS (SELECT 1 FROM bookings b WHERE b.room_type_id = rt.id \
         AND b.status IN ('{}', '{}') AND b.check_in < {} AND b.check_out > {}))",
        BLOCKING_STATUSES[0], BLOCKING_STATUSES[1], check_out_ref, check_in_ref
    )
}
