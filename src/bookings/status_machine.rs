use crate::bookings::{error::BookingError, models::BookingStatus};

/// Lifecycle actions a caller can request on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Cancel,
    Complete,
}

impl BookingAction {
    /// Status the booking ends up in
    pub fn target(&self) -> BookingStatus {
        match self {
            BookingAction::Confirm => BookingStatus::Confirmed,
            BookingAction::Cancel => BookingStatus::Cancelled,
            BookingAction::Complete => BookingStatus::Completed,
        }
    }

    /// Whether the transition gives the reserved stock unit back
    pub fn restocks(&self) -> bool {
        matches!(self, BookingAction::Cancel)
    }
}

/// Service for managing booking status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Confirmed, Cancelled
    /// - Confirmed → Cancelled, Completed
    /// - Cancelled, Completed → (terminal, nothing, not even themselves)
    pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
        matches!(
            (from, to),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, a conflict error otherwise
    pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus, BookingError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(BookingError::InvalidTransition { from, to })
        }
    }

    /// Statuses from which `to` can be reached; used as the guard of the
    /// conditional status update
    pub fn sources_for(to: BookingStatus) -> &'static [BookingStatus] {
        match to {
            BookingStatus::Confirmed => &[BookingStatus::Pending],
            BookingStatus::Cancelled => &[BookingStatus::Pending, BookingStatus::Confirmed],
            BookingStatus::Completed => &[BookingStatus::Confirmed],
            BookingStatus::Pending => &[],
        }
    }
}
