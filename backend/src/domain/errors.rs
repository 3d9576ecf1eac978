//! Error taxonomy for the booking and settlement engine.
//!
//! Every rejected operation returns one of these and leaves all entities
//! exactly as they were before the call.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::BookingStatus;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("End date {end} is before start date {start}")]
    ReversedRange { start: NaiveDate, end: NaiveDate },
    #[error("At least one pet must be selected")]
    EmptyPetSelection,
    #[error("Stay of {days} days exceeds the maximum of {max_days} days")]
    StayTooLong { days: i64, max_days: i64 },
    #[error("No bookings were selected for settlement")]
    EmptySettlement,
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Amount {amount} exceeds the limit of {max}")]
    AmountTooLarge { amount: Decimal, max: Decimal },
    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Date {date} is at capacity")]
    CapacityConflict { date: NaiveDate },

    #[error("Cannot {action} booking {booking_id} while it is {from}")]
    StateTransition {
        booking_id: String,
        from: BookingStatus,
        action: &'static str,
    },

    #[error("Booking {booking_id} can no longer be cancelled by the client (cutoff was {cutoff})")]
    LateCancellation {
        booking_id: String,
        cutoff: DateTime<Utc>,
    },

    #[error("Booking {booking_id} must be paid before check-in")]
    PaymentRequired { booking_id: String },

    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Booking {booking_id} is already paid")]
    AlreadySettled { booking_id: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Not allowed to {action}")]
    PermissionDenied { action: &'static str },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        BookingError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Stable code surfaced to API callers
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation_error",
            BookingError::CapacityConflict { .. } => "capacity_conflict",
            BookingError::StateTransition { .. } => "invalid_transition",
            BookingError::LateCancellation { .. } => "late_cancellation",
            BookingError::PaymentRequired { .. } => "payment_required",
            BookingError::InsufficientFunds { .. } => "insufficient_funds",
            BookingError::AlreadySettled { .. } => "already_settled",
            BookingError::NotFound { .. } => "not_found",
            BookingError::PermissionDenied { .. } => "permission_denied",
            BookingError::Storage(_) => "storage_error",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
