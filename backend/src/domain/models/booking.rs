//! Domain model for a booking row (one pet, one date range).
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{BookingStatus, ChargeKind, ServiceType};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub service_type: ServiceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    /// Stay price, or the penalty fee once one has been assessed
    pub total_price: Decimal,
    pub charge_kind: ChargeKind,
    /// Whether the current `total_price` has been settled
    pub is_paid: bool,
    pub notes: String,
    pub processed_by: Option<String>,
    pub status_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn generate_id() -> String {
        format!("bk-{}", Uuid::new_v4())
    }

    /// Whether the ledger may collect this booking's current charge
    pub fn is_payable(&self) -> bool {
        if self.is_paid {
            return false;
        }
        match self.charge_kind {
            ChargeKind::Stay => self.status == BookingStatus::Confirmed,
            ChargeKind::LateCancellationFee | ChargeKind::NoShowFee => true,
        }
    }
}

/// A status change requested by one of the engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Decline,
    CheckIn,
    CheckOut,
    Cancel,
    MarkNoShow,
}

impl Transition {
    pub fn action(&self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::Decline => "decline",
            Transition::CheckIn => "check in",
            Transition::CheckOut => "check out",
            Transition::Cancel => "cancel",
            Transition::MarkNoShow => "mark as no-show",
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            Transition::Accept => BookingStatus::Confirmed,
            Transition::Decline => BookingStatus::Declined,
            Transition::CheckIn => BookingStatus::CheckedIn,
            Transition::CheckOut => BookingStatus::Completed,
            Transition::Cancel => BookingStatus::Cancelled,
            Transition::MarkNoShow => BookingStatus::NoShow,
        }
    }
}

/// Statuses reachable from `from` in one step
pub fn valid_transitions(from: BookingStatus) -> &'static [BookingStatus] {
    match from {
        BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Declined],
        BookingStatus::Confirmed => &[
            BookingStatus::CheckedIn,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ],
        BookingStatus::CheckedIn => &[BookingStatus::Completed],
        BookingStatus::Completed
        | BookingStatus::Cancelled
        | BookingStatus::Declined
        | BookingStatus::NoShow => &[],
    }
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    valid_transitions(from).contains(&to)
}
