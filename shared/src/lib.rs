use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of stay offered by the facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceType {
    /// Overnight stay, billed per night between the two dates
    Boarding,
    /// Day visits, billed per calendar day including both ends
    Daycare,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Boarding => "Boarding",
            ServiceType::Daycare => "Daycare",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Boarding" | "boarding" => Ok(ServiceType::Boarding),
            "Daycare" | "daycare" => Ok(ServiceType::Daycare),
            other => Err(format!("Unknown service type: {}", other)),
        }
    }
}

/// Lifecycle status of a single booking row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    Declined,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::CheckedIn => "CheckedIn",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Declined => "Declined",
            BookingStatus::NoShow => "NoShow",
        }
    }

    /// Terminal bookings are kept for history and billing but never move again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed
                | BookingStatus::Cancelled
                | BookingStatus::Declined
                | BookingStatus::NoShow
        )
    }

    /// Bookings in these states hold a place in the facility for their dates
    pub fn holds_capacity(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::CheckedIn
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "CheckedIn" => Ok(BookingStatus::CheckedIn),
            "Completed" => Ok(BookingStatus::Completed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "Declined" => Ok(BookingStatus::Declined),
            "NoShow" => Ok(BookingStatus::NoShow),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// What the current `total_price` of a booking represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargeKind {
    /// Price of the stay itself (taxable)
    Stay,
    /// Flat fee for cancelling inside the cutoff window (tax-exempt)
    LateCancellationFee,
    /// Flat fee for not showing up (tax-exempt)
    NoShowFee,
}

impl ChargeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeKind::Stay => "Stay",
            ChargeKind::LateCancellationFee => "LateCancellationFee",
            ChargeKind::NoShowFee => "NoShowFee",
        }
    }

    pub fn is_penalty(&self) -> bool {
        !matches!(self, ChargeKind::Stay)
    }
}

impl FromStr for ChargeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stay" => Ok(ChargeKind::Stay),
            "LateCancellationFee" => Ok(ChargeKind::LateCancellationFee),
            "NoShowFee" => Ok(ChargeKind::NoShowFee),
            other => Err(format!("Unknown charge kind: {}", other)),
        }
    }
}

/// Role of the authenticated caller, as supplied by the auth layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Client,
    Staff,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "staff" => Ok(Role::Staff),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A booking as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub service_type: ServiceType,
    /// First day of the stay (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the stay (inclusive)
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub charge_kind: ChargeKind,
    pub is_paid: bool,
    pub notes: String,
    pub processed_by: Option<String>,
    pub status_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub owner_id: String,
    /// One booking row is created per pet
    pub pet_ids: Vec<String>,
    pub service_type: ServiceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}

/// Body for staff actions that carry an optional note (accept, decline, no-show, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingActionRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
    /// Staff only: force (`true`) or waive (`false`) the late-cancellation fee
    #[serde(default)]
    pub assess_penalty: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleRequest {
    pub owner_id: String,
    pub booking_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleAllRequest {
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub owner_id: String,
    /// Total debited from the wallet
    pub amount_charged: Decimal,
    /// Tax portion of `amount_charged`
    pub tax: Decimal,
    pub service_subtotal: Decimal,
    pub penalty_subtotal: Decimal,
    pub booking_ids: Vec<String>,
    pub balance_after: Decimal,
    pub settled_at: DateTime<Utc>,
}

/// Read-only price breakdown for a set of bookings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementQuote {
    pub service_subtotal: Decimal,
    pub penalty_subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    pub booking_ids: Vec<String>,
}

/// Bookings of one owner sharing a date range (a client "order")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderGroup {
    pub owner_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bookings: Vec<Booking>,
}

/// Bookings sharing service and date range, billed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingGroup {
    pub owner_id: String,
    pub service_type: ServiceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingGroup {
    pub group: BillingGroup,
    pub quote: SettlementQuote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub occupancy: u32,
    pub remaining: u32,
    pub full: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub capacity: u32,
    pub days: Vec<AvailabilityDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub owner_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry in a wallet's running ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: String,
    pub owner_id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    /// Positive for top-ups, negative for settlements
    pub amount: Decimal,
    /// Wallet balance after this entry
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransactionListResponse {
    pub transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_type: ServiceType,
    /// Price per night (boarding) or per day (daycare)
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRateRequest {
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPetRequest {
    pub pet_id: String,
    pub owner_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. `payment_required`
    pub code: String,
    pub message: String,
}
