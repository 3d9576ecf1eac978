//! Domain-level command and result types.
//! The REST layer maps the public DTOs in `shared` to these.

pub mod bookings {
    use chrono::NaiveDate;
    use shared::ServiceType;

    /// Request for one booking row per selected pet
    #[derive(Debug, Clone)]
    pub struct CreateBookingCommand {
        pub owner_id: String,
        pub pet_ids: Vec<String>,
        pub service_type: ServiceType,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub notes: String,
    }

    /// Staff action on one booking with an optional note
    #[derive(Debug, Clone)]
    pub struct BookingActionCommand {
        pub booking_id: String,
        pub note: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct CancelBookingCommand {
        pub booking_id: String,
        pub reason: Option<String>,
        /// Staff override; `None` assesses the fee only inside the cutoff window
        pub assess_penalty: Option<bool>,
    }
}

pub mod settlement {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    #[derive(Debug, Clone)]
    pub struct SettleCommand {
        pub owner_id: String,
        pub booking_ids: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct SettlementQuote {
        pub service_subtotal: Decimal,
        pub penalty_subtotal: Decimal,
        pub tax: Decimal,
        pub grand_total: Decimal,
        pub booking_ids: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct SettlementReceipt {
        pub owner_id: String,
        pub quote: SettlementQuote,
        pub balance_after: Decimal,
        pub settled_at: DateTime<Utc>,
    }
}
