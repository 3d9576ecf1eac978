//! Price computation for stays, plus the tax and rounding helpers used by
//! the settlement ledger.
//!
//! Boarding bills the nights between the two dates (a same-day turnaround
//! still bills one night). Daycare bills every calendar day in the range,
//! both ends included. The two unit semantics are intentionally different.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use shared::ServiceType;

use super::errors::ValidationError;

/// Largest single rate, fee or top-up the engine accepts
pub const MAX_CHARGE_AMOUNT: Decimal = dec!(100000.00);
/// A wallet is never credited past this balance
pub const MAX_WALLET_BALANCE: Decimal = dec!(10000000.00);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("End date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Price of {units} unit(s) at {rate} is out of range")]
    Overflow { units: i64, rate: Decimal },
}

impl From<PricingError> for ValidationError {
    fn from(err: PricingError) -> Self {
        match &err {
            PricingError::InvalidRange { start, end } => ValidationError::ReversedRange {
                start: *start,
                end: *end,
            },
            PricingError::Overflow { .. } => ValidationError::Malformed(err.to_string()),
        }
    }
}

pub fn ensure_within_limit(amount: Decimal, max: Decimal) -> Result<(), ValidationError> {
    if amount > max {
        return Err(ValidationError::AmountTooLarge { amount, max });
    }
    Ok(())
}

/// Chargeable units (nights or days) for a stay
pub fn billable_units(
    service: ServiceType,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<i64, PricingError> {
    if end < start {
        return Err(PricingError::InvalidRange { start, end });
    }
    let diff_days = (end - start).num_days();
    Ok(match service {
        ServiceType::Daycare => diff_days + 1,
        ServiceType::Boarding => diff_days.max(1),
    })
}

/// `units * rate * max(1, pet_count)`, unrounded
pub fn price(
    service: ServiceType,
    start: NaiveDate,
    end: NaiveDate,
    pet_count: u32,
    rate: Decimal,
) -> Result<Decimal, PricingError> {
    let units = billable_units(service, start, end)?;
    Decimal::from(units)
        .checked_mul(rate)
        .and_then(|subtotal| subtotal.checked_mul(Decimal::from(pet_count.max(1))))
        .ok_or(PricingError::Overflow { units, rate })
}

/// Round to currency precision (cents), half away from zero
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn tax_on(subtotal: Decimal, tax_rate: Decimal) -> Decimal {
    round_currency(subtotal * tax_rate)
}
