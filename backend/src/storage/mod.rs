//! # Storage Module
//!
//! SQLite persistence for bookings, wallets and the service catalog.
//!
//! Money is stored as integer cents so that the wallet debit can be a
//! single compare-and-debit statement; dates are ISO `YYYY-MM-DD` text so
//! range overlap compares lexically; timestamps are RFC 3339 text.
//!
//! Repositories expose pool-backed methods for plain reads and writes, and
//! `*_in` associated functions taking a `&mut SqliteConnection` for steps
//! that must run inside a caller-owned SQL transaction.

pub mod connection;
pub mod repositories;

pub use connection::DbConnection;
pub use repositories::{BookingRepository, CatalogRepository, WalletRepository};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::pricing::round_currency;

/// Amount in whole cents; amounts beyond the `i64` range are refused
pub(crate) fn to_cents(amount: Decimal) -> Result<i64, sqlx::Error> {
    let mut rounded = round_currency(amount);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa()).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) fn parse_enum<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, sqlx::Error> {
    value.parse::<T>().map_err(|e| sqlx::Error::Decode(e.into()))
}
