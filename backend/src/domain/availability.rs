//! # Availability Index
//!
//! Derived view over booking data answering "which dates are at capacity".
//! The index is never a source of truth: it is rebuilt from the bookings
//! that hold capacity (pending, confirmed, checked in) whenever a caller
//! needs a fresh answer.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::errors::ValidationError;
use super::models::booking::Booking;
use shared::AvailabilityDay;

#[derive(Debug, Clone)]
pub struct AvailabilityIndex {
    capacity: u32,
    occupancy: BTreeMap<NaiveDate, u32>,
}

impl AvailabilityIndex {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            occupancy: BTreeMap::new(),
        }
    }

    /// Build from booking rows; rows that no longer hold capacity are skipped
    pub fn from_bookings<'a, I>(capacity: u32, bookings: I) -> Self
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        let mut index = Self::new(capacity);
        for booking in bookings {
            if booking.status.holds_capacity() {
                index.occupy(booking.start_date, booking.end_date, 1);
            }
        }
        index
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Record `pets` more guests on every date of `[start, end]`
    pub fn occupy(&mut self, start: NaiveDate, end: NaiveDate, pets: u32) {
        for date in start.iter_days().take_while(|d| *d <= end) {
            *self.occupancy.entry(date).or_insert(0) += pets;
        }
    }

    pub fn occupancy(&self, date: NaiveDate) -> u32 {
        self.occupancy.get(&date).copied().unwrap_or(0)
    }

    pub fn remaining(&self, date: NaiveDate) -> u32 {
        self.capacity.saturating_sub(self.occupancy(date))
    }

    pub fn is_date_full(&self, date: NaiveDate) -> bool {
        self.occupancy(date) >= self.capacity
    }

    /// True if any date in `[start, end]` is full; false for a reversed range
    pub fn is_range_full(&self, start: NaiveDate, end: NaiveDate) -> bool {
        if end < start {
            return false;
        }
        self.occupancy
            .range(start..=end)
            .any(|(_, count)| *count >= self.capacity)
    }

    /// Dates at capacity, ascending
    pub fn full_dates(&self) -> Vec<NaiveDate> {
        self.occupancy
            .iter()
            .filter(|(_, count)| **count >= self.capacity)
            .map(|(date, _)| *date)
            .collect()
    }

    /// First date in `[start, end]` that cannot take `pets` more guests
    pub fn first_conflict(&self, start: NaiveDate, end: NaiveDate, pets: u32) -> Option<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .find(|date| self.occupancy(*date) + pets > self.capacity)
    }

    pub fn days(&self, from: NaiveDate, to: NaiveDate) -> Vec<AvailabilityDay> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .map(|date| AvailabilityDay {
                date,
                occupancy: self.occupancy(date),
                remaining: self.remaining(date),
                full: self.is_date_full(date),
            })
            .collect()
    }
}

/// Inclusive day count of `[start, end]`
pub fn stay_length_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

pub fn is_stay_too_long(start: NaiveDate, end: NaiveDate, max_days: i64) -> bool {
    stay_length_days(start, end) > max_days
}

/// Range and length checks run before capacity, in that order
pub fn validate_stay(start: NaiveDate, end: NaiveDate, max_days: i64) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::ReversedRange { start, end });
    }
    if is_stay_too_long(start, end, max_days) {
        return Err(ValidationError::StayTooLong {
            days: stay_length_days(start, end),
            max_days,
        });
    }
    Ok(())
}
