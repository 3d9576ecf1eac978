//! Read-side grouping of flat booking rows.
//!
//! Orders are `(owner, start, end)` clusters used for batch staff actions;
//! billing groups are `(owner, service, start, end)` clusters used for
//! payment, so a cross-owner staff view never merges two owners' charges.
//! Groups come out newest start date first; groups with equal start dates
//! and rows within a group keep their input (creation) order.

use chrono::NaiveDate;
use shared::ServiceType;

use super::models::booking::Booking;

#[derive(Debug, Clone, PartialEq)]
pub struct Group<K> {
    pub key: K,
    pub bookings: Vec<Booking>,
}

pub type OrderKey = (String, NaiveDate, NaiveDate);
pub type BillingKey = (String, ServiceType, NaiveDate, NaiveDate);

fn group_by<K, F>(bookings: &[Booking], key_of: F) -> Vec<Group<K>>
where
    K: PartialEq,
    F: Fn(&Booking) -> K,
{
    let mut groups: Vec<Group<K>> = Vec::new();
    for booking in bookings {
        let key = key_of(booking);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.bookings.push(booking.clone()),
            None => groups.push(Group {
                key,
                bookings: vec![booking.clone()],
            }),
        }
    }
    // stable: ties keep first-seen order
    groups.sort_by(|a, b| b.bookings[0].start_date.cmp(&a.bookings[0].start_date));
    groups
}

pub fn group_orders(bookings: &[Booking]) -> Vec<Group<OrderKey>> {
    group_by(bookings, |b| (b.owner_id.clone(), b.start_date, b.end_date))
}

pub fn group_billing(bookings: &[Booking]) -> Vec<Group<BillingKey>> {
    group_by(bookings, |b| {
        (b.owner_id.clone(), b.service_type, b.start_date, b.end_date)
    })
}
