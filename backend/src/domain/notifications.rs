//! Side-channel hook informed of committed booking transitions.
//!
//! Notifiers never influence engine behavior: they run after the change is
//! stored and cannot fail the operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::BookingStatus;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct BookingEvent {
    pub booking_id: String,
    pub owner_id: String,
    /// `None` for newly created bookings
    pub from: Option<BookingStatus>,
    pub to: BookingStatus,
    pub actor_id: String,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_changed(&self, event: &BookingEvent);
}

/// Default notifier: records transitions in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl BookingNotifier for LoggingNotifier {
    async fn booking_changed(&self, event: &BookingEvent) {
        info!(
            booking_id = %event.booking_id,
            owner_id = %event.owner_id,
            actor_id = %event.actor_id,
            "Booking {} -> {}",
            event.from.map(|s| s.as_str()).unwrap_or("new"),
            event.to
        );
    }
}
