//! Request-scoped caller identity and the engine's source of "now".

use chrono::{DateTime, Utc};
use shared::Role;
use std::sync::{Arc, Mutex};

use super::errors::{BookingError, BookingResult};

/// Identity of the caller, supplied by the auth layer on every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub actor_id: String,
    pub role: Role,
}

impl RequestContext {
    pub fn client(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            role: Role::Client,
        }
    }

    pub fn staff(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            role: Role::Staff,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    pub fn require_staff(&self, action: &'static str) -> BookingResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(BookingError::PermissionDenied { action })
        }
    }

    /// Clients may only act for themselves; staff may act for anyone
    pub fn require_owner_or_staff(&self, owner_id: &str, action: &'static str) -> BookingResult<()> {
        if self.is_staff() || self.actor_id == owner_id {
            Ok(())
        } else {
            Err(BookingError::PermissionDenied { action })
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant, for tests and replays
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
