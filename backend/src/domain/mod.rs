//! # Domain Module
//!
//! Business logic of the booking and settlement engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   IO Layer      │  REST handlers, DTO mapping
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Domain Layer   │  ◄── This module
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Storage Layer   │  SQLite repositories
//! └─────────────────┘
//! ```
//!
//! ## Services
//!
//! - **BookingService**: creation against capacity, the status state machine,
//!   availability and grouping reads
//! - **SettlementService**: quotes and atomic wallet debits for payable bookings
//! - **WalletService**: opening wallets, top-ups, ledger history
//! - **CatalogService**: service rates and the pet ownership directory
//!
//! The pure pieces (`pricing`, `availability`, `grouping`) have no storage
//! dependency and are usable on their own.
//!
//! Every operation takes an explicit [`RequestContext`]; nothing reads
//! ambient identity or wall-clock time except through the injected [`Clock`].

pub mod availability;
pub mod booking_service;
pub mod catalog_service;
pub mod commands;
pub mod context;
pub mod errors;
pub mod grouping;
pub mod locks;
pub mod models;
pub mod notifications;
pub mod pricing;
pub mod settlement_service;
pub mod wallet_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use booking_service::BookingService;
pub use catalog_service::CatalogService;
pub use context::{Clock, FixedClock, RequestContext, SystemClock};
pub use errors::{BookingError, BookingResult, ValidationError};
pub use notifications::{BookingNotifier, LoggingNotifier};
pub use settlement_service::SettlementService;
pub use wallet_service::WalletService;

use std::sync::Arc;

use crate::config::EnginePolicy;
use crate::storage::DbConnection;
use locks::KeyedLocks;

/// Every engine service, sharing one database, policy, clock and the
/// per-owner wallet locks
#[derive(Clone)]
pub struct Services {
    pub bookings: BookingService,
    pub settlement: SettlementService,
    pub wallets: WalletService,
    pub catalog: CatalogService,
}

impl Services {
    pub fn new(
        db: DbConnection,
        policy: Arc<EnginePolicy>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Self {
        let wallet_locks = KeyedLocks::new();
        Self {
            bookings: BookingService::new(db.clone(), policy.clone(), clock.clone(), notifier),
            settlement: SettlementService::new(
                db.clone(),
                policy,
                clock.clone(),
                wallet_locks.clone(),
            ),
            wallets: WalletService::new(db.clone(), clock.clone(), wallet_locks),
            catalog: CatalogService::new(db, clock),
        }
    }
}
