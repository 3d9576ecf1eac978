//! Shared fixture for the service tests: an in-memory database, a pinned
//! clock and every service wired the same way the server wires them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

use crate::config::EnginePolicy;
use crate::domain::commands::bookings::{BookingActionCommand, CreateBookingCommand};
use crate::domain::context::{FixedClock, RequestContext};
use crate::domain::errors::BookingResult;
use crate::domain::models::booking::Booking;
use crate::domain::models::catalog::Pet;
use crate::domain::notifications::{BookingEvent, BookingNotifier};
use crate::domain::{BookingService, CatalogService, Services, SettlementService, WalletService};
use crate::storage::DbConnection;
use shared::ServiceType;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<BookingEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<BookingEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn booking_changed(&self, event: &BookingEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct TestHelper {
    pub db: DbConnection,
    pub clock: FixedClock,
    pub notifier: Arc<RecordingNotifier>,
    pub bookings: BookingService,
    pub settlement: SettlementService,
    pub wallets: WalletService,
    pub catalog: CatalogService,
}

impl TestHelper {
    pub async fn new() -> Self {
        Self::with_policy(EnginePolicy::default()).await
    }

    pub async fn with_capacity(capacity: u32) -> Self {
        let mut policy = EnginePolicy::default();
        policy.daily_capacity = capacity;
        Self::with_policy(policy).await
    }

    pub async fn with_policy(policy: EnginePolicy) -> Self {
        let db = DbConnection::init_test().await.unwrap();
        let clock = FixedClock::new(at(2025, 1, 1, 9));
        let notifier = Arc::new(RecordingNotifier::default());
        let services = Services::new(
            db.clone(),
            Arc::new(policy),
            Arc::new(clock.clone()),
            notifier.clone(),
        );
        services.catalog.seed_default_rates().await.unwrap();

        Self {
            db,
            clock,
            notifier,
            bookings: services.bookings,
            settlement: services.settlement,
            wallets: services.wallets,
            catalog: services.catalog,
        }
    }

    pub fn staff() -> RequestContext {
        RequestContext::staff("front-desk")
    }

    pub fn client(owner_id: &str) -> RequestContext {
        RequestContext::client(owner_id)
    }

    pub async fn add_pet(&self, owner_id: &str, pet_id: &str) {
        self.catalog
            .register_pet(
                &Self::staff(),
                Pet {
                    id: pet_id.to_string(),
                    owner_id: owner_id.to_string(),
                    name: pet_id.to_string(),
                },
            )
            .await
            .unwrap();
    }

    pub async fn try_book(
        &self,
        owner_id: &str,
        pet_ids: &[&str],
        service_type: ServiceType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let command = CreateBookingCommand {
            owner_id: owner_id.to_string(),
            pet_ids: pet_ids.iter().map(|p| p.to_string()).collect(),
            service_type,
            start_date,
            end_date,
            notes: String::new(),
        };
        self.bookings.create_booking(&Self::client(owner_id), command).await
    }

    pub async fn book(
        &self,
        owner_id: &str,
        pet_ids: &[&str],
        service_type: ServiceType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<Booking> {
        self.try_book(owner_id, pet_ids, service_type, start_date, end_date)
            .await
            .unwrap()
    }

    /// Register the pet, book it and have staff accept the booking
    pub async fn confirmed_booking(
        &self,
        owner_id: &str,
        pet_id: &str,
        service_type: ServiceType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Booking {
        self.add_pet(owner_id, pet_id).await;
        let created = self
            .book(owner_id, &[pet_id], service_type, start_date, end_date)
            .await;
        self.bookings
            .accept_booking(
                &Self::staff(),
                BookingActionCommand {
                    booking_id: created[0].id.clone(),
                    note: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn fund_wallet(&self, owner_id: &str, amount: Decimal) {
        self.wallets.open_wallet(&Self::staff(), owner_id).await.unwrap();
        self.wallets
            .top_up(&Self::staff(), owner_id, amount, None)
            .await
            .unwrap();
    }

    pub async fn balance(&self, owner_id: &str) -> Decimal {
        self.wallets
            .get_wallet(&Self::staff(), owner_id)
            .await
            .unwrap()
            .balance
    }
}
