//! # Booking Service
//!
//! Owns the lifecycle of booking rows: creation (one row per pet, validated
//! against the stay rules and facility capacity), the staff and client
//! transitions, and the read-side queries (availability, order and billing
//! groups).
//!
//! Every transition is written as a compare-and-set on the row as it was
//! loaded (status, payment flag and charge), so a rejected or raced
//! transition leaves the stored booking exactly as it was. A settlement
//! that lands between load and write makes the transition fail rather than
//! be overwritten.
//!
//! Penalties replace the row's charge and make it owed again, even when
//! the stay had already been paid. The earlier payment is not refunded;
//! it is recorded as a zero-amount entry in the owner's wallet ledger so
//! the replaced charge can still be traced.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::config::EnginePolicy;
use crate::domain::availability::{stay_length_days, validate_stay, AvailabilityIndex};
use crate::domain::commands::bookings::{
    BookingActionCommand, CancelBookingCommand, CreateBookingCommand,
};
use crate::domain::context::{Clock, RequestContext};
use crate::domain::errors::{BookingError, BookingResult, ValidationError};
use crate::domain::grouping::{group_billing, group_orders, BillingKey, Group, OrderKey};
use crate::domain::models::booking::{can_transition, Booking, Transition};
use crate::domain::models::wallet::WalletTransaction;
use crate::domain::notifications::{BookingEvent, BookingNotifier};
use crate::domain::pricing::{price, round_currency};
use crate::storage::{
    from_cents, BookingRepository, CatalogRepository, DbConnection, WalletRepository,
};
use shared::{AvailabilityResponse, BookingStatus, ChargeKind};

/// Longest window `list_availability` will expand in one call
pub const MAX_AVAILABILITY_WINDOW_DAYS: i64 = 366;

#[derive(Clone)]
pub struct BookingService {
    db: DbConnection,
    bookings: BookingRepository,
    catalog: CatalogRepository,
    policy: Arc<EnginePolicy>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn BookingNotifier>,
    capacity_lock: Arc<AsyncMutex<()>>,
}

impl BookingService {
    pub fn new(
        db: DbConnection,
        policy: Arc<EnginePolicy>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn BookingNotifier>,
    ) -> Self {
        Self {
            bookings: BookingRepository::new(db.clone()),
            catalog: CatalogRepository::new(db.clone()),
            db,
            policy,
            clock,
            notifier,
            capacity_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Create one `Pending` booking per selected pet, all or nothing.
    ///
    /// Validation runs in a fixed order: pet selection, date range, stay
    /// length, catalog and pet lookups, then capacity. Capacity is checked
    /// and the rows inserted while holding the facility capacity lock.
    pub async fn create_booking(
        &self,
        ctx: &RequestContext,
        command: CreateBookingCommand,
    ) -> BookingResult<Vec<Booking>> {
        ctx.require_owner_or_staff(&command.owner_id, "create bookings for another owner")?;

        if command.pet_ids.is_empty() {
            return Err(ValidationError::EmptyPetSelection.into());
        }
        let mut seen = HashSet::new();
        for pet_id in &command.pet_ids {
            if !seen.insert(pet_id.as_str()) {
                return Err(ValidationError::Malformed(format!(
                    "Pet {} is selected more than once",
                    pet_id
                ))
                .into());
            }
        }
        validate_stay(command.start_date, command.end_date, self.policy.max_stay_days)?;

        let service = self
            .catalog
            .get_service(command.service_type)
            .await?
            .ok_or_else(|| BookingError::not_found("Service", command.service_type.as_str()))?;

        for pet_id in &command.pet_ids {
            match self.catalog.get_pet(pet_id).await? {
                Some(pet) if pet.owner_id == command.owner_id => {}
                _ => return Err(BookingError::not_found("Pet", pet_id.clone())),
            }
        }

        let row_price = round_currency(
            price(
                command.service_type,
                command.start_date,
                command.end_date,
                1,
                service.rate,
            )
            .map_err(ValidationError::from)?,
        );
        let pet_count = command.pet_ids.len() as u32;

        let capacity_guard = self.capacity_lock.lock().await;

        let holding = self
            .bookings
            .list_holding_capacity(command.start_date, command.end_date)
            .await?;
        let index = AvailabilityIndex::from_bookings(self.policy.daily_capacity, &holding);
        if let Some(date) = index.first_conflict(command.start_date, command.end_date, pet_count) {
            warn!(
                owner_id = %command.owner_id,
                %date,
                "Rejecting booking request: {} pet(s) would exceed capacity",
                pet_count
            );
            return Err(BookingError::CapacityConflict { date });
        }

        let now = self.clock.now();
        let created: Vec<Booking> = command
            .pet_ids
            .iter()
            .map(|pet_id| Booking {
                id: Booking::generate_id(),
                owner_id: command.owner_id.clone(),
                pet_id: pet_id.clone(),
                service_type: command.service_type,
                start_date: command.start_date,
                end_date: command.end_date,
                status: BookingStatus::Pending,
                total_price: row_price,
                charge_kind: ChargeKind::Stay,
                is_paid: false,
                notes: command.notes.clone(),
                processed_by: None,
                status_note: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut tx = self.db.pool().begin().await?;
        for booking in &created {
            BookingRepository::insert_in(&mut tx, booking).await?;
        }
        tx.commit().await?;
        drop(capacity_guard);

        info!(
            owner_id = %command.owner_id,
            service = %command.service_type,
            "Created {} booking(s) for {} to {}",
            created.len(),
            command.start_date,
            command.end_date
        );
        for booking in &created {
            self.notify(ctx, None, booking).await;
        }
        Ok(created)
    }

    pub async fn get_booking(&self, ctx: &RequestContext, booking_id: &str) -> BookingResult<Booking> {
        let booking = self.load(booking_id).await?;
        ctx.require_owner_or_staff(&booking.owner_id, "view this booking")?;
        Ok(booking)
    }

    /// Bookings in creation order. Clients only ever see their own.
    pub async fn list_bookings(
        &self,
        ctx: &RequestContext,
        owner_id: Option<&str>,
    ) -> BookingResult<Vec<Booking>> {
        let owner_filter = self.owner_scope(ctx, owner_id)?;
        Ok(self.bookings.list(owner_filter.as_deref()).await?)
    }

    /// Pending -> Confirmed. The row is re-priced at the catalog rate in
    /// effect now; from here on the stored total is no longer recomputed.
    pub async fn accept_booking(
        &self,
        ctx: &RequestContext,
        command: BookingActionCommand,
    ) -> BookingResult<Booking> {
        ctx.require_staff("accept bookings")?;
        let booking = self.load(&command.booking_id).await?;
        ensure_transition(&booking, Transition::Accept)?;

        let service = self
            .catalog
            .get_service(booking.service_type)
            .await?
            .ok_or_else(|| BookingError::not_found("Service", booking.service_type.as_str()))?;

        let mut updated = booking.clone();
        updated.total_price = round_currency(
            price(
                booking.service_type,
                booking.start_date,
                booking.end_date,
                1,
                service.rate,
            )
            .map_err(ValidationError::from)?,
        );
        updated.status_note = command.note;
        self.commit(ctx, &booking, updated, Transition::Accept).await
    }

    pub async fn decline_booking(
        &self,
        ctx: &RequestContext,
        command: BookingActionCommand,
    ) -> BookingResult<Booking> {
        ctx.require_staff("decline bookings")?;
        let booking = self.load(&command.booking_id).await?;
        ensure_transition(&booking, Transition::Decline)?;

        let mut updated = booking.clone();
        updated.status_note = command.note;
        self.commit(ctx, &booking, updated, Transition::Decline).await
    }

    /// Confirmed -> CheckedIn, only once the stay has been paid
    pub async fn check_in(
        &self,
        ctx: &RequestContext,
        command: BookingActionCommand,
    ) -> BookingResult<Booking> {
        ctx.require_staff("check in guests")?;
        let booking = self.load(&command.booking_id).await?;
        ensure_transition(&booking, Transition::CheckIn)?;
        if !booking.is_paid {
            warn!(booking_id = %booking.id, "Check-in refused: booking is unpaid");
            return Err(BookingError::PaymentRequired {
                booking_id: booking.id,
            });
        }

        let mut updated = booking.clone();
        if command.note.is_some() {
            updated.status_note = command.note;
        }
        self.commit(ctx, &booking, updated, Transition::CheckIn).await
    }

    pub async fn check_out(
        &self,
        ctx: &RequestContext,
        command: BookingActionCommand,
    ) -> BookingResult<Booking> {
        ctx.require_staff("check out guests")?;
        let booking = self.load(&command.booking_id).await?;
        ensure_transition(&booking, Transition::CheckOut)?;

        let mut updated = booking.clone();
        if command.note.is_some() {
            updated.status_note = command.note;
        }
        self.commit(ctx, &booking, updated, Transition::CheckOut).await
    }

    /// Confirmed -> Cancelled.
    ///
    /// Clients may cancel their own booking only before the cutoff and are
    /// never charged. Staff may cancel at any time; the late-cancellation fee
    /// is assessed when `assess_penalty` says so, or by default once the
    /// cutoff has passed.
    pub async fn cancel_booking(
        &self,
        ctx: &RequestContext,
        command: CancelBookingCommand,
    ) -> BookingResult<Booking> {
        let booking = self.load(&command.booking_id).await?;
        ctx.require_owner_or_staff(&booking.owner_id, "cancel this booking")?;
        ensure_transition(&booking, Transition::Cancel)?;

        let now = self.clock.now();
        let cutoff = self.cancellation_cutoff(booking.start_date)?;
        let inside_cutoff = now >= cutoff;

        let mut updated = booking.clone();
        if ctx.is_staff() {
            if command.assess_penalty.unwrap_or(inside_cutoff) {
                apply_penalty(
                    &mut updated,
                    ChargeKind::LateCancellationFee,
                    self.policy.late_cancellation_fee,
                );
            }
        } else {
            if command.assess_penalty.is_some() {
                return Err(BookingError::PermissionDenied {
                    action: "override cancellation penalties",
                });
            }
            if inside_cutoff {
                warn!(booking_id = %booking.id, %cutoff, "Client cancellation refused inside cutoff");
                return Err(BookingError::LateCancellation {
                    booking_id: booking.id,
                    cutoff,
                });
            }
        }
        updated.status_note = command.reason;
        self.commit(ctx, &booking, updated, Transition::Cancel).await
    }

    /// Confirmed -> NoShow, replacing the stay charge with the no-show fee
    pub async fn mark_no_show(
        &self,
        ctx: &RequestContext,
        command: BookingActionCommand,
    ) -> BookingResult<Booking> {
        ctx.require_staff("mark no-shows")?;
        let booking = self.load(&command.booking_id).await?;
        ensure_transition(&booking, Transition::MarkNoShow)?;

        let mut updated = booking.clone();
        apply_penalty(&mut updated, ChargeKind::NoShowFee, self.policy.no_show_fee);
        updated.status_note = command.note;
        self.commit(ctx, &booking, updated, Transition::MarkNoShow).await
    }

    /// Per-date occupancy for `[from, to]`, rebuilt from stored bookings
    pub async fn list_availability(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BookingResult<AvailabilityResponse> {
        if to < from {
            return Err(ValidationError::ReversedRange {
                start: from,
                end: to,
            }
            .into());
        }
        if stay_length_days(from, to) > MAX_AVAILABILITY_WINDOW_DAYS {
            return Err(ValidationError::Malformed(format!(
                "Availability window is limited to {} days",
                MAX_AVAILABILITY_WINDOW_DAYS
            ))
            .into());
        }

        let holding = self.bookings.list_holding_capacity(from, to).await?;
        let index = AvailabilityIndex::from_bookings(self.policy.daily_capacity, &holding);
        Ok(AvailabilityResponse {
            capacity: index.capacity(),
            days: index.days(from, to),
        })
    }

    /// Bookings clustered by `(owner, start, end)`, newest stay first
    pub async fn order_groups(
        &self,
        ctx: &RequestContext,
        owner_id: Option<&str>,
    ) -> BookingResult<Vec<Group<OrderKey>>> {
        let bookings = self.list_bookings(ctx, owner_id).await?;
        Ok(group_orders(&bookings))
    }

    /// Bookings clustered by `(owner, service, start, end)`, newest stay first
    pub async fn billing_groups(
        &self,
        ctx: &RequestContext,
        owner_id: Option<&str>,
    ) -> BookingResult<Vec<Group<BillingKey>>> {
        let bookings = self.list_bookings(ctx, owner_id).await?;
        Ok(group_billing(&bookings))
    }

    /// Latest instant a client may still cancel a stay starting on `start`
    pub fn cancellation_cutoff(&self, start: NaiveDate) -> BookingResult<DateTime<Utc>> {
        let offset = Duration::minutes(i64::from(self.policy.facility_utc_offset_minutes));
        let notice = Duration::hours(self.policy.cancellation_cutoff_hours);
        start
            .and_time(NaiveTime::default())
            .checked_sub_signed(offset)
            .map(|utc_midnight| Utc.from_utc_datetime(&utc_midnight))
            .and_then(|midnight| midnight.checked_sub_signed(notice))
            .ok_or_else(|| {
                ValidationError::Malformed(format!(
                    "Start date {} is outside the supported calendar",
                    start
                ))
                .into()
            })
    }

    fn owner_scope(
        &self,
        ctx: &RequestContext,
        owner_id: Option<&str>,
    ) -> BookingResult<Option<String>> {
        if ctx.is_staff() {
            return Ok(owner_id.map(str::to_string));
        }
        match owner_id {
            Some(owner_id) if owner_id != ctx.actor_id => Err(BookingError::PermissionDenied {
                action: "list another owner's bookings",
            }),
            _ => Ok(Some(ctx.actor_id.clone())),
        }
    }

    async fn load(&self, booking_id: &str) -> BookingResult<Booking> {
        self.bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Booking", booking_id))
    }

    async fn commit(
        &self,
        ctx: &RequestContext,
        before: &Booking,
        mut after: Booking,
        transition: Transition,
    ) -> BookingResult<Booking> {
        after.status = transition.target();
        after.updated_at = self.clock.now();
        if ctx.is_staff() {
            after.processed_by = Some(ctx.actor_id.clone());
        }

        let mut tx = self.db.pool().begin().await?;
        if !BookingRepository::update_if_unchanged_in(&mut tx, &after, before).await? {
            tx.rollback().await?;
            let current = self.load(&before.id).await?;
            warn!(
                booking_id = %before.id,
                "Booking changed ({}, paid: {}) before {} could be applied",
                current.status,
                current.is_paid,
                transition.action()
            );
            return Err(BookingError::StateTransition {
                booking_id: before.id.clone(),
                from: current.status,
                action: transition.action(),
            });
        }
        if before.is_paid && !after.is_paid {
            record_replaced_payment(&mut tx, before, &after).await?;
        }
        tx.commit().await?;

        info!(
            booking_id = %after.id,
            actor_id = %ctx.actor_id,
            "Booking {} -> {}",
            before.status,
            after.status
        );
        self.notify(ctx, Some(before.status), &after).await;
        Ok(after)
    }

    async fn notify(&self, ctx: &RequestContext, from: Option<BookingStatus>, booking: &Booking) {
        let event = BookingEvent {
            booking_id: booking.id.clone(),
            owner_id: booking.owner_id.clone(),
            from,
            to: booking.status,
            actor_id: ctx.actor_id.clone(),
            at: booking.updated_at,
        };
        self.notifier.booking_changed(&event).await;
    }
}

fn ensure_transition(booking: &Booking, transition: Transition) -> BookingResult<()> {
    if can_transition(booking.status, transition.target()) {
        Ok(())
    } else {
        Err(BookingError::StateTransition {
            booking_id: booking.id.clone(),
            from: booking.status,
            action: transition.action(),
        })
    }
}

/// Replace the row's charge with a flat fee that is owed again
fn apply_penalty(booking: &mut Booking, kind: ChargeKind, fee: Decimal) {
    booking.total_price = round_currency(fee);
    booking.charge_kind = kind;
    booking.is_paid = false;
}

/// Zero-amount ledger line noting a paid charge that a penalty replaced.
/// The balance is left as it is.
async fn record_replaced_payment(
    conn: &mut SqliteConnection,
    before: &Booking,
    after: &Booking,
) -> BookingResult<()> {
    let Some(balance_cents) = WalletRepository::balance_in(&mut *conn, &before.owner_id).await?
    else {
        warn!(booking_id = %before.id, "Paid booking has no wallet to note the replaced charge in");
        return Ok(());
    };
    let entry = WalletTransaction {
        id: WalletTransaction::generate_id(Decimal::ZERO),
        owner_id: before.owner_id.clone(),
        date: after.updated_at,
        description: format!(
            "Paid {} charge of {} on booking {} replaced by {} of {}",
            before.charge_kind.as_str(),
            before.total_price,
            before.id,
            after.charge_kind.as_str(),
            after.total_price
        ),
        amount: Decimal::ZERO,
        balance: from_cents(balance_cents),
    };
    WalletRepository::insert_transaction_in(&mut *conn, &entry).await?;
    info!(booking_id = %before.id, owner_id = %before.owner_id, "Noted replaced payment in ledger");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::settlement::SettleCommand;
    use crate::domain::test_support::{at, date, TestHelper};
    use rust_decimal_macros::dec;
    use shared::ServiceType;

    fn action(booking_id: &str) -> BookingActionCommand {
        BookingActionCommand {
            booking_id: booking_id.to_string(),
            note: None,
        }
    }

    fn cancel(booking_id: &str, assess_penalty: Option<bool>) -> CancelBookingCommand {
        CancelBookingCommand {
            booking_id: booking_id.to_string(),
            reason: Some("plans changed".to_string()),
            assess_penalty,
        }
    }

    async fn settle_booking(helper: &TestHelper, booking: &Booking) {
        helper
            .settlement
            .settle(
                &TestHelper::client(&booking.owner_id),
                SettleCommand {
                    owner_id: booking.owner_id.clone(),
                    booking_ids: vec![booking.id.clone()],
                },
            )
            .await
            .unwrap();
    }

    /// A Feb 10 daycare booking for ann, driven into `status`
    async fn terminal_booking(helper: &TestHelper, pet_id: &str, status: BookingStatus) -> Booking {
        let staff = TestHelper::staff();
        if status == BookingStatus::Declined {
            helper.add_pet("ann", pet_id).await;
            let created = helper
                .book("ann", &[pet_id], ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
                .await;
            return helper
                .bookings
                .decline_booking(&staff, action(&created[0].id))
                .await
                .unwrap();
        }

        let booking = helper
            .confirmed_booking("ann", pet_id, ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;
        match status {
            BookingStatus::Cancelled => helper
                .bookings
                .cancel_booking(&staff, cancel(&booking.id, None))
                .await
                .unwrap(),
            BookingStatus::NoShow => helper
                .bookings
                .mark_no_show(&staff, action(&booking.id))
                .await
                .unwrap(),
            BookingStatus::Completed => {
                helper.fund_wallet("ann", dec!(100)).await;
                settle_booking(helper, &booking).await;
                helper.bookings.check_in(&staff, action(&booking.id)).await.unwrap();
                helper.bookings.check_out(&staff, action(&booking.id)).await.unwrap()
            }
            other => panic!("{} is not a terminal status", other),
        }
    }

    #[tokio::test]
    async fn test_create_booking_one_row_per_pet() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("ann", "bella").await;

        let created = helper
            .book("ann", &["rex", "bella"], ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;

        assert_eq!(created.len(), 2);
        for booking in &created {
            assert_eq!(booking.status, BookingStatus::Pending);
            assert_eq!(booking.total_price, dec!(150.00));
            assert_eq!(booking.charge_kind, ChargeKind::Stay);
            assert!(!booking.is_paid);
        }
        let total: Decimal = created.iter().map(|b| b.total_price).sum();
        assert_eq!(total, dec!(300.00));

        let stored = helper
            .bookings
            .list_bookings(&TestHelper::staff(), Some("ann"))
            .await
            .unwrap();
        assert_eq!(stored, created);
        assert_eq!(helper.notifier.events().len(), 2);
    }

    #[tokio::test]
    async fn test_create_booking_rejects_empty_pet_selection() {
        let helper = TestHelper::new().await;
        let result = helper
            .try_book("ann", &[], ServiceType::Daycare, date(2025, 1, 10), date(2025, 1, 10))
            .await;
        assert!(matches!(
            result,
            Err(BookingError::Validation(ValidationError::EmptyPetSelection))
        ));
    }

    #[tokio::test]
    async fn test_create_booking_validates_range_before_length() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;

        let reversed = helper
            .try_book("ann", &["rex"], ServiceType::Daycare, date(2025, 1, 10), date(2025, 1, 9))
            .await;
        assert!(matches!(
            reversed,
            Err(BookingError::Validation(ValidationError::ReversedRange { .. }))
        ));

        let too_long = helper
            .try_book("ann", &["rex"], ServiceType::Boarding, date(2025, 1, 1), date(2025, 1, 31))
            .await;
        assert!(matches!(
            too_long,
            Err(BookingError::Validation(ValidationError::StayTooLong { days: 31, max_days: 30 }))
        ));

        let longest = helper
            .try_book("ann", &["rex"], ServiceType::Boarding, date(2025, 1, 1), date(2025, 1, 30))
            .await;
        assert!(longest.is_ok());
    }

    #[tokio::test]
    async fn test_create_booking_requires_owned_pets() {
        let helper = TestHelper::new().await;
        helper.add_pet("bob", "max").await;

        let result = helper
            .try_book("ann", &["max"], ServiceType::Daycare, date(2025, 1, 10), date(2025, 1, 10))
            .await;
        assert!(matches!(result, Err(BookingError::NotFound { entity: "Pet", .. })));
    }

    #[tokio::test]
    async fn test_client_cannot_book_for_someone_else() {
        let helper = TestHelper::new().await;
        helper.add_pet("bob", "max").await;

        let command = CreateBookingCommand {
            owner_id: "bob".to_string(),
            pet_ids: vec!["max".to_string()],
            service_type: ServiceType::Daycare,
            start_date: date(2025, 1, 10),
            end_date: date(2025, 1, 10),
            notes: String::new(),
        };
        let result = helper
            .bookings
            .create_booking(&TestHelper::client("ann"), command)
            .await;
        assert!(matches!(result, Err(BookingError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_capacity_conflict_creates_nothing() {
        let helper = TestHelper::with_capacity(2).await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("bob", "max").await;
        helper.add_pet("bob", "luna").await;

        helper
            .book("ann", &["rex"], ServiceType::Boarding, date(2025, 3, 1), date(2025, 3, 5))
            .await;

        let result = helper
            .try_book("bob", &["max", "luna"], ServiceType::Boarding, date(2025, 3, 5), date(2025, 3, 8))
            .await;
        match result {
            Err(BookingError::CapacityConflict { date: conflict }) => {
                assert_eq!(conflict, date(2025, 3, 5))
            }
            other => panic!("expected capacity conflict, got {:?}", other),
        }
        let bob = helper
            .bookings
            .list_bookings(&TestHelper::staff(), Some("bob"))
            .await
            .unwrap();
        assert!(bob.is_empty());

        // a single pet still fits next to the existing stay
        helper
            .book("bob", &["max"], ServiceType::Boarding, date(2025, 3, 5), date(2025, 3, 8))
            .await;
    }

    #[tokio::test]
    async fn test_declined_bookings_release_capacity() {
        let helper = TestHelper::with_capacity(1).await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("bob", "max").await;

        let first = helper
            .book("ann", &["rex"], ServiceType::Daycare, date(2025, 3, 1), date(2025, 3, 1))
            .await;
        let blocked = helper
            .try_book("bob", &["max"], ServiceType::Daycare, date(2025, 3, 1), date(2025, 3, 1))
            .await;
        assert!(matches!(blocked, Err(BookingError::CapacityConflict { .. })));

        helper
            .bookings
            .decline_booking(&TestHelper::staff(), action(&first[0].id))
            .await
            .unwrap();
        helper
            .book("bob", &["max"], ServiceType::Daycare, date(2025, 3, 1), date(2025, 3, 1))
            .await;
    }

    #[tokio::test]
    async fn test_concurrent_creations_cannot_overbook() {
        let helper = TestHelper::with_capacity(1).await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("bob", "max").await;

        let (a, b) = tokio::join!(
            helper.try_book("ann", &["rex"], ServiceType::Boarding, date(2025, 4, 1), date(2025, 4, 3)),
            helper.try_book("bob", &["max"], ServiceType::Boarding, date(2025, 4, 2), date(2025, 4, 4)),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        let availability = helper
            .bookings
            .list_availability(date(2025, 4, 1), date(2025, 4, 4))
            .await
            .unwrap();
        assert!(availability.days.iter().all(|day| day.occupancy <= 1));
    }

    #[tokio::test]
    async fn test_accept_reprices_at_current_rate() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;
        let created = helper
            .book("ann", &["rex"], ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;

        helper
            .catalog
            .set_rate(&TestHelper::staff(), ServiceType::Boarding, dec!(60))
            .await
            .unwrap();
        let accepted = helper
            .bookings
            .accept_booking(&TestHelper::staff(), action(&created[0].id))
            .await
            .unwrap();

        assert_eq!(accepted.status, BookingStatus::Confirmed);
        assert_eq!(accepted.total_price, dec!(180.00));
        assert_eq!(accepted.processed_by.as_deref(), Some("front-desk"));

        // later rate changes leave the confirmed total alone
        helper
            .catalog
            .set_rate(&TestHelper::staff(), ServiceType::Boarding, dec!(75))
            .await
            .unwrap();
        let stored = helper
            .bookings
            .get_booking(&TestHelper::staff(), &created[0].id)
            .await
            .unwrap();
        assert_eq!(stored.total_price, dec!(180.00));
    }

    #[tokio::test]
    async fn test_staff_only_actions_reject_clients() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;
        let created = helper
            .book("ann", &["rex"], ServiceType::Daycare, date(2025, 1, 10), date(2025, 1, 10))
            .await;

        let result = helper
            .bookings
            .accept_booking(&TestHelper::client("ann"), action(&created[0].id))
            .await;
        assert!(matches!(result, Err(BookingError::PermissionDenied { .. })));

        let stored = helper
            .bookings
            .get_booking(&TestHelper::client("ann"), &created[0].id)
            .await
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_client_cancellation_inside_cutoff_is_refused() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;
        helper.clock.set(at(2025, 1, 8, 0));

        let result = helper
            .bookings
            .cancel_booking(&TestHelper::client("ann"), cancel(&booking.id, None))
            .await;
        assert!(matches!(result, Err(BookingError::LateCancellation { .. })));

        let stored = helper
            .bookings
            .get_booking(&TestHelper::client("ann"), &booking.id)
            .await
            .unwrap();
        assert_eq!(stored, booking);
    }

    #[tokio::test]
    async fn test_client_cancellation_with_notice_has_no_penalty() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;
        helper.clock.set(at(2025, 1, 6, 23));

        let cancelled = helper
            .bookings
            .cancel_booking(&TestHelper::client("ann"), cancel(&booking.id, None))
            .await
            .unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.total_price, booking.total_price);
        assert_eq!(cancelled.charge_kind, ChargeKind::Stay);
        assert_eq!(cancelled.status_note.as_deref(), Some("plans changed"));
        assert!(!cancelled.is_payable());
    }

    #[tokio::test]
    async fn test_cutoff_honours_facility_offset() {
        let mut policy = EnginePolicy::default();
        policy.facility_utc_offset_minutes = -300;
        let helper = TestHelper::with_policy(policy).await;

        // local midnight at UTC-5 is 05:00 UTC; 72 hours earlier is Jan 7 05:00
        assert_eq!(
            helper.bookings.cancellation_cutoff(date(2025, 1, 10)).unwrap(),
            at(2025, 1, 7, 5)
        );
    }

    #[tokio::test]
    async fn test_staff_cancellation_assesses_penalty_inside_cutoff() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;
        helper.clock.set(at(2025, 1, 9, 12));

        let cancelled = helper
            .bookings
            .cancel_booking(&TestHelper::staff(), cancel(&booking.id, None))
            .await
            .unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.total_price, dec!(45.00));
        assert_eq!(cancelled.charge_kind, ChargeKind::LateCancellationFee);
        assert!(!cancelled.is_paid);
        assert!(cancelled.is_payable());
    }

    #[tokio::test]
    async fn test_staff_penalty_override() {
        let helper = TestHelper::new().await;
        let early = helper
            .confirmed_booking("ann", "rex", ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;
        let late = helper
            .confirmed_booking("ann", "bella", ServiceType::Daycare, date(2025, 1, 2), date(2025, 1, 2))
            .await;

        let forced = helper
            .bookings
            .cancel_booking(&TestHelper::staff(), cancel(&early.id, Some(true)))
            .await
            .unwrap();
        assert_eq!(forced.charge_kind, ChargeKind::LateCancellationFee);

        let waived = helper
            .bookings
            .cancel_booking(&TestHelper::staff(), cancel(&late.id, Some(false)))
            .await
            .unwrap();
        assert_eq!(waived.charge_kind, ChargeKind::Stay);
        assert_eq!(waived.total_price, late.total_price);
    }

    #[tokio::test]
    async fn test_mark_no_show_applies_fee() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;
        helper.clock.set(at(2025, 1, 8, 0));

        let no_show = helper
            .bookings
            .mark_no_show(&TestHelper::staff(), action(&booking.id))
            .await
            .unwrap();

        assert_eq!(no_show.status, BookingStatus::NoShow);
        assert_eq!(no_show.total_price, dec!(20.00));
        assert_eq!(no_show.charge_kind, ChargeKind::NoShowFee);
        assert!(!no_show.is_paid);
    }

    #[tokio::test]
    async fn test_check_in_requires_payment() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;

        let result = helper
            .bookings
            .check_in(&TestHelper::staff(), action(&booking.id))
            .await;
        assert!(matches!(result, Err(BookingError::PaymentRequired { .. })));

        let stored = helper
            .bookings
            .get_booking(&TestHelper::staff(), &booking.id)
            .await
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_pending_booking_cannot_be_cancelled_or_checked_in() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;
        let created = helper
            .book("ann", &["rex"], ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;

        let cancel_result = helper
            .bookings
            .cancel_booking(&TestHelper::client("ann"), cancel(&created[0].id, None))
            .await;
        assert!(matches!(
            cancel_result,
            Err(BookingError::StateTransition { from: BookingStatus::Pending, .. })
        ));

        let check_in = helper
            .bookings
            .check_in(&TestHelper::staff(), action(&created[0].id))
            .await;
        assert!(matches!(check_in, Err(BookingError::StateTransition { .. })));
    }

    #[tokio::test]
    async fn test_terminal_states_reject_every_transition() {
        let helper = TestHelper::new().await;
        let staff = TestHelper::staff();

        for (pet_id, status) in [
            ("rex", BookingStatus::Completed),
            ("bella", BookingStatus::Cancelled),
            ("max", BookingStatus::Declined),
            ("luna", BookingStatus::NoShow),
        ] {
            let booking = terminal_booking(&helper, pet_id, status).await;
            assert_eq!(booking.status, status);

            let results = vec![
                helper.bookings.accept_booking(&staff, action(&booking.id)).await,
                helper.bookings.decline_booking(&staff, action(&booking.id)).await,
                helper.bookings.check_in(&staff, action(&booking.id)).await,
                helper.bookings.check_out(&staff, action(&booking.id)).await,
                helper.bookings.cancel_booking(&staff, cancel(&booking.id, None)).await,
                helper.bookings.mark_no_show(&staff, action(&booking.id)).await,
            ];
            for result in results {
                match result {
                    Err(BookingError::StateTransition { from, .. }) => assert_eq!(from, status),
                    other => panic!("expected {} to reject the transition, got {:?}", status, other),
                }
            }

            let stored = helper.bookings.get_booking(&staff, &booking.id).await.unwrap();
            assert_eq!(stored, booking);
        }
    }

    #[tokio::test]
    async fn test_check_out_completes_a_paid_stay() {
        let helper = TestHelper::new().await;
        let staff = TestHelper::staff();
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;
        helper.fund_wallet("ann", dec!(200)).await;
        settle_booking(&helper, &booking).await;

        helper.clock.set(at(2025, 1, 10, 8));
        helper.bookings.check_in(&staff, action(&booking.id)).await.unwrap();

        helper.clock.set(at(2025, 1, 13, 10));
        let completed = helper
            .bookings
            .check_out(
                &staff,
                BookingActionCommand {
                    booking_id: booking.id.clone(),
                    note: Some("Picked up by owner".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(completed.status, BookingStatus::Completed);
        assert!(completed.is_paid);
        assert_eq!(completed.total_price, dec!(150.00));
        assert_eq!(completed.status_note.as_deref(), Some("Picked up by owner"));
        assert_eq!(completed.updated_at, at(2025, 1, 13, 10));

        let stored = helper.bookings.get_booking(&staff, &booking.id).await.unwrap();
        assert_eq!(stored, completed);

        let last = helper.notifier.events().pop().unwrap();
        assert_eq!(last.from, Some(BookingStatus::CheckedIn));
        assert_eq!(last.to, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_check_out_requires_checked_in() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;

        let result = helper
            .bookings
            .check_out(&TestHelper::staff(), action(&booking.id))
            .await;
        assert!(matches!(
            result,
            Err(BookingError::StateTransition { from: BookingStatus::Confirmed, .. })
        ));
    }

    #[tokio::test]
    async fn test_transition_loaded_before_settlement_keeps_payment() {
        let helper = TestHelper::new().await;
        let client = TestHelper::client("ann");
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;
        helper.fund_wallet("ann", dec!(100)).await;

        // a cancellation reads the row, then settlement commits before it writes
        let loaded = helper.bookings.get_booking(&client, &booking.id).await.unwrap();
        settle_booking(&helper, &booking).await;

        let mut cancelled = loaded.clone();
        cancelled.status_note = Some("plans changed".to_string());
        let result = helper
            .bookings
            .commit(&client, &loaded, cancelled, Transition::Cancel)
            .await;
        assert!(matches!(
            result,
            Err(BookingError::StateTransition { from: BookingStatus::Confirmed, .. })
        ));

        let stored = helper.bookings.get_booking(&client, &booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert!(stored.is_paid);
        assert_eq!(helper.balance("ann").await, dec!(54.80));

        // retrying from a fresh read keeps the payment on the cancelled row
        let cancelled = helper
            .bookings
            .cancel_booking(&client, cancel(&booking.id, None))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.is_paid);
        assert_eq!(helper.balance("ann").await, dec!(54.80));
    }

    #[tokio::test]
    async fn test_penalty_on_paid_stay_is_noted_in_ledger() {
        let helper = TestHelper::new().await;
        let staff = TestHelper::staff();
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Boarding, date(2025, 1, 10), date(2025, 1, 13))
            .await;
        helper.fund_wallet("ann", dec!(200)).await;
        settle_booking(&helper, &booking).await;
        helper.clock.set(at(2025, 1, 9, 12));

        let cancelled = helper
            .bookings
            .cancel_booking(&staff, cancel(&booking.id, None))
            .await
            .unwrap();
        assert_eq!(cancelled.charge_kind, ChargeKind::LateCancellationFee);
        assert_eq!(cancelled.total_price, dec!(45.00));
        assert!(!cancelled.is_paid);

        let ledger = helper
            .wallets
            .list_transactions(&staff, "ann", None)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 3);
        let note = &ledger[0];
        assert_eq!(note.amount, Decimal::ZERO);
        assert_eq!(note.balance, dec!(30.50));
        assert_eq!(note.date, at(2025, 1, 9, 12));
        assert!(note.description.contains(&booking.id));
        assert!(note.description.contains("150.00"));
        assert!(note.description.contains("LateCancellationFee"));
        assert_eq!(helper.balance("ann").await, dec!(30.50));
    }

    #[tokio::test]
    async fn test_cutoff_outside_calendar_is_an_error() {
        let helper = TestHelper::new().await;
        let result = helper.bookings.cancellation_cutoff(NaiveDate::MIN);
        assert!(matches!(
            result,
            Err(BookingError::Validation(ValidationError::Malformed(_)))
        ));
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let helper = TestHelper::new().await;
        let result = helper
            .bookings
            .accept_booking(&TestHelper::staff(), action("bk-missing"))
            .await;
        assert!(matches!(result, Err(BookingError::NotFound { entity: "Booking", .. })));
    }

    #[tokio::test]
    async fn test_list_bookings_scopes_clients_to_themselves() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("bob", "max").await;
        helper
            .book("ann", &["rex"], ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;
        helper
            .book("bob", &["max"], ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;

        let own = helper
            .bookings
            .list_bookings(&TestHelper::client("ann"), None)
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].owner_id, "ann");

        let other = helper
            .bookings
            .list_bookings(&TestHelper::client("ann"), Some("bob"))
            .await;
        assert!(matches!(other, Err(BookingError::PermissionDenied { .. })));

        let all = helper
            .bookings
            .list_bookings(&TestHelper::staff(), None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_list_availability_reports_full_dates() {
        let helper = TestHelper::with_capacity(2).await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("ann", "bella").await;
        helper
            .book("ann", &["rex", "bella"], ServiceType::Boarding, date(2025, 5, 2), date(2025, 5, 3))
            .await;

        let view = helper
            .bookings
            .list_availability(date(2025, 5, 1), date(2025, 5, 4))
            .await
            .unwrap();

        assert_eq!(view.capacity, 2);
        let full: Vec<_> = view.days.iter().filter(|d| d.full).map(|d| d.date).collect();
        assert_eq!(full, vec![date(2025, 5, 2), date(2025, 5, 3)]);
        assert_eq!(view.days[0].remaining, 2);

        let reversed = helper
            .bookings
            .list_availability(date(2025, 5, 4), date(2025, 5, 1))
            .await;
        assert!(matches!(reversed, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_order_and_billing_groups() {
        let helper = TestHelper::new().await;
        helper.add_pet("ann", "rex").await;
        helper.add_pet("ann", "bella").await;
        helper
            .book("ann", &["rex", "bella"], ServiceType::Boarding, date(2025, 5, 2), date(2025, 5, 3))
            .await;
        helper
            .book("ann", &["rex"], ServiceType::Daycare, date(2025, 6, 1), date(2025, 6, 1))
            .await;

        let orders = helper
            .bookings
            .order_groups(&TestHelper::client("ann"), None)
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].key.1, date(2025, 6, 1));
        assert_eq!(orders[1].bookings.len(), 2);

        let billing = helper
            .bookings
            .billing_groups(&TestHelper::client("ann"), None)
            .await
            .unwrap();
        assert_eq!(billing[1].key.0, "ann");
        assert_eq!(billing[1].key.1, ServiceType::Boarding);
    }

    #[tokio::test]
    async fn test_notifier_sees_every_transition() {
        let helper = TestHelper::new().await;
        let booking = helper
            .confirmed_booking("ann", "rex", ServiceType::Daycare, date(2025, 2, 10), date(2025, 2, 10))
            .await;

        let events = helper.notifier.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].from, None);
        assert_eq!(events[1].from, Some(BookingStatus::Pending));
        assert_eq!(events[1].to, BookingStatus::Confirmed);
        assert_eq!(events[1].booking_id, booking.id);
    }
}
