//! # Settlement Service
//!
//! Charges an owner's wallet for a batch of payable bookings.
//!
//! Stay charges carry tax; penalty fees are charged flat. A settlement is a
//! single SQL transaction: compare-and-debit the wallet, mark every booking
//! paid (guarded on the exact charge that was quoted), append the ledger
//! entry, commit. Any failure drops the transaction and nothing is applied.
//! Settlements for one owner are additionally serialized on that owner's
//! wallet lock, which top-ups share.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EnginePolicy;
use crate::domain::commands::settlement::{SettleCommand, SettlementQuote, SettlementReceipt};
use crate::domain::context::{Clock, RequestContext};
use crate::domain::errors::{BookingError, BookingResult, ValidationError};
use crate::domain::grouping::{group_billing, BillingKey, Group};
use crate::domain::locks::KeyedLocks;
use crate::domain::models::booking::Booking;
use crate::domain::models::wallet::WalletTransaction;
use crate::domain::pricing::tax_on;
use crate::storage::{
    from_cents, to_cents, BookingRepository, DbConnection, WalletRepository,
};

/// Totals for a set of bookings: stay charges plus tax, penalties untaxed
pub fn compute_quote(bookings: &[Booking], tax_rate: Decimal) -> SettlementQuote {
    let (penalties, stays): (Vec<&Booking>, Vec<&Booking>) = bookings
        .iter()
        .partition(|b| b.charge_kind.is_penalty());

    let service_subtotal: Decimal = stays.iter().map(|b| b.total_price).sum();
    let penalty_subtotal: Decimal = penalties.iter().map(|b| b.total_price).sum();
    let tax = tax_on(service_subtotal, tax_rate);

    SettlementQuote {
        service_subtotal,
        penalty_subtotal,
        tax,
        grand_total: service_subtotal + tax + penalty_subtotal,
        booking_ids: bookings.iter().map(|b| b.id.clone()).collect(),
    }
}

#[derive(Clone)]
pub struct SettlementService {
    db: DbConnection,
    bookings: BookingRepository,
    wallets: WalletRepository,
    policy: Arc<EnginePolicy>,
    clock: Arc<dyn Clock>,
    wallet_locks: KeyedLocks,
}

impl SettlementService {
    pub fn new(
        db: DbConnection,
        policy: Arc<EnginePolicy>,
        clock: Arc<dyn Clock>,
        wallet_locks: KeyedLocks,
    ) -> Self {
        Self {
            bookings: BookingRepository::new(db.clone()),
            wallets: WalletRepository::new(db.clone()),
            db,
            policy,
            clock,
            wallet_locks,
        }
    }

    /// What `settle` would charge for these bookings right now
    pub async fn quote(
        &self,
        ctx: &RequestContext,
        command: SettleCommand,
    ) -> BookingResult<SettlementQuote> {
        ctx.require_owner_or_staff(&command.owner_id, "view charges for another owner")?;
        let bookings = self.load_payable(&command.owner_id, &command.booking_ids).await?;
        Ok(compute_quote(&bookings, self.policy.tax_rate))
    }

    /// Debit the owner's wallet for the given bookings and mark them paid.
    ///
    /// The batch is rejected as a whole if any booking is unknown, belongs
    /// to someone else, is already paid, or is not payable, or if the
    /// wallet cannot cover the grand total.
    pub async fn settle(
        &self,
        ctx: &RequestContext,
        command: SettleCommand,
    ) -> BookingResult<SettlementReceipt> {
        ctx.require_owner_or_staff(&command.owner_id, "settle charges for another owner")?;
        let owner_id = command.owner_id.as_str();

        let _wallet_guard = self.wallet_locks.lock(owner_id).await;

        if self.wallets.get(owner_id).await?.is_none() {
            return Err(BookingError::not_found("Wallet", owner_id));
        }
        let bookings = self.load_payable(owner_id, &command.booking_ids).await?;
        let quote = compute_quote(&bookings, self.policy.tax_rate);
        let now = self.clock.now();
        let amount_cents = to_cents(quote.grand_total)?;

        let mut tx = self.db.pool().begin().await?;

        let balance_cents = match WalletRepository::debit_in(&mut tx, owner_id, amount_cents).await? {
            Some(balance) => balance,
            None => {
                let available = WalletRepository::balance_in(&mut tx, owner_id)
                    .await?
                    .unwrap_or(0);
                warn!(
                    owner_id = %owner_id,
                    required = %quote.grand_total,
                    available = %from_cents(available),
                    "Settlement refused: insufficient funds"
                );
                return Err(BookingError::InsufficientFunds {
                    required: quote.grand_total,
                    available: from_cents(available),
                });
            }
        };

        for booking in &bookings {
            if !BookingRepository::mark_paid_in(&mut tx, booking, now).await? {
                let current = BookingRepository::get_in(&mut tx, &booking.id).await?;
                warn!(booking_id = %booking.id, "Booking changed while being settled");
                return Err(match current {
                    Some(current) if current.is_paid => BookingError::AlreadySettled {
                        booking_id: current.id,
                    },
                    Some(current) => BookingError::StateTransition {
                        booking_id: current.id,
                        from: current.status,
                        action: "settle",
                    },
                    None => BookingError::not_found("Booking", booking.id.clone()),
                });
            }
        }

        let entry = WalletTransaction {
            id: WalletTransaction::generate_id(-quote.grand_total),
            owner_id: owner_id.to_string(),
            date: now,
            description: format!("Settlement of {} booking(s)", bookings.len()),
            amount: -quote.grand_total,
            balance: from_cents(balance_cents),
        };
        WalletRepository::insert_transaction_in(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            owner_id = %owner_id,
            amount = %quote.grand_total,
            tax = %quote.tax,
            "Settled {} booking(s)",
            bookings.len()
        );

        Ok(SettlementReceipt {
            owner_id: owner_id.to_string(),
            quote,
            balance_after: from_cents(balance_cents),
            settled_at: now,
        })
    }

    /// "Pay all": settle every payable booking the owner has
    pub async fn settle_all(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> BookingResult<SettlementReceipt> {
        ctx.require_owner_or_staff(owner_id, "settle charges for another owner")?;
        let booking_ids: Vec<String> = self
            .payable_bookings(owner_id)
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();

        self.settle(
            ctx,
            SettleCommand {
                owner_id: owner_id.to_string(),
                booking_ids,
            },
        )
        .await
    }

    /// Payable bookings grouped by `(owner, service, start, end)`, each with its totals
    pub async fn outstanding_groups(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> BookingResult<Vec<(Group<BillingKey>, SettlementQuote)>> {
        ctx.require_owner_or_staff(owner_id, "view charges for another owner")?;
        let payable = self.payable_bookings(owner_id).await?;
        Ok(group_billing(&payable)
            .into_iter()
            .map(|group| {
                let quote = compute_quote(&group.bookings, self.policy.tax_rate);
                (group, quote)
            })
            .collect())
    }

    async fn payable_bookings(&self, owner_id: &str) -> BookingResult<Vec<Booking>> {
        Ok(self
            .bookings
            .list(Some(owner_id))
            .await?
            .into_iter()
            .filter(Booking::is_payable)
            .collect())
    }

    /// Resolve the requested ids (deduplicated, in request order) and
    /// check each one can be charged to `owner_id`
    async fn load_payable(&self, owner_id: &str, booking_ids: &[String]) -> BookingResult<Vec<Booking>> {
        let mut seen = HashSet::new();
        let requested: Vec<String> = booking_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        if requested.is_empty() {
            return Err(ValidationError::EmptySettlement.into());
        }

        let mut found = self.bookings.get_many(&requested).await?;
        let mut ordered = Vec::with_capacity(requested.len());
        for id in &requested {
            let position = found
                .iter()
                .position(|b| &b.id == id && b.owner_id == owner_id)
                .ok_or_else(|| BookingError::not_found("Booking", id.clone()))?;
            let booking = found.swap_remove(position);
            if booking.is_paid {
                return Err(BookingError::AlreadySettled {
                    booking_id: booking.id,
                });
            }
            if !booking.is_payable() {
                return Err(BookingError::StateTransition {
                    booking_id: booking.id,
                    from: booking.status,
                    action: "settle",
                });
            }
            ordered.push(booking);
        }
        Ok(ordered)
    }
}
