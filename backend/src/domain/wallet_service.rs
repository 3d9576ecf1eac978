//! Prepaid wallet accounts: opening, top-ups and the ledger history.
//!
//! Only settlement debits a wallet; this service only ever credits it.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::domain::context::{Clock, RequestContext};
use crate::domain::errors::{BookingError, BookingResult, ValidationError};
use crate::domain::locks::KeyedLocks;
use crate::domain::models::wallet::{WalletAccount, WalletTransaction};
use crate::domain::pricing::{
    ensure_within_limit, round_currency, MAX_CHARGE_AMOUNT, MAX_WALLET_BALANCE,
};
use crate::storage::{from_cents, to_cents, DbConnection, WalletRepository};

pub const DEFAULT_TRANSACTION_LIMIT: u32 = 50;
pub const MAX_TRANSACTION_LIMIT: u32 = 500;

#[derive(Clone)]
pub struct WalletService {
    db: DbConnection,
    wallets: WalletRepository,
    clock: Arc<dyn Clock>,
    wallet_locks: KeyedLocks,
}

impl WalletService {
    pub fn new(db: DbConnection, clock: Arc<dyn Clock>, wallet_locks: KeyedLocks) -> Self {
        Self {
            wallets: WalletRepository::new(db.clone()),
            db,
            clock,
            wallet_locks,
        }
    }

    /// Open an empty wallet for `owner_id`; opening twice returns the existing one
    pub async fn open_wallet(&self, ctx: &RequestContext, owner_id: &str) -> BookingResult<WalletAccount> {
        ctx.require_owner_or_staff(owner_id, "open a wallet for another owner")?;
        if owner_id.trim().is_empty() {
            return Err(ValidationError::Malformed("Owner id cannot be empty".to_string()).into());
        }

        if self.wallets.create(owner_id, self.clock.now()).await? {
            info!(owner_id = %owner_id, "Opened wallet");
        }
        self.load(owner_id).await
    }

    pub async fn get_wallet(&self, ctx: &RequestContext, owner_id: &str) -> BookingResult<WalletAccount> {
        ctx.require_owner_or_staff(owner_id, "view another owner's wallet")?;
        self.load(owner_id).await
    }

    /// Credit the wallet and append a ledger entry with the running balance
    pub async fn top_up(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        amount: Decimal,
        description: Option<String>,
    ) -> BookingResult<WalletTransaction> {
        ctx.require_owner_or_staff(owner_id, "top up another owner's wallet")?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        if round_currency(amount) != amount {
            return Err(ValidationError::Malformed(format!(
                "Amount {} has more than two decimal places",
                amount
            ))
            .into());
        }
        ensure_within_limit(amount, MAX_CHARGE_AMOUNT)?;

        let _wallet_guard = self.wallet_locks.lock(owner_id).await;
        let now = self.clock.now();

        let mut tx = self.db.pool().begin().await?;
        let current = WalletRepository::balance_in(&mut tx, owner_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Wallet", owner_id))?;
        ensure_within_limit(from_cents(current) + amount, MAX_WALLET_BALANCE)?;

        let balance_cents = WalletRepository::credit_in(&mut tx, owner_id, to_cents(amount)?)
            .await?
            .ok_or_else(|| BookingError::not_found("Wallet", owner_id))?;

        let entry = WalletTransaction {
            id: WalletTransaction::generate_id(amount),
            owner_id: owner_id.to_string(),
            date: now,
            description: description.unwrap_or_else(|| "Wallet top-up".to_string()),
            amount,
            balance: from_cents(balance_cents),
        };
        WalletRepository::insert_transaction_in(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(owner_id = %owner_id, amount = %amount, balance = %entry.balance, "Wallet topped up");
        Ok(entry)
    }

    /// Ledger entries, most recent first
    pub async fn list_transactions(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
        limit: Option<u32>,
    ) -> BookingResult<Vec<WalletTransaction>> {
        ctx.require_owner_or_staff(owner_id, "view another owner's wallet")?;
        self.load(owner_id).await?;
        let limit = limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT);
        Ok(self.wallets.list_transactions(owner_id, limit).await?)
    }

    async fn load(&self, owner_id: &str) -> BookingResult<WalletAccount> {
        self.wallets
            .get(owner_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Wallet", owner_id))
    }
}
