use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::domain::models::wallet::{WalletAccount, WalletTransaction};
use crate::storage::{from_cents, parse_timestamp, to_cents, DbConnection};

/// Repository for wallet balances and the wallet ledger
#[derive(Clone)]
pub struct WalletRepository {
    db: DbConnection,
}

impl WalletRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Create an empty wallet; returns false if one already exists
    pub async fn create(&self, owner_id: &str, now: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO wallets (owner_id, balance_cents, created_at)
            VALUES (?, 0, ?)
            "#,
        )
        .bind(owner_id)
        .bind(now.to_rfc3339())
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get(&self, owner_id: &str) -> Result<Option<WalletAccount>, sqlx::Error> {
        let row = sqlx::query("SELECT owner_id, balance_cents FROM wallets WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(WalletAccount {
                owner_id: r.try_get("owner_id")?,
                balance: from_cents(r.try_get("balance_cents")?),
            })),
            None => Ok(None),
        }
    }

    pub async fn balance_in(
        conn: &mut SqliteConnection,
        owner_id: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query("SELECT balance_cents FROM wallets WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(|r| r.try_get("balance_cents")).transpose()
    }

    /// Add `cents` to the wallet, returning the new balance in cents
    pub async fn credit_in(
        conn: &mut SqliteConnection,
        owner_id: &str,
        cents: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE wallets SET balance_cents = balance_cents + ?
            WHERE owner_id = ?
            RETURNING balance_cents
            "#,
        )
        .bind(cents)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(|r| r.try_get("balance_cents")).transpose()
    }

    /// Compare-and-debit: subtract `cents` only if the balance covers it.
    /// Returns the new balance, or `None` when funds are insufficient (or the
    /// wallet does not exist); nothing is written in that case.
    pub async fn debit_in(
        conn: &mut SqliteConnection,
        owner_id: &str,
        cents: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE wallets SET balance_cents = balance_cents - ?
            WHERE owner_id = ? AND balance_cents >= ?
            RETURNING balance_cents
            "#,
        )
        .bind(cents)
        .bind(owner_id)
        .bind(cents)
        .fetch_optional(&mut *conn)
        .await?;
        row.map(|r| r.try_get("balance_cents")).transpose()
    }

    pub async fn insert_transaction_in(
        conn: &mut SqliteConnection,
        transaction: &WalletTransaction,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (id, owner_id, date, description, amount_cents, balance_cents)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.owner_id)
        .bind(transaction.date.to_rfc3339())
        .bind(&transaction.description)
        .bind(to_cents(transaction.amount)?)
        .bind(to_cents(transaction.balance)?)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    fn map_transaction(row: &SqliteRow) -> Result<WalletTransaction, sqlx::Error> {
        Ok(WalletTransaction {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            date: parse_timestamp(row.try_get::<&str, _>("date")?)?,
            description: row.try_get("description")?,
            amount: from_cents(row.try_get("amount_cents")?),
            balance: from_cents(row.try_get("balance_cents")?),
        })
    }

    /// Ledger entries for one wallet, most recent first
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, date, description, amount_cents, balance_cents
            FROM wallet_transactions
            WHERE owner_id = ?
            ORDER BY ROWID DESC
            LIMIT ?
            "#,
        )
        .bind(owner_id)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::map_transaction).collect()
    }
}
