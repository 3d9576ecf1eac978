//! Domain models for prepaid wallets and their running ledger.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct WalletAccount {
    pub owner_id: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletTransaction {
    pub id: String,
    pub owner_id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    /// Positive for credits, negative for debits
    pub amount: Decimal,
    /// Balance after this entry
    pub balance: Decimal,
}

impl WalletTransaction {
    /// Format: `<in|out>-<uuid>`
    pub fn generate_id(amount: Decimal) -> String {
        let direction = if amount.is_sign_negative() { "out" } else { "in" };
        format!("{}-{}", direction, Uuid::new_v4())
    }
}
