//! # Configuration
//!
//! Engine policy (tax, penalty fees, cutoff window, capacity) and server
//! settings. Values come from an optional YAML file named by
//! `PETSTAY_CONFIG`, then environment overrides for the database URL and
//! bind address.
//!
//! ```yaml
//! database_url: "sqlite:petstay.db"
//! bind_address: "127.0.0.1:3000"
//! policy:
//!   tax_rate: "0.13"
//!   late_cancellation_fee: "45.00"
//!   no_show_fee: "20.00"
//!   cancellation_cutoff_hours: 72
//!   max_stay_days: 30
//!   daily_capacity: 20
//!   facility_utc_offset_minutes: 0
//! ```

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::pricing::MAX_CHARGE_AMOUNT;

pub const CONFIG_PATH_ENV: &str = "PETSTAY_CONFIG";
pub const DATABASE_URL_ENV: &str = "PETSTAY_DATABASE_URL";
pub const BIND_ADDR_ENV: &str = "PETSTAY_BIND_ADDR";

/// One year of notice is the longest cutoff a policy may ask for
const MAX_CUTOFF_HOURS: i64 = 24 * 366;

/// Business policy owned by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Consumption tax applied to stay charges (not to penalty fees)
    pub tax_rate: Decimal,
    pub late_cancellation_fee: Decimal,
    pub no_show_fee: Decimal,
    /// Client cancellations are refused this many hours before the stay starts
    pub cancellation_cutoff_hours: i64,
    /// Longest stay accepted at creation, counted in inclusive days
    pub max_stay_days: i64,
    /// Pets the facility can host on any single date
    pub daily_capacity: u32,
    /// Offset of the facility's local midnight from UTC
    pub facility_utc_offset_minutes: i32,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            tax_rate: dec!(0.13),
            late_cancellation_fee: dec!(45.00),
            no_show_fee: dec!(20.00),
            cancellation_cutoff_hours: 72,
            max_stay_days: 30,
            daily_capacity: 20,
            facility_utc_offset_minutes: 0,
        }
    }
}

impl EnginePolicy {
    pub fn validate(&self) -> Result<()> {
        if self.tax_rate < Decimal::ZERO || self.tax_rate >= Decimal::ONE {
            bail!("tax_rate must be in [0, 1), got {}", self.tax_rate);
        }
        if self.late_cancellation_fee < Decimal::ZERO || self.no_show_fee < Decimal::ZERO {
            bail!("penalty fees cannot be negative");
        }
        if self.late_cancellation_fee > MAX_CHARGE_AMOUNT || self.no_show_fee > MAX_CHARGE_AMOUNT {
            bail!("penalty fees cannot exceed {}", MAX_CHARGE_AMOUNT);
        }
        if !(0..=MAX_CUTOFF_HOURS).contains(&self.cancellation_cutoff_hours) {
            bail!(
                "cancellation_cutoff_hours must be between 0 and {}",
                MAX_CUTOFF_HOURS
            );
        }
        if self.max_stay_days < 1 {
            bail!("max_stay_days must be at least 1");
        }
        if self.daily_capacity == 0 {
            bail!("daily_capacity must be at least 1");
        }
        if self.facility_utc_offset_minutes.abs() >= 24 * 60 {
            bail!("facility_utc_offset_minutes must be within one day");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub policy: EnginePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:petstay.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            policy: EnginePolicy::default(),
        }
    }
}

impl Config {
    /// Load from `PETSTAY_CONFIG` (if set) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => {
                info!("{} not set, using default configuration", CONFIG_PATH_ENV);
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            config.bind_address = addr;
        }

        config.policy.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.policy.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
