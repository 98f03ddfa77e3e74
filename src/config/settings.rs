//! Billing settings loaded from config.toml
//!
//! Every field has a default, so an absent file or an empty `[billing]` table
//! still yields a working configuration.

use crate::core::claim::DEFAULT_BANKS;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Billing rules
    pub billing: BillingSettings,
}

/// Billing rules shared by the engine and the bot
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BillingSettings {
    /// Price of one billing month, quoted in reminders
    pub monthly_price: f64,
    /// How long an uploaded slip waits for its claim before the sweep discards it
    pub slip_timeout_hours: i64,
    /// Offset of the billing time zone from UTC
    pub utc_offset_hours: i32,
    /// Period of the background slip sweep
    pub sweep_interval_minutes: u64,
    /// Banks accepted in inline claims
    pub banks: Vec<String>,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            monthly_price: 41.5,
            slip_timeout_hours: 1,
            utc_offset_hours: 7,
            sweep_interval_minutes: 15,
            banks: DEFAULT_BANKS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl BillingSettings {
    /// Age after which a pending slip expires.
    #[must_use]
    pub fn slip_timeout(&self) -> chrono::Duration {
        chrono::Duration::hours(self.slip_timeout_hours)
    }

    /// Interval between sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.monthly_price.is_finite() || self.monthly_price < 0.0 {
            return Err(Error::Config {
                message: format!(
                    "monthly_price must be a non-negative number, got {}",
                    self.monthly_price
                ),
            });
        }
        if self.slip_timeout_hours <= 0 {
            return Err(Error::Config {
                message: "slip_timeout_hours must be greater than zero".to_string(),
            });
        }
        if self.sweep_interval_minutes == 0 {
            return Err(Error::Config {
                message: "sweep_interval_minutes must be greater than zero".to_string(),
            });
        }
        if self.banks.iter().all(|bank| bank.trim().is_empty()) {
            return Err(Error::Config {
                message: "banks must list at least one bank".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses and validates settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.billing.validate()?;
    Ok(config)
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
///
/// A missing file is not an error: defaults are used and a warning is logged.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(Error::Config {
                message: format!("Failed to read config file: {e}"),
            });
        }
    };

    let config = parse_config(&contents)?;
    info!(path = %path.display(), banks = config.billing.banks.len(), "Loaded settings");
    Ok(config)
}

/// Loads settings from `CONFIG_PATH`, or ./config.toml when unset
pub fn load_default_config() -> Result<AppConfig> {
    let path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}
