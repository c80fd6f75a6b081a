//! Ledger configuration.

use crate::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest accepted retention window: 1000 years.
pub const MAX_RETENTION_HOURS: i64 = 24 * 365 * 1000;

/// Tunables for the paper ledger. Every field has a default, so a TOML file
/// only needs the keys it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Nominal capital the balance is measured against
    pub virtual_capital: f64,
    /// Trade history retention window in hours
    pub retention_hours: i64,
    /// Max absolute price drift per revaluation, in percent
    pub price_drift_pct: f64,
    /// Max absolute win-rate move per trade, in percentage points
    pub win_rate_step: f64,
    pub win_rate_min: f64,
    pub win_rate_max: f64,
    /// Max absolute profit-factor move per trade
    pub profit_factor_step: f64,
    pub profit_factor_min: f64,
    pub profit_factor_max: f64,
    pub initial_win_rate: f64,
    pub initial_profit_factor: f64,
    /// Seed for the default noise source. Entropy when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            virtual_capital: 100_000.0,
            retention_hours: 72,
            price_drift_pct: 1.5,
            win_rate_step: 1.5,
            win_rate_min: 10.0,
            win_rate_max: 90.0,
            profit_factor_step: 0.10,
            profit_factor_min: 0.5,
            profit_factor_max: 5.0,
            initial_win_rate: 64.0,
            initial_profit_factor: 1.8,
            seed: None,
        }
    }
}

impl LedgerConfig {
    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/artha/ledger.toml`
    /// Can be overridden with `ARTHA_LEDGER_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("ARTHA_LEDGER_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("artha/ledger.toml"))
            .unwrap_or_else(|| PathBuf::from("ledger.toml"))
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No ledger config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every bound is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.virtual_capital.is_finite() || self.virtual_capital <= 0.0 {
            return Err(Error::Config(format!(
                "virtual_capital must be positive, got {}",
                self.virtual_capital
            )));
        }
        if !(1..=MAX_RETENTION_HOURS).contains(&self.retention_hours) {
            return Err(Error::Config(format!(
                "retention_hours must be in [1, {}], got {}",
                MAX_RETENTION_HOURS, self.retention_hours
            )));
        }
        if !(0.0..100.0).contains(&self.price_drift_pct) {
            return Err(Error::Config(format!(
                "price_drift_pct must be in [0, 100), got {}",
                self.price_drift_pct
            )));
        }
        for (name, step) in [
            ("win_rate_step", self.win_rate_step),
            ("profit_factor_step", self.profit_factor_step),
        ] {
            if !step.is_finite() || step < 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be finite and non-negative, got {step}"
                )));
            }
        }
        check_bounds(
            "win_rate",
            self.win_rate_min,
            self.win_rate_max,
            self.initial_win_rate,
        )?;
        check_bounds(
            "profit_factor",
            self.profit_factor_min,
            self.profit_factor_max,
            self.initial_profit_factor,
        )?;
        Ok(())
    }

    /// Retention window as a duration, held to `[1, MAX_RETENTION_HOURS]` hours.
    pub fn retention_window(&self) -> Duration {
        Duration::hours(self.retention_hours.clamp(1, MAX_RETENTION_HOURS))
    }

    /// Max price drift as a fraction (1.5% -> 0.015).
    pub fn drift_fraction(&self) -> f64 {
        self.price_drift_pct / 100.0
    }
}

fn check_bounds(name: &str, min: f64, max: f64, initial: f64) -> Result<()> {
    if min > max {
        return Err(Error::Config(format!(
            "{name}_min ({min}) is above {name}_max ({max})"
        )));
    }
    if !(min..=max).contains(&initial) {
        return Err(Error::Config(format!(
            "initial_{name} ({initial}) is outside [{min}, {max}]"
        )));
    }
    Ok(())
}
