//! Broker configuration.
//!
//! Precedence: command-line flags, then `GRIDBROKER_*` environment variables
//! (both handled by clap), then the JSON config file, then defaults.

use std::path::Path;
use std::time::Duration;

use grid_lifecycle::WatchConfig;
use grid_lifecycle::config::DEFAULT_EXPLORER_URL;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Configuration for the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Explorer base URL for reservation links.
    pub explorer_url: String,
    /// Identity whose farms `verify-payment` checks by default.
    pub owner_id: Option<u64>,
    /// Delay between reservation polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Currency assumed for reservations that list none.
    pub default_currency: Option<String>,
    /// Consecutive fetch failures tolerated while waiting.
    pub max_fetch_failures: Option<u32>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            owner_id: None,
            poll_interval_ms: 1_000,
            default_currency: None,
            max_fetch_failures: None,
        }
    }
}

impl BrokerConfig {
    /// Load from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result is invalid.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| CliError::Config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else defaults.
    ///
    /// # Errors
    ///
    /// As [`Self::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CliError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Reject settings the broker cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] describing the first problem.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.explorer_url.trim().is_empty() {
            return Err(CliError::Config("explorer_url must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(CliError::Config("poll_interval_ms must be positive".into()));
        }
        if self.max_fetch_failures == Some(0) {
            return Err(CliError::Config("max_fetch_failures must be positive".into()));
        }
        Ok(())
    }

    /// Set the explorer URL.
    #[must_use]
    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = url.into();
        self
    }

    /// Set the owner identity.
    #[must_use]
    pub const fn with_owner_id(mut self, owner: u64) -> Self {
        self.owner_id = Some(owner);
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the default currency.
    #[must_use]
    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = Some(currency.into());
        self
    }

    /// Watcher settings derived from this configuration.
    #[must_use]
    pub fn watch_config(&self) -> WatchConfig {
        let config = WatchConfig::new(self.explorer_url.clone())
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms));
        match self.max_fetch_failures {
            Some(max) => config.with_max_fetch_failures(max),
            None => config,
        }
    }
}
