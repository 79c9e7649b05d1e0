//! Watcher configuration.

use std::time::Duration;

use grid_core::ReservationId;

/// Default explorer the failure link points at.
pub const DEFAULT_EXPLORER_URL: &str = "https://explorer.grid.tf/explorer";

/// Configuration for a [`crate::ReservationWatcher`].
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Delay between two fetches of the reservation.
    pub poll_interval: Duration,
    /// Explorer base URL used for reservation links.
    pub explorer_url: String,
    /// Give up after this many fetch failures in a row. `None` retries forever.
    pub max_fetch_failures: Option<u32>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            max_fetch_failures: None,
        }
    }
}

impl WatchConfig {
    /// Create a configuration pointing at `explorer_url`.
    #[must_use]
    pub fn new(explorer_url: impl Into<String>) -> Self {
        Self {
            explorer_url: explorer_url.into(),
            ..Self::default()
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the explorer base URL.
    #[must_use]
    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = url.into();
        self
    }

    /// Bound consecutive fetch failures.
    #[must_use]
    pub const fn with_max_fetch_failures(mut self, max: u32) -> Self {
        self.max_fetch_failures = Some(max);
        self
    }

    /// Explorer link for a reservation.
    #[must_use]
    pub fn reservation_link(&self, id: ReservationId) -> String {
        format!("{}/reservations/{id}", self.explorer_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.explorer_url, DEFAULT_EXPLORER_URL);
        assert!(config.max_fetch_failures.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = WatchConfig::new("https://explorer.testnet.grid.tf/explorer/")
            .with_poll_interval(Duration::from_millis(250))
            .with_max_fetch_failures(3);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_fetch_failures, Some(3));
        assert_eq!(
            config.reservation_link(ReservationId(12)),
            "https://explorer.testnet.grid.tf/explorer/reservations/12"
        );
    }
}
