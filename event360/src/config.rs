//! Application configuration.
//!
//! Loaded from environment variables with defaults that run out of the box
//! against the demo gateway. A variable that is missing or fails to parse
//! falls back to its default; configuration never aborts startup.

use crate::listing::DEFAULT_PAGE_SIZE;
use crate::types::EventId;
use event360_runtime::StoreConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// | Field | Variable | Default |
/// |---|---|---|
/// | `default_event_id` | `EVENT360_DEFAULT_EVENT_ID` | `EV-001` |
/// | `page_size` | `EVENT360_PAGE_SIZE` | `4` |
/// | `broadcast_capacity` | `EVENT360_BROADCAST_CAPACITY` | `16` |
/// | `shutdown_timeout_secs` | `EVENT360_SHUTDOWN_TIMEOUT_SECS` | `30` |
/// | `metrics_addr` | `EVENT360_METRICS_ADDR` | unset (exporter off) |
/// | `log_filter` | `RUST_LOG` | `info,event360=debug` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Event the registration screens open on.
    pub default_event_id: EventId,

    /// Rows per listing page.
    pub page_size: usize,

    /// Capacity of each store's action broadcast channel.
    pub broadcast_capacity: usize,

    /// Graceful shutdown timeout, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Prometheus scrape address; the exporter stays off when unset.
    pub metrics_addr: Option<SocketAddr>,

    /// Default tracing filter when `RUST_LOG` says nothing.
    pub log_filter: String,
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// The shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Store configuration derived from this config.
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.broadcast_capacity, self.shutdown_timeout())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            default_event_id: lookup("EVENT360_DEFAULT_EVENT_ID")
                .filter(|value| !value.trim().is_empty())
                .map_or(defaults.default_event_id, EventId::new),
            page_size: lookup("EVENT360_PAGE_SIZE")
                .and_then(|value| value.parse().ok())
                .filter(|&size| size > 0)
                .unwrap_or(defaults.page_size),
            broadcast_capacity: lookup("EVENT360_BROADCAST_CAPACITY")
                .and_then(|value| value.parse().ok())
                .filter(|&capacity| capacity > 0)
                .unwrap_or(defaults.broadcast_capacity),
            shutdown_timeout_secs: lookup("EVENT360_SHUTDOWN_TIMEOUT_SECS")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.shutdown_timeout_secs),
            metrics_addr: lookup("EVENT360_METRICS_ADDR").and_then(|value| value.parse().ok()),
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_event_id: EventId::new("EV-001"),
            page_size: DEFAULT_PAGE_SIZE,
            broadcast_capacity: 16,
            shutdown_timeout_secs: 30,
            metrics_addr: None,
            log_filter: "info,event360=debug".to_string(),
        }
    }
}
