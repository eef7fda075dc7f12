//! `[events]` section configuration.
//!
//! ```toml
//! [events]
//! keepalive_ms = 15000    # Interval of `ping` events on /events
//! coalesce_ms = 100       # Window that folds a burst of file events into one update
//! idle_check_ms = 1000    # Idle time after which a stream checks its connection
//! ```

use serde::{Deserialize, Serialize};

/// Event stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub keepalive_ms: u64,
    pub coalesce_ms: u64,
    pub idle_check_ms: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            keepalive_ms: 15_000,
            coalesce_ms: 100,
            idle_check_ms: 1_000,
        }
    }
}
