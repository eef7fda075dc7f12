//! `[liveness]` section configuration.
//!
//! ```toml
//! [liveness]
//! timeout_ms = 30000              # Producer counts as gone after this
//! check_interval_ms = 5000        # How often the server checks
//! heartbeat_interval_ms = 10000   # How often `attach` sends a heartbeat
//! ```

use serde::{Deserialize, Serialize};

/// Producer heartbeat timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub timeout_ms: u64,
    pub check_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            check_interval_ms: 5_000,
            heartbeat_interval_ms: 10_000,
        }
    }
}
