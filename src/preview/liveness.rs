//! Producer liveness tracking.
//!
//! State machine over `{pointer, last_heartbeat, active}`:
//!
//! ```text
//!              register(p)                     heartbeat()
//!   (none) ──────────────────> active ──────────────────────> active
//!                                │  ^
//!              check(): timeout  │  │ heartbeat()
//!                                v  │ (rebinds watch)
//!                              inactive
//! ```
//!
//! A timeout only flips the flag and releases the watch; the pointer is
//! kept, so the last registered entry remains visible through `/pointer`.
//! Both happen under the same lock, so no request can observe an inactive
//! tracker that still holds a watch (or the reverse).

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::watch::WatchManager;
use crate::core::{Pointer, PreviewError};

#[derive(Debug, Default)]
struct LivenessState {
    pointer: Option<Pointer>,
    last_heartbeat: Option<Instant>,
    active: bool,
}

/// Consistent view of the liveness state at one instant.
#[derive(Debug, Clone)]
pub struct LivenessSnapshot {
    pub pointer: Option<Pointer>,
    pub active: bool,
}

/// Owner of the current pointer and the heartbeat clock.
pub struct LivenessTracker {
    state: Mutex<LivenessState>,
    timeout: Duration,
    watch: Arc<WatchManager>,
}

impl LivenessTracker {
    pub fn new(timeout: Duration, watch: Arc<WatchManager>) -> Self {
        Self {
            state: Mutex::new(LivenessState::default()),
            timeout,
            watch,
        }
    }

    /// Register `raw` as the current entry and mark the producer alive.
    ///
    /// On invalid input nothing changes.
    pub fn register(&self, raw: Option<&str>) -> Result<Pointer, PreviewError> {
        let pointer = Pointer::parse(raw.unwrap_or_default())?;

        let mut state = self.state.lock();
        state.pointer = Some(pointer.clone());
        state.last_heartbeat = Some(Instant::now());
        state.active = true;
        self.watch.bind_to(&pointer);

        crate::log!("live"; "registered {}", pointer);
        Ok(pointer)
    }

    /// Refresh the heartbeat clock.
    ///
    /// Re-attaches the watch unless it already follows the pointer (the
    /// entry file appeared after registration, or the producer is back
    /// after a timeout).
    pub fn heartbeat(&self) -> Result<(), PreviewError> {
        let mut state = self.state.lock();
        let Some(pointer) = state.pointer.clone() else {
            return Err(PreviewError::NotRegistered);
        };

        if !state.active {
            crate::log!("live"; "producer is back ({})", pointer);
        }
        state.last_heartbeat = Some(Instant::now());
        state.active = true;

        if self.watch.watched_pointer().as_ref() != Some(&pointer) {
            self.watch.bind_to(&pointer);
        }

        crate::debug!("live"; "heartbeat received");
        Ok(())
    }

    pub fn current_pointer(&self) -> Option<Pointer> {
        self.state.lock().pointer.clone()
    }

    /// Whether a heartbeat arrived within the timeout window.
    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.snapshot().active
    }

    /// Read pointer and liveness together.
    pub fn snapshot(&self) -> LivenessSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> LivenessSnapshot {
        let state = self.state.lock();
        LivenessSnapshot {
            pointer: state.pointer.clone(),
            active: state.active && !self.expired(&state, now),
        }
    }

    /// Periodic liveness check. Returns `true` if the producer just became
    /// inactive.
    pub fn check(&self) -> bool {
        self.check_at(Instant::now())
    }

    pub(crate) fn check_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        if !state.active || !self.expired(&state, now) {
            return false;
        }

        state.active = false;
        self.watch.release();

        let pointer = state.pointer.as_ref().map(Pointer::as_str).unwrap_or("-");
        crate::log!("live"; "producer inactive, stopped watching {}", pointer);
        true
    }

    fn expired(&self, state: &LivenessState, now: Instant) -> bool {
        state
            .last_heartbeat
            .is_none_or(|t| now.saturating_duration_since(t) > self.timeout)
    }
}

// ============================================================================
// Tests
// ============================================================================
