//! Live preview state.
//!
//! [`Preview`] is the context object shared by the HTTP handlers and the
//! background monitor. Each piece of mutable state has exactly one owner:
//!
//! | Resource                      | Owner              |
//! |-------------------------------|--------------------|
//! | pointer, heartbeat, active    | [`LivenessTracker`] |
//! | watch handle                  | [`WatchManager`]    |
//! | subscriber set                | [`Broadcaster`]     |
//!
//! Locks are only ever nested in the order liveness → watch → subscribers.

pub mod broadcast;
pub mod liveness;
pub mod message;
pub mod monitor;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use broadcast::{Broadcaster, SubscriberId};
pub use liveness::{LivenessSnapshot, LivenessTracker};
pub use message::ReloadEvent;
pub use watch::WatchManager;

use crate::config::PreviewConfig;
use crate::core::PreviewError;
use crate::entry::{EntryDocument, EntryResolver};

/// Timing and location parameters of a preview session.
#[derive(Debug, Clone)]
pub struct PreviewSettings {
    pub docs_root: PathBuf,
    pub timeout: Duration,
    pub check_interval: Duration,
    pub keepalive: Duration,
    pub coalesce: Duration,
    pub idle_check: Duration,
}

impl PreviewSettings {
    /// Default timings for `docs_root`.
    pub fn new(docs_root: PathBuf) -> Self {
        Self {
            docs_root,
            timeout: Duration::from_millis(30_000),
            check_interval: Duration::from_millis(5_000),
            keepalive: Duration::from_millis(15_000),
            coalesce: Duration::from_millis(100),
            idle_check: broadcast::DEFAULT_IDLE_CHECK,
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.liveness.timeout_ms),
            check_interval: Duration::from_millis(config.liveness.check_interval_ms),
            keepalive: Duration::from_millis(config.events.keepalive_ms),
            coalesce: Duration::from_millis(config.events.coalesce_ms),
            idle_check: Duration::from_millis(config.events.idle_check_ms),
            ..Self::new(config.docs_root())
        }
    }
}

/// Shared preview context.
pub struct Preview {
    settings: PreviewSettings,
    liveness: LivenessTracker,
    watch: Arc<WatchManager>,
    broadcaster: Arc<Broadcaster>,
    resolver: EntryResolver,
}

impl Preview {
    pub fn new(settings: PreviewSettings) -> Self {
        let broadcaster = Arc::new(Broadcaster::with_idle_check(settings.idle_check));
        let watch = Arc::new(WatchManager::new(
            settings.docs_root.clone(),
            Arc::clone(&broadcaster),
            settings.coalesce,
        ));
        let liveness = LivenessTracker::new(settings.timeout, Arc::clone(&watch));
        let resolver = EntryResolver::new(settings.docs_root.clone());

        Self {
            settings,
            liveness,
            watch,
            broadcaster,
            resolver,
        }
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    pub fn docs_root(&self) -> &Path {
        &self.settings.docs_root
    }

    pub fn liveness(&self) -> &LivenessTracker {
        &self.liveness
    }

    #[cfg(test)]
    pub fn watch(&self) -> &WatchManager {
        &self.watch
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// The current entry, or why it cannot be shown.
    pub fn resolve_entry(&self) -> Result<EntryDocument, PreviewError> {
        self.resolver.resolve(&self.liveness.snapshot())
    }

    /// Manually push an update to every subscriber.
    pub fn refresh(&self) -> usize {
        let delivered = self.broadcaster.broadcast(ReloadEvent::Update);
        crate::log!("events"; "manual refresh sent to {} clients", delivered);
        delivered
    }

    /// Release the watch and drop every subscriber.
    pub fn shutdown(&self) {
        self.watch.release();
        self.broadcaster.clear();
    }
}
