//! Background tasks of a running preview server.
//!
//! One loop drives both periodic jobs, so a liveness check never overlaps
//! another one:
//!
//! - liveness check every `check_interval`
//! - keepalive `ping` every `keepalive`

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::{Preview, ReloadEvent};

/// How often the shutdown channel is polled.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Run until a shutdown signal arrives or its sender is dropped.
pub async fn run(preview: Arc<Preview>, shutdown_rx: Receiver<()>) {
    let settings = preview.settings();

    let mut check = interval_at(Instant::now() + settings.check_interval, settings.check_interval);
    check.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut keepalive = interval_at(Instant::now() + settings.keepalive, settings.keepalive);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut poll = tokio::time::interval(SHUTDOWN_POLL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = check.tick() => {
                preview.liveness().check();
            }
            _ = keepalive.tick() => {
                preview.broadcaster().broadcast(ReloadEvent::Ping);
            }
            _ = poll.tick() => {
                match shutdown_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) if crate::core::is_shutdown() => break,
                    Err(TryRecvError::Empty) => {}
                }
            }
        }
    }

    crate::debug!("live"; "monitor stopped");
}
