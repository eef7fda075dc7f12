//! Event broadcast channel.
//!
//! Holds the set of long-lived event-stream connections and pushes
//! [`ReloadEvent`]s to all of them.
//!
//! ```text
//! broadcast() ──try_send──> bounded queue ──> writer thread ──> socket
//!                                                  │
//!                                write error ──> unsubscribe(id)
//! ```
//!
//! Every connection is owned by its own writer thread, so a slow peer never
//! blocks the caller or holds the subscriber lock. While idle the writer
//! sends an SSE comment every `idle_check` interval; a peer that closed its end
//! makes that write fail, and the thread removes its own subscription. A
//! subscriber whose queue is full (a stalled peer) is dropped on the spot.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::message::{IDLE_FRAME, ReloadEvent};

/// Events that may wait for a single slow subscriber.
const QUEUE_DEPTH: usize = 16;

/// Default idle interval after which a writer checks its connection.
pub const DEFAULT_IDLE_CHECK: Duration = Duration::from_secs(1);

/// Identity of a subscribed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Writable end of a subscriber connection.
pub type Sink = Box<dyn Write + Send>;

/// Set of event-stream subscribers.
pub struct Broadcaster {
    subscribers: Mutex<FxHashMap<SubscriberId, Sender<ReloadEvent>>>,
    next_id: AtomicU64,
    idle_check: Duration,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_idle_check(DEFAULT_IDLE_CHECK)
    }

    pub fn with_idle_check(idle_check: Duration) -> Self {
        Self {
            subscribers: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(0),
            idle_check,
        }
    }

    /// Add a connection to the set and start its writer thread.
    pub fn subscribe(self: &Arc<Self>, sink: Sink) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = channel::bounded(QUEUE_DEPTH);

        {
            let mut subscribers = self.subscribers.lock();
            subscribers.insert(id, tx);
            crate::debug!("events"; "client connected (total: {})", subscribers.len());
        }

        let owner = Arc::downgrade(self);
        let idle_check = self.idle_check;
        let spawned = thread::Builder::new()
            .name(format!("events-{}", id.0))
            .spawn(move || run_writer(sink, &rx, idle_check, &owner, id));

        if let Err(e) = spawned {
            crate::log!("events"; "failed to start client writer: {}", e);
            self.unsubscribe(id);
        }
        id
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let removed = subscribers.remove(&id).is_some();
        if removed {
            crate::debug!("events"; "client disconnected (total: {})", subscribers.len());
        }
        removed
    }

    /// Queue `event` for every subscriber, dropping those that cannot take it.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn broadcast(&self, event: ReloadEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            return 0;
        }

        subscribers.retain(|id, tx| match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                crate::debug!("events"; "client {} stalled, dropping", id.0);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        });

        crate::debug!("events"; "{} sent to {} clients", event.as_str(), subscribers.len());
        subscribers.len()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    /// Drop every connection (server shutdown).
    pub fn clear(&self) {
        self.subscribers.lock().clear();
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer thread body: deliver queued events, send comments while idle.
fn run_writer(
    mut sink: Sink,
    rx: &Receiver<ReloadEvent>,
    idle_check: Duration,
    owner: &Weak<Broadcaster>,
    id: SubscriberId,
) {
    if let Err(e) = pump(&mut sink, rx, idle_check) {
        crate::debug!("events"; "client {} closed: {}", id.0, e);
        if let Some(broadcaster) = owner.upgrade() {
            broadcaster.unsubscribe(id);
        }
    }
}

/// Returns `Ok` once the subscription is dropped, `Err` when the peer is gone.
fn pump(sink: &mut Sink, rx: &Receiver<ReloadEvent>, idle_check: Duration) -> io::Result<()> {
    loop {
        let frame = match rx.recv_timeout(idle_check) {
            Ok(event) => event.frame(),
            Err(RecvTimeoutError::Timeout) => IDLE_FRAME,
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };
        sink.write_all(frame.as_bytes())?;
        sink.flush()?;
    }
}

// ============================================================================
// Tests
// ============================================================================
