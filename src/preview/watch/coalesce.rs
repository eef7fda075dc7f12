//! Burst coalescing for raw filesystem events.
//!
//! Editors usually produce several events per save (truncate, write,
//! chmod, rename). Events arriving within `window` of the first one are
//! folded into a single notification.

use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};

/// Forward coalesced events from `rx` to `notify` until the sender is gone.
///
/// The sender lives inside the watcher callback, so dropping the watcher
/// ends this loop. A burst cut short by the drop is discarded: a released
/// watch never notifies.
pub(super) fn forward(rx: &Receiver<()>, window: Duration, notify: impl Fn()) {
    while rx.recv().is_ok() {
        let deadline = Instant::now() + window;
        loop {
            match rx.recv_deadline(deadline) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn spawn_forwarder(
        window: Duration,
    ) -> (channel::Sender<()>, Arc<AtomicUsize>, thread::JoinHandle<()>) {
        let (tx, rx) = channel::unbounded();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = thread::spawn(move || {
            forward(&rx, window, || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });
        (tx, count, handle)
    }

    #[test]
    fn test_burst_becomes_one_notification() {
        let (tx, count, handle) = spawn_forwarder(Duration::from_millis(50));
        for _ in 0..5 {
            tx.send(()).unwrap();
        }
        thread::sleep(Duration::from_millis(200));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_separate_bursts_notify_separately() {
        let (tx, count, handle) = spawn_forwarder(Duration::from_millis(20));
        tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(150));
        tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(150));
        assert_eq!(count.load(Ordering::SeqCst), 2);

        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_drop_mid_burst_discards() {
        let (tx, count, handle) = spawn_forwarder(Duration::from_millis(500));
        tx.send(()).unwrap();
        drop(tx);
        handle.join().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
