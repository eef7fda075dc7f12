//! File watch manager.
//!
//! Watches the single registered `entry.md` and broadcasts
//! [`ReloadEvent::Update`] when it changes.
//!
//! ```text
//! notify watcher ──(entry.md events)──> coalesce thread ──> Broadcaster
//! ```
//!
//! The watch is attached to the entry's directory rather than the file
//! itself: editors that save by rename replace the inode, which would
//! silently end a file-level watch. Events are filtered to `entry.md`.
//!
//! At most one binding exists. [`WatchManager::bind_to`] always releases
//! the previous binding before creating the next one, and every live
//! handle is counted so leaks are observable.

mod coalesce;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::broadcast::Broadcaster;
use super::message::ReloadEvent;
use crate::core::{ENTRY_FILE, Pointer};

/// Owner of the (at most one) active entry watch.
pub struct WatchManager {
    docs_root: PathBuf,
    broadcaster: Arc<Broadcaster>,
    coalesce: Duration,
    binding: Mutex<Option<WatchBinding>>,
    live_handles: Arc<AtomicUsize>,
}

/// Association between a pointer and its active watch.
struct WatchBinding {
    pointer: Pointer,
    path: PathBuf,
    _handle: WatchHandle,
}

/// Live notify watcher. Dropping it stops the watch and the coalesce thread.
struct WatchHandle {
    _watcher: RecommendedWatcher,
    live: Arc<AtomicUsize>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WatchManager {
    pub fn new(docs_root: PathBuf, broadcaster: Arc<Broadcaster>, coalesce: Duration) -> Self {
        Self {
            docs_root,
            broadcaster,
            coalesce,
            binding: Mutex::new(None),
            live_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Release any existing watch, then watch `pointer`'s entry file.
    ///
    /// Returns `true` if a watch is active afterwards. A missing entry file
    /// is not an error: nothing is watched and a later rebind may succeed.
    pub fn bind_to(&self, pointer: &Pointer) -> bool {
        let mut binding = self.binding.lock();

        if let Some(old) = binding.take() {
            crate::debug!("watch"; "released {}", old.path.display());
        }

        let path = pointer.entry_path(&self.docs_root);
        if !path.is_file() {
            crate::debug!("watch"; "{} does not exist yet, not watching", path.display());
            return false;
        }

        match self.spawn_handle(&path) {
            Ok(handle) => {
                crate::log!("watch"; "watching {}", path.display());
                *binding = Some(WatchBinding {
                    pointer: pointer.clone(),
                    path,
                    _handle: handle,
                });
                true
            }
            Err(e) => {
                crate::log!("watch"; "failed to watch {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Stop the active watch, if any. Safe to call repeatedly.
    pub fn release(&self) {
        if let Some(old) = self.binding.lock().take() {
            crate::log!("watch"; "stopped watching {}", old.path.display());
        }
    }

    #[cfg(test)]
    pub fn is_watching(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// Pointer of the active binding.
    pub fn watched_pointer(&self) -> Option<Pointer> {
        self.binding.lock().as_ref().map(|b| b.pointer.clone())
    }

    /// Number of watcher handles currently alive (0 or 1 unless leaking).
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }

    fn spawn_handle(&self, path: &Path) -> anyhow::Result<WatchHandle> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("entry path has no parent directory"))?;

        let (tx, rx) = crossbeam::channel::unbounded::<()>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if touches_entry(&event) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let broadcaster = Arc::clone(&self.broadcaster);
        let window = self.coalesce;
        let label = path.display().to_string();
        std::thread::Builder::new()
            .name("entry-watch".into())
            .spawn(move || {
                coalesce::forward(&rx, window, || {
                    crate::log!("watch"; "{} changed, notifying clients", label);
                    broadcaster.broadcast(ReloadEvent::Update);
                });
            })?;

        self.live_handles.fetch_add(1, Ordering::SeqCst);
        Ok(WatchHandle {
            _watcher: watcher,
            live: Arc::clone(&self.live_handles),
        })
    }
}

/// Whether a raw event concerns the entry file's content or metadata.
fn touches_entry(event: &notify::Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| name == ENTRY_FILE))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::broadcast::tests::MemorySink;
    use std::fs;
    use std::time::Instant;
    use tempfile::TempDir;

    fn make_entry(root: &Path, name: &str) -> Pointer {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ENTRY_FILE), "---\ntitle: t\n---\nbody").unwrap();
        Pointer::parse(name).unwrap()
    }

    fn manager(root: &Path) -> (WatchManager, Arc<Broadcaster>) {
        let broadcaster = Arc::new(Broadcaster::new());
        let manager = WatchManager::new(
            root.to_path_buf(),
            Arc::clone(&broadcaster),
            Duration::from_millis(20),
        );
        (manager, broadcaster)
    }

    fn make_event(path: &str, kind: EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths: vec![PathBuf::from(path)],
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_bind_missing_file_is_noop() {
        let temp = TempDir::new().unwrap();
        let (manager, _) = manager(temp.path());
        let pointer = Pointer::parse("2024-01-01").unwrap();

        assert!(!manager.bind_to(&pointer));
        assert!(!manager.is_watching());
        assert_eq!(manager.live_handles(), 0);
    }

    #[test]
    fn test_bind_existing_file() {
        let temp = TempDir::new().unwrap();
        let (manager, _) = manager(temp.path());
        let pointer = make_entry(temp.path(), "2024-01-01");

        assert!(manager.bind_to(&pointer));
        assert_eq!(manager.watched_pointer(), Some(pointer.clone()));
        assert_eq!(manager.live_handles(), 1);
    }

    #[test]
    fn test_rebinding_never_leaks_handles() {
        let temp = TempDir::new().unwrap();
        let (manager, _) = manager(temp.path());
        let pointers: Vec<_> = (0..4)
            .map(|i| make_entry(temp.path(), &format!("day-{i}")))
            .collect();

        for i in 0..100 {
            assert!(manager.bind_to(&pointers[i % pointers.len()]));
            assert_eq!(manager.live_handles(), 1);
        }
        assert_eq!(manager.watched_pointer(), Some(pointers[99 % 4].clone()));
    }

    #[test]
    fn test_rebind_to_missing_releases_old_watch() {
        let temp = TempDir::new().unwrap();
        let (manager, _) = manager(temp.path());
        let existing = make_entry(temp.path(), "a");

        assert!(manager.bind_to(&existing));
        assert!(!manager.bind_to(&Pointer::parse("missing").unwrap()));
        assert!(!manager.is_watching());
        assert_eq!(manager.live_handles(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let (manager, _) = manager(temp.path());
        let pointer = make_entry(temp.path(), "a");

        manager.release();
        manager.bind_to(&pointer);
        manager.release();
        manager.release();
        assert!(!manager.is_watching());
        assert_eq!(manager.live_handles(), 0);
    }

    #[test]
    fn test_touches_entry_filter() {
        use notify::event::{AccessKind, DataChange, MetadataKind, ModifyKind};

        let data = EventKind::Modify(ModifyKind::Data(DataChange::Any));
        let meta = EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any));
        let access = EventKind::Access(AccessKind::Any);

        assert!(touches_entry(&make_event("/d/2024/entry.md", data)));
        assert!(touches_entry(&make_event("/d/2024/entry.md", meta)));
        assert!(!touches_entry(&make_event("/d/2024/entry.md", access)));
        assert!(!touches_entry(&make_event("/d/2024/notes.md", data)));
        assert!(!touches_entry(&make_event("/d/2024/.entry.md.swp", data)));
    }

    #[test]
    fn test_modification_broadcasts_update() {
        let temp = TempDir::new().unwrap();
        let (manager, broadcaster) = manager(temp.path());
        let pointer = make_entry(temp.path(), "2024-01-01");
        let sink = MemorySink::default();
        broadcaster.subscribe(Box::new(sink.clone()));

        assert!(manager.bind_to(&pointer));
        fs::write(pointer.entry_path(temp.path()), "changed").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.count(ReloadEvent::Update) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(sink.count(ReloadEvent::Update) >= 1);
        assert_eq!(broadcaster.len(), 1);
    }

    #[test]
    fn test_sibling_file_does_not_broadcast() {
        let temp = TempDir::new().unwrap();
        let (manager, broadcaster) = manager(temp.path());
        let pointer = make_entry(temp.path(), "2024-01-01");
        let sink = MemorySink::default();
        broadcaster.subscribe(Box::new(sink.clone()));

        assert!(manager.bind_to(&pointer));
        fs::write(temp.path().join("2024-01-01").join("notes.txt"), "x").unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(sink.count(ReloadEvent::Update), 0);
    }
}
