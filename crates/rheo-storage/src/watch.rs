// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Polled change watcher with debounced notifications
//!
//! Each tick enumerates the watched directory, diffs against the previous
//! snapshot, and emits one event per changed path; bursts within a tick
//! collapse into the latest state. A removal and an addition in the same
//! tick with identical size and timestamps are coalesced into `Renamed`.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// Watcher tuning.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Poll interval; changes inside one interval are debounced.
    pub interval: Duration,
    /// Also watch nested directories, bounded by `max_depth`.
    pub recursive: bool,
    pub max_depth: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            recursive: false,
            max_depth: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChangeType {
    Created,
    Deleted,
    Modified,
    Renamed,
}

/// Lightweight per-entry metadata kept between ticks.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub is_dir: bool,
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
}

#[derive(Clone, Debug)]
pub struct StorageChangedEventArgs {
    pub path: PathBuf,
    pub change_type: ChangeType,
    pub old_info: Option<EntrySnapshot>,
    pub new_info: Option<EntrySnapshot>,
}

/// Change subscriber; invoked on the watcher thread.
pub trait ChangeSink: Send + Sync {
    fn on_change(&self, event: &StorageChangedEventArgs);
}

impl<F> ChangeSink for F
where
    F: Fn(&StorageChangedEventArgs) + Send + Sync,
{
    fn on_change(&self, event: &StorageChangedEventArgs) {
        self(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Polled watcher over one directory. Dropping the watcher stops the poll
/// thread and detaches all subscribers.
pub struct DirectoryWatcher {
    shared: Arc<WatcherShared>,
    thread: Option<JoinHandle<()>>,
}

struct WatcherShared {
    root: PathBuf,
    config: WatchConfig,
    running: AtomicBool,
    next_subscription: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionId, Arc<dyn ChangeSink>>>,
    snapshot: Mutex<HashMap<PathBuf, EntrySnapshot>>,
}

impl DirectoryWatcher {
    /// Prime the snapshot and start the poll thread.
    pub fn start(root: PathBuf, config: WatchConfig) -> Self {
        let shared = Arc::new(WatcherShared {
            root,
            config,
            running: AtomicBool::new(true),
            next_subscription: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
            snapshot: Mutex::new(HashMap::new()),
        });
        *shared.snapshot.lock().unwrap() = shared.scan();

        let thread_shared = shared.clone();
        let thread = std::thread::spawn(move || {
            debug!(root = %thread_shared.root.display(), "watcher started");
            while thread_shared.running.load(Ordering::SeqCst) {
                // Short sleep slices so stop() returns promptly.
                let deadline = Instant::now() + thread_shared.config.interval;
                while Instant::now() < deadline {
                    if !thread_shared.running.load(Ordering::SeqCst) {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(
                        25.min(thread_shared.config.interval.as_millis() as u64).max(1),
                    ));
                }
                thread_shared.tick();
            }
        });

        Self {
            shared,
            thread: Some(thread),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Stop the poll thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    pub fn subscribe(&self, sink: Arc<dyn ChangeSink>) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.shared.subscribers.lock().unwrap().insert(id, sink);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.lock().unwrap().remove(&id).is_some()
    }

    /// Fold an externally performed creation into the snapshot and notify
    /// subscribers immediately, so the next tick does not re-report it.
    pub(crate) fn note_created(&self, path: &Path) {
        if let Some(info) = snapshot_entry(path) {
            self.shared
                .snapshot
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), info.clone());
            self.shared.emit(&StorageChangedEventArgs {
                path: path.to_path_buf(),
                change_type: ChangeType::Created,
                old_info: None,
                new_info: Some(info),
            });
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
        self.shared.subscribers.lock().unwrap().clear();
    }
}

impl WatcherShared {
    fn scan(&self) -> HashMap<PathBuf, EntrySnapshot> {
        let mut entries = HashMap::new();
        self.scan_dir(&self.root, 0, &mut entries);
        entries
    }

    fn scan_dir(&self, dir: &Path, depth: usize, entries: &mut HashMap<PathBuf, EntrySnapshot>) {
        let reader = match std::fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(err) => {
                warn!(path = %dir.display(), %err, "watcher cannot enumerate directory");
                return;
            }
        };
        for entry in reader.flatten() {
            let path = entry.path();
            if let Some(info) = snapshot_entry(&path) {
                let descend = info.is_dir && self.config.recursive && depth < self.config.max_depth;
                entries.insert(path.clone(), info);
                if descend {
                    self.scan_dir(&path, depth + 1, entries);
                }
            }
        }
    }

    fn tick(&self) {
        let new = self.scan();
        let old = {
            let mut snapshot = self.snapshot.lock().unwrap();
            std::mem::replace(&mut *snapshot, new.clone())
        };

        let mut created: Vec<&PathBuf> = new.keys().filter(|p| !old.contains_key(*p)).collect();
        let mut deleted: Vec<&PathBuf> = old.keys().filter(|p| !new.contains_key(*p)).collect();
        created.sort();
        deleted.sort();

        let mut events: Vec<StorageChangedEventArgs> = Vec::new();

        // Pair a removal with an addition carrying identical metadata into
        // a single rename notification.
        let mut consumed_created = vec![false; created.len()];
        for old_path in deleted.iter() {
            let old_info = &old[*old_path];
            let pair = created.iter().enumerate().find(|(idx, candidate)| {
                !consumed_created[*idx] && new[**candidate] == *old_info
            });
            if let Some((idx, new_path)) = pair {
                consumed_created[idx] = true;
                events.push(StorageChangedEventArgs {
                    path: (*new_path).clone(),
                    change_type: ChangeType::Renamed,
                    old_info: Some(old_info.clone()),
                    new_info: Some(new[*new_path].clone()),
                });
            } else {
                events.push(StorageChangedEventArgs {
                    path: (*old_path).clone(),
                    change_type: ChangeType::Deleted,
                    old_info: Some(old_info.clone()),
                    new_info: None,
                });
            }
        }
        for (idx, path) in created.iter().enumerate() {
            if !consumed_created[idx] {
                events.push(StorageChangedEventArgs {
                    path: (*path).clone(),
                    change_type: ChangeType::Created,
                    old_info: None,
                    new_info: Some(new[*path].clone()),
                });
            }
        }
        for (path, info) in &new {
            if let Some(old_info) = old.get(path) {
                if old_info != info {
                    events.push(StorageChangedEventArgs {
                        path: path.clone(),
                        change_type: ChangeType::Modified,
                        old_info: Some(old_info.clone()),
                        new_info: Some(info.clone()),
                    });
                }
            }
        }

        events.sort_by(|a, b| a.path.cmp(&b.path));
        for event in &events {
            self.emit(event);
        }
    }

    fn emit(&self, event: &StorageChangedEventArgs) {
        let sinks: Vec<Arc<dyn ChangeSink>> =
            self.subscribers.lock().unwrap().values().cloned().collect();
        for sink in sinks {
            sink.on_change(event);
        }
    }
}

fn snapshot_entry(path: &Path) -> Option<EntrySnapshot> {
    let metadata = std::fs::symlink_metadata(path).ok()?;
    Some(EntrySnapshot {
        is_dir: metadata.is_dir(),
        size: metadata.len(),
        created: metadata.created().ok(),
        modified: metadata.modified().ok(),
    })
}
