// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Directory handle
//!
//! Carries the change-watch lifecycle: `start_watching`/`stop_watching`
//! own a polled watcher whose subscribers detach when the handle drops.
//! Directory information is a snapshot computed at access time.

use crate::file::{run_blocking, StorageFile};
use crate::info::provider;
use crate::ops::{self, OperationOptions};
use crate::types::DirectoryInformation;
use crate::watch::{ChangeSink, DirectoryWatcher, SubscriptionId, WatchConfig};
use rheo_defs::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

pub struct StorageDirectory {
    path: PathBuf,
    watcher: Mutex<Option<DirectoryWatcher>>,
}

impl StorageDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            watcher: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Snapshot with recursive aggregates, computed now (not at handle
    /// creation). Permission failures while descending degrade to `-1`
    /// counts and a zero size instead of erroring.
    pub fn information(&self) -> StorageResult<DirectoryInformation> {
        let record = provider().stat(&self.path)?;
        let mut aggregate = Aggregate::default();
        aggregate_tree(&self.path, &mut aggregate);
        if aggregate.denied {
            return Ok(DirectoryInformation {
                record,
                file_count: -1,
                directory_count: -1,
                size: 0,
            });
        }
        Ok(DirectoryInformation {
            record,
            file_count: aggregate.files as i64,
            directory_count: aggregate.dirs as i64,
            size: aggregate.size,
        })
    }

    /// Direct child files, in directory order.
    pub fn files(&self) -> StorageResult<Vec<StorageFile>> {
        let mut files = Vec::new();
        for entry in self.read_children()? {
            if entry.is_file() {
                files.push(StorageFile::new(entry));
            }
        }
        Ok(files)
    }

    /// Direct child directories, in directory order.
    pub fn directories(&self) -> StorageResult<Vec<StorageDirectory>> {
        let mut dirs = Vec::new();
        for entry in self.read_children()? {
            if entry.is_dir() {
                dirs.push(StorageDirectory::new(entry));
            }
        }
        Ok(dirs)
    }

    fn read_children(&self) -> StorageResult<Vec<PathBuf>> {
        let reader = std::fs::read_dir(&self.path)
            .map_err(|err| StorageError::from_io(err, &self.path))?;
        let mut children = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|err| StorageError::from_io(err, &self.path))?;
            children.push(entry.path());
        }
        Ok(children)
    }

    /// Create (or reuse) a child directory.
    pub fn create_dir(&self, name: &str) -> StorageResult<StorageDirectory> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidArgument(format!(
                "invalid directory name: {name:?}"
            )));
        }
        let path = self.path.join(name);
        std::fs::create_dir_all(&path).map_err(|err| StorageError::from_io(err, &path))?;
        Ok(StorageDirectory::new(path))
    }

    /// Handle for a direct child file; the file need not exist yet.
    pub fn file(&self, name: &str) -> StorageFile {
        StorageFile::new(self.path.join(name))
    }

    /// Write a file inside this directory. On success a `Created` change
    /// event is emitted through the active watcher, if any.
    pub fn create_file(
        &self,
        name: &str,
        bytes: &[u8],
        options: &OperationOptions,
    ) -> StorageResult<StorageFile> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidArgument(format!(
                "invalid file name: {name:?}"
            )));
        }
        let path = self.path.join(name);
        ops::write_file(&path, bytes, options)?;
        if let Some(watcher) = self.watcher.lock().unwrap().as_ref() {
            watcher.note_created(&path);
        }
        Ok(StorageFile::new(path))
    }

    pub fn copy_to(&self, dest: &Path, options: &OperationOptions) -> StorageResult<StorageDirectory> {
        ops::copy_dir(&self.path, dest, options).map(StorageDirectory::new)
    }

    pub fn move_to(self, dest: &Path, options: &OperationOptions) -> StorageResult<StorageDirectory> {
        self.stop_watching();
        ops::move_dir(&self.path, dest, options).map(StorageDirectory::new)
    }

    pub fn rename(self, new_name: &str) -> StorageResult<StorageDirectory> {
        self.stop_watching();
        ops::rename(&self.path, new_name).map(StorageDirectory::new)
    }

    pub fn delete(self) -> StorageResult<()> {
        self.stop_watching();
        ops::delete_dir(&self.path)
    }

    pub async fn copy_to_async(
        &self,
        dest: &Path,
        options: &OperationOptions,
    ) -> StorageResult<StorageDirectory> {
        let src = self.path.clone();
        let dest = dest.to_path_buf();
        let options = options.clone();
        run_blocking(move || ops::copy_dir(&src, &dest, &options).map(StorageDirectory::new)).await
    }

    pub async fn delete_async(self) -> StorageResult<()> {
        self.stop_watching();
        let path = self.path.clone();
        run_blocking(move || ops::delete_dir(&path)).await
    }

    /// Start the polled watcher. Watching twice is an `InvalidState` error.
    pub fn start_watching(&self, config: WatchConfig) -> StorageResult<()> {
        if !self.exists() {
            return Err(StorageError::not_found(&self.path));
        }
        let mut slot = self.watcher.lock().unwrap();
        if slot.is_some() {
            return Err(StorageError::InvalidState(
                "directory is already being watched".into(),
            ));
        }
        *slot = Some(DirectoryWatcher::start(self.path.clone(), config));
        Ok(())
    }

    /// Stop and drop the watcher; all subscribers are detached.
    pub fn stop_watching(&self) {
        if let Some(mut watcher) = self.watcher.lock().unwrap().take() {
            watcher.stop();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.lock().unwrap().is_some()
    }

    /// Subscribe to change events; requires an active watcher.
    pub fn subscribe(&self, sink: Arc<dyn ChangeSink>) -> StorageResult<SubscriptionId> {
        match self.watcher.lock().unwrap().as_ref() {
            Some(watcher) => Ok(watcher.subscribe(sink)),
            None => Err(StorageError::InvalidState(
                "directory is not being watched".into(),
            )),
        }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> StorageResult<()> {
        match self.watcher.lock().unwrap().as_ref() {
            Some(watcher) if watcher.unsubscribe(id) => Ok(()),
            Some(_) => Err(StorageError::NotFound("subscription".into())),
            None => Err(StorageError::InvalidState(
                "directory is not being watched".into(),
            )),
        }
    }
}

impl Drop for StorageDirectory {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

#[derive(Default)]
struct Aggregate {
    files: u64,
    dirs: u64,
    size: u64,
    denied: bool,
}

fn aggregate_tree(dir: &Path, aggregate: &mut Aggregate) {
    let reader = match std::fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(err) => {
            if err.kind() == std::io::ErrorKind::PermissionDenied {
                aggregate.denied = true;
            } else {
                warn!(path = %dir.display(), %err, "directory aggregation skipped a subtree");
            }
            return;
        }
    };
    for entry in reader.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            aggregate.dirs += 1;
            aggregate_tree(&entry.path(), aggregate);
            if aggregate.denied {
                return;
            }
        } else if file_type.is_file() {
            aggregate.files += 1;
            aggregate.size += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
}
