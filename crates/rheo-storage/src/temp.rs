// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scoped temp directories with guaranteed cleanup

use crate::dir::StorageDirectory;
use crate::file::StorageFile;
use rheo_defs::{StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// A unique directory under the platform temp root.
///
/// Children created through the scope are tracked and removed in
/// reverse-registration order when the scope closes, followed by the root
/// itself. Closing twice is a no-op; creation after close is rejected.
pub struct TempScope {
    root: PathBuf,
    children: Mutex<Vec<PathBuf>>,
    closed: AtomicBool,
}

impl TempScope {
    pub fn new() -> StorageResult<Self> {
        let root = std::env::temp_dir().join(format!("Rheo_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&root).map_err(|err| StorageError::from_io(err, &root))?;
        debug!(root = %root.display(), "temp scope created");
        Ok(Self {
            root,
            children: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Create (and track) an empty file inside the scope.
    pub fn create_file(&self, name: &str) -> StorageResult<StorageFile> {
        let path = self.child_path(name)?;
        fs::File::create(&path).map_err(|err| StorageError::from_io(err, &path))?;
        self.children.lock().unwrap().push(path.clone());
        Ok(StorageFile::new(path))
    }

    /// Create (and track) a directory inside the scope.
    pub fn create_dir(&self, name: &str) -> StorageResult<StorageDirectory> {
        let path = self.child_path(name)?;
        fs::create_dir_all(&path).map_err(|err| StorageError::from_io(err, &path))?;
        self.children.lock().unwrap().push(path.clone());
        Ok(StorageDirectory::new(path))
    }

    fn child_path(&self, name: &str) -> StorageResult<PathBuf> {
        if self.is_closed() {
            return Err(StorageError::InvalidState("temp scope is closed".into()));
        }
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidArgument(format!(
                "invalid child name: {name:?}"
            )));
        }
        Ok(self.root.join(name))
    }

    /// Remove children in reverse-registration order best-effort, then
    /// delete the root recursively. Idempotent.
    pub fn close(&self) -> StorageResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let children = std::mem::take(&mut *self.children.lock().unwrap());
        for child in children.iter().rev() {
            let removed = if child.is_dir() {
                fs::remove_dir_all(child)
            } else {
                fs::remove_file(child)
            };
            if let Err(err) = removed {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %child.display(), %err, "temp child cleanup failed");
                }
            }
        }
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                debug!(root = %self.root.display(), "temp scope removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                warn!(root = %self.root.display(), %err, "temp scope cleanup failed");
                Err(StorageError::from_io(err, &self.root))
            }
        }
    }
}

impl Drop for TempScope {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
