// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! File handle
//!
//! A handle is a path plus a lazily cached information snapshot. Handles
//! are single-owner: consuming operations (move, rename, delete) take the
//! handle by value and hand back a fresh one for the new location.

use crate::info::provider;
use crate::ops::{self, OperationOptions};
use crate::types::FileInformation;
use rheo_analyzer::{AnalysisResult, FileAnalyzer};
use rheo_defs::{StorageError, StorageResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug)]
pub struct StorageFile {
    path: PathBuf,
    info: OnceLock<FileInformation>,
}

impl StorageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            info: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Metadata snapshot, taken on first access and cached for the handle's
    /// lifetime. Use [`refresh`](Self::refresh) to drop the cache.
    pub fn information(&self) -> StorageResult<&FileInformation> {
        if let Some(info) = self.info.get() {
            return Ok(info);
        }
        let record = provider().stat(&self.path)?;
        let info = FileInformation::new(self.path.clone(), record);
        Ok(self.info.get_or_init(|| info))
    }

    pub fn refresh(&mut self) {
        self.info = OnceLock::new();
    }

    /// Identify the file content against the process-wide definitions
    /// package.
    pub fn analyze(&self, check_strings: bool) -> StorageResult<AnalysisResult> {
        let loaded = rheo_analyzer::installed().ok_or_else(|| {
            StorageError::InvalidState("no definitions package installed".into())
        })?;
        FileAnalyzer::new(loaded).analyze_path(&self.path, check_strings)
    }

    pub fn copy_to(&self, dest: &Path, options: &OperationOptions) -> StorageResult<StorageFile> {
        ops::copy_file(&self.path, dest, options).map(StorageFile::new)
    }

    pub fn move_to(self, dest: &Path, options: &OperationOptions) -> StorageResult<StorageFile> {
        ops::move_file(&self.path, dest, options).map(StorageFile::new)
    }

    pub fn rename(self, new_name: &str) -> StorageResult<StorageFile> {
        ops::rename(&self.path, new_name).map(StorageFile::new)
    }

    pub fn delete(self) -> StorageResult<()> {
        ops::delete_file(&self.path)
    }

    pub fn write(&self, bytes: &[u8], options: &OperationOptions) -> StorageResult<()> {
        ops::write_file(&self.path, bytes, options)
    }

    pub fn write_stream<R: Read>(&self, reader: R, options: &OperationOptions) -> StorageResult<()> {
        ops::write_stream(&self.path, reader, options)
    }

    /// Identify the file content off the calling thread.
    pub async fn analyze_async(&self, check_strings: bool) -> StorageResult<AnalysisResult> {
        let path = self.path.clone();
        run_blocking(move || {
            let loaded = rheo_analyzer::installed().ok_or_else(|| {
                StorageError::InvalidState("no definitions package installed".into())
            })?;
            FileAnalyzer::new(loaded).analyze_path(&path, check_strings)
        })
        .await
    }

    pub async fn copy_to_async(
        &self,
        dest: &Path,
        options: &OperationOptions,
    ) -> StorageResult<StorageFile> {
        let src = self.path.clone();
        let dest = dest.to_path_buf();
        let options = options.clone();
        run_blocking(move || ops::copy_file(&src, &dest, &options).map(StorageFile::new)).await
    }

    pub async fn move_to_async(
        self,
        dest: &Path,
        options: &OperationOptions,
    ) -> StorageResult<StorageFile> {
        let src = self.path;
        let dest = dest.to_path_buf();
        let options = options.clone();
        run_blocking(move || ops::move_file(&src, &dest, &options).map(StorageFile::new)).await
    }

    pub async fn delete_async(self) -> StorageResult<()> {
        let path = self.path;
        run_blocking(move || ops::delete_file(&path)).await
    }

    pub async fn write_async(&self, bytes: Vec<u8>, options: &OperationOptions) -> StorageResult<()> {
        let path = self.path.clone();
        let options = options.clone();
        run_blocking(move || ops::write_file(&path, &bytes, &options)).await
    }
}

/// Run a blocking operation on the runtime's blocking pool.
pub(crate) async fn run_blocking<T, F>(op: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StorageResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|err| StorageError::InvalidState(format!("blocking task failed: {err}")))?
}
