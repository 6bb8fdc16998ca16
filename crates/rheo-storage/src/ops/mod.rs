// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! File and directory operations engine
//!
//! Every long operation polls its cancellation token at each suspension
//! point: before opening a stream, after each buffer fill, after each
//! flush, and between enumerated children. Cancelled or failed operations
//! roll back their partial artifacts best-effort before surfacing the
//! error, and progress sinks are never invoked after an operation errored.

mod buffer;
mod conflict;
mod copy;
mod delete;
mod move_ops;
mod rename;
mod write;

pub use buffer::{buffer_size_for, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use conflict::{next_available_dir_path, next_available_file_path};
pub use copy::{copy_dir, copy_file};
pub use delete::{delete_dir, delete_file};
pub use move_ops::{move_dir, move_file};
pub use rename::rename;
pub use write::{write_file, write_stream};

use crate::progress::ProgressSink;
use rheo_defs::{StorageError, StorageResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Options shared by the streamed operations.
#[derive(Clone, Default)]
pub struct OperationOptions {
    pub overwrite: bool,
    pub progress: Option<Arc<dyn ProgressSink>>,
    pub cancel: Option<CancellationToken>,
}

impl OperationOptions {
    pub fn overwriting() -> Self {
        Self {
            overwrite: true,
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl std::fmt::Debug for OperationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationOptions")
            .field("overwrite", &self.overwrite)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Cooperative cancellation poll used at every suspension point.
pub(crate) fn check_cancelled(cancel: &Option<CancellationToken>) -> StorageResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(StorageError::Cancelled),
        _ => Ok(()),
    }
}
