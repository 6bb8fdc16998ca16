// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Instrumented file and directory operations
//!
//! Streamed copy/move/rename/delete/write with progress reporting,
//! cooperative cancellation, conflict-safe naming, and best-effort rollback;
//! platform-adapted metadata providers; a polled change watcher with
//! debounced notifications; and scoped temp directories with guaranteed
//! cleanup.

pub mod dir;
pub mod file;
pub mod info;
pub mod ops;
pub mod progress;
pub mod temp;
pub mod types;
pub mod watch;

pub use dir::StorageDirectory;
pub use file::StorageFile;
pub use info::{provider, InfoProvider};
pub use ops::{OperationOptions, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use progress::{ProgressSink, StorageProgress};
pub use temp::TempScope;
pub use types::{
    DirectoryInformation, FileInformation, Platform, PlatformSpecific, StorageAttributes,
    StorageInfoRecord, StorageInformation,
};
pub use watch::{
    ChangeSink, ChangeType, DirectoryWatcher, EntrySnapshot, StorageChangedEventArgs,
    SubscriptionId, WatchConfig,
};

// The shared error taxonomy and cancellation token are part of this crate's
// public surface.
pub use rheo_defs::{StorageError, StorageResult};
pub use tokio_util::sync::CancellationToken;
