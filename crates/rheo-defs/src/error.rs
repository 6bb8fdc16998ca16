// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types shared across the Rheo Storage crates

use std::io;
use std::path::Path;

/// Library-wide storage error taxonomy
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("operation cancelled")]
    Cancelled,
    #[error("unsupported on this platform")]
    Unsupported,
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Map a low-level io error into the taxonomy at an adapter boundary.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.display().to_string()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.display().to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.display().to_string()),
            _ => Self::Io(err),
        }
    }

    pub fn not_found(path: &Path) -> Self {
        Self::NotFound(path.display().to_string())
    }

    pub fn already_exists(path: &Path) -> Self {
        Self::AlreadyExists(path.display().to_string())
    }

    /// True for errors that indicate the operation was aborted by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
