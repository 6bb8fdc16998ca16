// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Deletion

use rheo_defs::{StorageError, StorageResult};
use std::fs;
use std::path::Path;

pub fn delete_file(path: &Path) -> StorageResult<()> {
    fs::remove_file(path).map_err(|err| StorageError::from_io(err, path))
}

pub fn delete_dir(path: &Path) -> StorageResult<()> {
    fs::remove_dir_all(path).map_err(|err| StorageError::from_io(err, path))
}
