// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Single-path rename with conflict resolution

use super::conflict::{next_available_dir_path, next_available_file_path};
use rheo_defs::{StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Rename an entry in place. A colliding name resolves to the smallest
/// free `" (N)"` suffix. Returns the final path.
pub fn rename(target: &Path, new_name: &str) -> StorageResult<PathBuf> {
    if !target.exists() {
        return Err(StorageError::not_found(target));
    }
    if new_name.is_empty()
        || new_name == "."
        || new_name == ".."
        || new_name.contains(['/', '\\'])
    {
        return Err(StorageError::InvalidArgument(format!(
            "invalid entry name: {new_name:?}"
        )));
    }

    let parent = target.parent().ok_or_else(|| {
        StorageError::InvalidArgument(format!("path has no parent: {}", target.display()))
    })?;
    let desired = parent.join(new_name);
    if desired == target {
        return Ok(desired);
    }

    let final_dest = if desired.exists() {
        if target.is_dir() {
            next_available_dir_path(&desired)
        } else {
            next_available_file_path(&desired)
        }
    } else {
        desired
    };

    fs::rename(target, &final_dest).map_err(|err| StorageError::from_io(err, target))?;
    Ok(final_dest)
}
