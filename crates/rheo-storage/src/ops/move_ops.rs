// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Move: in-place rename when possible, copy-then-delete otherwise

use super::conflict::next_available_dir_path;
use super::copy::{copy_dir, copy_file, ensure_parent, resolve_file_dest};
use super::{delete_dir, delete_file, OperationOptions};
use rheo_defs::{StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Move a file. Attempts an in-place rename first; when the rename fails
/// (typically across volumes) it falls back to copy-then-delete, and the
/// source is only deleted after the copy succeeded.
pub fn move_file(src: &Path, dest: &Path, options: &OperationOptions) -> StorageResult<PathBuf> {
    if !src.exists() {
        return Err(StorageError::not_found(src));
    }
    let final_dest = resolve_file_dest(src, dest, options.overwrite)?;
    if final_dest == src {
        return Ok(final_dest);
    }
    ensure_parent(&final_dest)?;
    if options.overwrite && final_dest.exists() {
        fs::remove_file(&final_dest).map_err(|err| StorageError::from_io(err, &final_dest))?;
    }

    match fs::rename(src, &final_dest) {
        Ok(()) => Ok(final_dest),
        Err(err) => {
            debug!(%err, "rename unavailable, copying across volumes");
            let copied = copy_file(src, &final_dest, options)?;
            delete_file(src)?;
            Ok(copied)
        }
    }
}

/// Move a directory with the same rename-then-copy strategy.
pub fn move_dir(src: &Path, dest: &Path, options: &OperationOptions) -> StorageResult<PathBuf> {
    if !src.exists() {
        return Err(StorageError::not_found(src));
    }
    let final_dest = if dest.exists() && !options.overwrite {
        next_available_dir_path(dest)
    } else {
        dest.to_path_buf()
    };
    if final_dest == src {
        return Ok(final_dest);
    }
    ensure_parent(&final_dest)?;

    match fs::rename(src, &final_dest) {
        Ok(()) => Ok(final_dest),
        Err(err) => {
            debug!(%err, "rename unavailable, copying across volumes");
            let copied = copy_dir(src, &final_dest, options)?;
            delete_dir(src)?;
            Ok(copied)
        }
    }
}
