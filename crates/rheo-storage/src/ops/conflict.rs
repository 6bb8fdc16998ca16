// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Conflict-safe naming
//!
//! When a destination exists and overwrite is off, a `" (N)"` suffix is
//! inserted, N starting at 1 and the smallest free value winning. For files
//! the suffix sits before the extension; for directories it is appended to
//! the name.

use std::path::{Path, PathBuf};

/// Smallest-suffix free path for a file destination.
pub fn next_available_file_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    for n in 1u64.. {
        let name = match &extension {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("file name space exhausted")
}

/// Smallest-suffix free path for a directory destination.
pub fn next_available_dir_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    for n in 1u64.. {
        let candidate = parent.join(format!("{name} ({n})"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("directory name space exhausted")
}
