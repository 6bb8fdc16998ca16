// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Streamed copy with progress, cancellation, and rollback

use super::buffer::buffer_size_for;
use super::conflict::{next_available_dir_path, next_available_file_path};
use super::{check_cancelled, OperationOptions};
use crate::progress::ProgressTracker;
use rheo_defs::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Copy a file. Returns the final destination path, which differs from
/// `dest` when a conflict suffix was applied or `dest` named a directory.
pub fn copy_file(src: &Path, dest: &Path, options: &OperationOptions) -> StorageResult<PathBuf> {
    let metadata = fs::metadata(src).map_err(|err| StorageError::from_io(err, src))?;
    if !metadata.is_file() {
        return Err(StorageError::InvalidArgument(format!(
            "copy source is not a file: {}",
            src.display()
        )));
    }

    let final_dest = resolve_file_dest(src, dest, options.overwrite)?;
    if final_dest == src {
        return Err(StorageError::InvalidArgument(format!(
            "source and destination are the same file: {}",
            src.display()
        )));
    }
    ensure_parent(&final_dest)?;

    let tracker = ProgressTracker::new(metadata.len(), options.progress.clone());
    match stream_copy(src, &final_dest, metadata.len(), options, &tracker) {
        Ok(()) => Ok(final_dest),
        Err(err) => {
            rollback_file(&final_dest);
            Err(err)
        }
    }
}

/// Copy a directory tree. The whole tree is enumerated first so aggregate
/// progress has a fixed total; file copies then run serialized in
/// enumeration order sharing one tracker. Cancellation or a fatal error
/// rolls the created artifacts back best-effort.
pub fn copy_dir(src: &Path, dest: &Path, options: &OperationOptions) -> StorageResult<PathBuf> {
    let metadata = fs::metadata(src).map_err(|err| StorageError::from_io(err, src))?;
    if !metadata.is_dir() {
        return Err(StorageError::InvalidArgument(format!(
            "copy source is not a directory: {}",
            src.display()
        )));
    }

    let final_dest = if dest.exists() && !options.overwrite {
        next_available_dir_path(dest)
    } else {
        dest.to_path_buf()
    };
    if final_dest == src {
        return Err(StorageError::InvalidArgument(format!(
            "source and destination are the same directory: {}",
            src.display()
        )));
    }

    let plan = enumerate_tree(src)?;
    debug!(
        files = plan.files.len(),
        dirs = plan.dirs.len(),
        total_bytes = plan.total_bytes,
        "directory copy planned"
    );
    let tracker = ProgressTracker::new(plan.total_bytes, options.progress.clone());

    let created_root = !final_dest.exists();
    let mut created: Vec<PathBuf> = Vec::new();
    let result = (|| -> StorageResult<()> {
        check_cancelled(&options.cancel)?;
        if created_root {
            fs::create_dir_all(&final_dest)
                .map_err(|err| StorageError::from_io(err, &final_dest))?;
        }
        for rel in &plan.dirs {
            check_cancelled(&options.cancel)?;
            let target = final_dest.join(rel);
            if !target.exists() {
                fs::create_dir_all(&target).map_err(|err| StorageError::from_io(err, &target))?;
                created.push(target);
            }
        }
        for (rel, len) in &plan.files {
            check_cancelled(&options.cancel)?;
            let target = final_dest.join(rel);
            // Registered before streaming so a partial file is unwound too.
            created.push(target.clone());
            stream_copy(&src.join(rel), &target, *len, options, &tracker)?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => Ok(final_dest),
        Err(err) => {
            rollback_tree(&final_dest, created_root, &created);
            Err(err)
        }
    }
}

struct CopyPlan {
    dirs: Vec<PathBuf>,
    files: Vec<(PathBuf, u64)>,
    total_bytes: u64,
}

fn enumerate_tree(root: &Path) -> StorageResult<CopyPlan> {
    let mut plan = CopyPlan {
        dirs: Vec::new(),
        files: Vec::new(),
        total_bytes: 0,
    };
    let mut pending = vec![PathBuf::new()];
    while let Some(rel) = pending.pop() {
        let dir = root.join(&rel);
        let entries = fs::read_dir(&dir).map_err(|err| StorageError::from_io(err, &dir))?;
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::from_io(err, &dir))?;
            let entry_rel = rel.join(entry.file_name());
            let file_type = entry
                .file_type()
                .map_err(|err| StorageError::from_io(err, &entry.path()))?;
            if file_type.is_dir() {
                plan.dirs.push(entry_rel.clone());
                pending.push(entry_rel);
            } else if file_type.is_file() {
                let len = entry
                    .metadata()
                    .map_err(|err| StorageError::from_io(err, &entry.path()))?
                    .len();
                plan.total_bytes += len;
                plan.files.push((entry_rel, len));
            }
            // Symlinks and special nodes are not mirrored.
        }
    }
    plan.dirs.sort();
    plan.files.sort();
    Ok(plan)
}

pub(super) fn resolve_file_dest(
    src: &Path,
    dest: &Path,
    overwrite: bool,
) -> StorageResult<PathBuf> {
    let target = if dest.is_dir() {
        let name = src.file_name().ok_or_else(|| {
            StorageError::InvalidArgument(format!("source has no file name: {}", src.display()))
        })?;
        dest.join(name)
    } else {
        dest.to_path_buf()
    };
    if target.exists() && !overwrite {
        Ok(next_available_file_path(&target))
    } else {
        Ok(target)
    }
}

pub(super) fn ensure_parent(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|err| StorageError::from_io(err, parent))?;
        }
    }
    Ok(())
}

/// The read/write loop shared by file and directory copies. The caller owns
/// rollback of the destination on error.
pub(super) fn stream_copy(
    src: &Path,
    dest: &Path,
    len: u64,
    options: &OperationOptions,
    tracker: &ProgressTracker,
) -> StorageResult<()> {
    check_cancelled(&options.cancel)?;
    let mut reader = File::open(src).map_err(|err| StorageError::from_io(err, src))?;

    check_cancelled(&options.cancel)?;
    let mut open_options = OpenOptions::new();
    open_options.write(true);
    if options.overwrite {
        open_options.create(true).truncate(true);
    } else {
        open_options.create_new(true);
    }
    let mut writer = open_options
        .open(dest)
        .map_err(|err| StorageError::from_io(err, dest))?;

    let mut buf = vec![0u8; buffer_size_for(len)];
    loop {
        let read = reader
            .read(&mut buf)
            .map_err(|err| StorageError::from_io(err, src))?;
        check_cancelled(&options.cancel)?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buf[..read])
            .map_err(|err| StorageError::from_io(err, dest))?;
        tracker.add(read as u64);
        check_cancelled(&options.cancel)?;
    }

    writer
        .flush()
        .map_err(|err| StorageError::from_io(err, dest))?;
    check_cancelled(&options.cancel)?;
    Ok(())
}

fn rollback_file(dest: &Path) {
    if let Err(err) = fs::remove_file(dest) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %dest.display(), %err, "rollback left a partial file behind");
        }
    }
}

fn rollback_tree(root: &Path, created_root: bool, created: &[PathBuf]) {
    let result = if created_root {
        fs::remove_dir_all(root)
    } else {
        // The destination existed beforehand; only unwind what this
        // operation created, newest first.
        let mut last = Ok(());
        for path in created.iter().rev() {
            let removed = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            if let Err(err) = removed {
                if err.kind() != std::io::ErrorKind::NotFound {
                    last = Err(err);
                }
            }
        }
        last
    };
    if let Err(err) = result {
        warn!(path = %root.display(), %err, "rollback left a partial tree behind");
    }
}
