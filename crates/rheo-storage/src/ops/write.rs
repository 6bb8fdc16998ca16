// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Exclusive streamed writes

use super::buffer::buffer_size_for;
use super::copy::ensure_parent;
use super::{check_cancelled, OperationOptions};
use crate::progress::ProgressTracker;
use rheo_defs::{StorageError, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::warn;

/// Write bytes into a file through an exclusive write handle, streaming in
/// buffer-sized chunks with progress at each chunk boundary.
pub fn write_file(path: &Path, bytes: &[u8], options: &OperationOptions) -> StorageResult<()> {
    let total = bytes.len() as u64;
    let tracker = ProgressTracker::new(total, options.progress.clone());
    let existed = path.exists();

    let result = (|| -> StorageResult<()> {
        check_cancelled(&options.cancel)?;
        ensure_parent(path)?;
        let mut writer = open_exclusive(path)?;
        let chunk = buffer_size_for(total);
        for piece in bytes.chunks(chunk) {
            check_cancelled(&options.cancel)?;
            writer
                .write_all(piece)
                .map_err(|err| StorageError::from_io(err, path))?;
            tracker.add(piece.len() as u64);
            check_cancelled(&options.cancel)?;
        }
        writer
            .flush()
            .map_err(|err| StorageError::from_io(err, path))?;
        Ok(())
    })();

    finish_write(path, existed, result)
}

/// Write from a reader; the total is unknown so progress reports carry a
/// zero total.
pub fn write_stream<R: Read>(
    path: &Path,
    mut reader: R,
    options: &OperationOptions,
) -> StorageResult<()> {
    let tracker = ProgressTracker::new(0, options.progress.clone());
    let existed = path.exists();

    let result = (|| -> StorageResult<()> {
        check_cancelled(&options.cancel)?;
        ensure_parent(path)?;
        let mut writer = open_exclusive(path)?;
        let mut buf = vec![0u8; buffer_size_for(0)];
        loop {
            let read = reader
                .read(&mut buf)
                .map_err(|err| StorageError::from_io(err, path))?;
            check_cancelled(&options.cancel)?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buf[..read])
                .map_err(|err| StorageError::from_io(err, path))?;
            tracker.add(read as u64);
            check_cancelled(&options.cancel)?;
        }
        writer
            .flush()
            .map_err(|err| StorageError::from_io(err, path))?;
        Ok(())
    })();

    finish_write(path, existed, result)
}

fn open_exclusive(path: &Path) -> StorageResult<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(0);
    }
    options.open(path).map_err(|err| StorageError::from_io(err, path))
}

fn finish_write(path: &Path, existed: bool, result: StorageResult<()>) -> StorageResult<()> {
    if let Err(err) = &result {
        // A file created by this write is rolled back; a pre-existing file
        // was already truncated and stays as an explicitly logged partial.
        if !existed {
            if let Err(remove_err) = fs::remove_file(path) {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), %remove_err, "write rollback failed");
                }
            }
        } else {
            warn!(path = %path.display(), %err, "write left a truncated file behind");
        }
    }
    result
}
