// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Unix metadata provider (Linux and macOS)

use super::{display_name, InfoProvider};
use crate::types::{PlatformSpecific, StorageAttributes, StorageInfoRecord};
use rheo_defs::{StorageError, StorageResult};
use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

pub(super) struct UnixInfoProvider;

impl InfoProvider for UnixInfoProvider {
    fn stat(&self, path: &Path) -> StorageResult<StorageInfoRecord> {
        // lstat semantics: symlinks are described, not followed.
        let metadata =
            fs::symlink_metadata(path).map_err(|err| StorageError::from_io(err, path))?;
        let file_type = metadata.file_type();

        let mut attributes = StorageAttributes::empty();
        if file_type.is_dir() {
            attributes |= StorageAttributes::DIRECTORY;
        }
        if file_type.is_file() {
            attributes |= StorageAttributes::REGULAR;
        }
        if file_type.is_symlink() {
            attributes |= StorageAttributes::SYMLINK;
        }
        if file_type.is_fifo() {
            attributes |= StorageAttributes::FIFO;
        }
        if file_type.is_socket() {
            attributes |= StorageAttributes::SOCKET;
        }
        if file_type.is_char_device() {
            attributes |= StorageAttributes::CHAR_DEVICE;
        }
        if file_type.is_block_device() {
            attributes |= StorageAttributes::BLOCK_DEVICE;
        }

        let mode = metadata.mode();
        let writable = libc::S_IWUSR as u32 | libc::S_IWGRP as u32 | libc::S_IWOTH as u32;
        if mode & writable == 0 {
            attributes |= StorageAttributes::READ_ONLY;
        }

        let name = display_name(path);
        if name.starts_with('.') {
            attributes |= StorageAttributes::HIDDEN;
        }

        let link_target = if file_type.is_symlink() {
            fs::read_link(path).ok()
        } else {
            None
        };

        Ok(StorageInfoRecord {
            display_name: name,
            attributes,
            size: metadata.len(),
            created: metadata.created().ok(),
            modified: metadata.modified().ok(),
            accessed: metadata.accessed().ok(),
            is_symlink: file_type.is_symlink(),
            link_target,
            platform: PlatformSpecific::Unix {
                uid: metadata.uid(),
                gid: metadata.gid(),
                mode,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::provider;
    use std::io::Write;

    #[test]
    fn stat_describes_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();

        let record = provider().stat(&path).unwrap();
        assert_eq!(record.display_name, "sample.txt");
        assert_eq!(record.size, 5);
        assert!(record.attributes.contains(StorageAttributes::REGULAR));
        assert!(!record.attributes.contains(StorageAttributes::DIRECTORY));
        assert!(!record.is_symlink);
        assert!(matches!(record.platform, PlatformSpecific::Unix { .. }));
    }

    #[test]
    fn stat_describes_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let record = provider().stat(dir.path()).unwrap();
        assert!(record.attributes.contains(StorageAttributes::DIRECTORY));
    }

    #[test]
    fn stat_describes_a_symlink_without_following_it() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        fs::write(&target, b"content").unwrap();
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let record = provider().stat(&link).unwrap();
        assert!(record.is_symlink);
        assert_eq!(record.link_target.as_deref(), Some(target.as_path()));
    }

    #[test]
    fn missing_paths_raise_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = provider().stat(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn dotfiles_are_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".hidden");
        fs::write(&path, b"x").unwrap();
        let record = provider().stat(&path).unwrap();
        assert!(record.attributes.contains(StorageAttributes::HIDDEN));
    }
}
