// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Windows metadata provider

use super::{display_name, InfoProvider};
use crate::types::{PlatformSpecific, StorageAttributes, StorageInfoRecord};
use rheo_defs::{StorageError, StorageResult};
use std::fs;
use std::os::windows::fs::MetadataExt;
use std::path::Path;

const FILE_ATTRIBUTE_READONLY: u32 = 0x0001;
const FILE_ATTRIBUTE_HIDDEN: u32 = 0x0002;
const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x0010;

pub(super) struct WindowsInfoProvider;

impl InfoProvider for WindowsInfoProvider {
    fn stat(&self, path: &Path) -> StorageResult<StorageInfoRecord> {
        let metadata =
            fs::symlink_metadata(path).map_err(|err| StorageError::from_io(err, path))?;
        let file_type = metadata.file_type();
        let raw = metadata.file_attributes();

        let mut attributes = StorageAttributes::empty();
        if raw & FILE_ATTRIBUTE_READONLY != 0 {
            attributes |= StorageAttributes::READ_ONLY;
        }
        if raw & FILE_ATTRIBUTE_HIDDEN != 0 {
            attributes |= StorageAttributes::HIDDEN;
        }
        if raw & FILE_ATTRIBUTE_DIRECTORY != 0 {
            attributes |= StorageAttributes::DIRECTORY;
        } else {
            attributes |= StorageAttributes::REGULAR;
        }
        if file_type.is_symlink() {
            attributes |= StorageAttributes::SYMLINK;
        }

        let link_target = if file_type.is_symlink() {
            fs::read_link(path).ok()
        } else {
            None
        };

        Ok(StorageInfoRecord {
            display_name: display_name(path),
            attributes,
            size: metadata.len(),
            created: metadata.created().ok(),
            modified: metadata.modified().ok(),
            accessed: metadata.accessed().ok(),
            is_symlink: file_type.is_symlink(),
            link_target,
            // Owner SID and display/type names require a security API
            // round-trip; they are optional and left unset here.
            platform: PlatformSpecific::Windows {
                owner_sid: None,
                owner_display: None,
                type_name: None,
            },
        })
    }
}
