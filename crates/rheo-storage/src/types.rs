// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Storage information snapshots

use rheo_analyzer::{AnalysisResult, Confidence, FileAnalyzer};
use rheo_defs::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

bitflags::bitflags! {
    /// Entry attributes, mapped from mode bits on Unix and file attributes
    /// on Windows.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StorageAttributes: u32 {
        const READ_ONLY = 1;
        const HIDDEN = 1 << 1;
        const DIRECTORY = 1 << 2;
        const REGULAR = 1 << 3;
        const SYMLINK = 1 << 4;
        const FIFO = 1 << 5;
        const SOCKET = 1 << 6;
        const CHAR_DEVICE = 1 << 7;
        const BLOCK_DEVICE = 1 << 8;
    }
}

/// Runtime platform, used to route metadata and symlink queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// Platform-specific metadata block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlatformSpecific {
    Unix {
        uid: u32,
        gid: u32,
        mode: u32,
    },
    Windows {
        owner_sid: Option<String>,
        owner_display: Option<String>,
        type_name: Option<String>,
    },
}

/// Uniform metadata record produced by an info provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageInfoRecord {
    pub display_name: String,
    pub attributes: StorageAttributes,
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub is_symlink: bool,
    pub link_target: Option<PathBuf>,
    pub platform: PlatformSpecific,
}

/// File snapshot with a lazily computed identification report.
#[derive(Debug)]
pub struct FileInformation {
    path: PathBuf,
    pub record: StorageInfoRecord,
    pub extension: Option<String>,
    report: OnceLock<AnalysisResult>,
}

impl FileInformation {
    pub(crate) fn new(path: PathBuf, record: StorageInfoRecord) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        Self {
            path,
            record,
            extension,
            report: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content identification report, computed on first access against the
    /// process-wide definitions package.
    pub fn identification_report(&self) -> StorageResult<&AnalysisResult> {
        if let Some(report) = self.report.get() {
            return Ok(report);
        }
        let loaded = rheo_analyzer::installed().ok_or_else(|| {
            StorageError::InvalidState("no definitions package installed".into())
        })?;
        let result = FileAnalyzer::new(loaded).analyze_path(&self.path, false)?;
        Ok(self.report.get_or_init(|| result))
    }

    /// Best extension candidate from the identification report.
    pub fn actual_extension(&self) -> StorageResult<Option<Confidence<String>>> {
        Ok(self.identification_report()?.extensions.peek())
    }

    /// Best MIME candidate from the identification report.
    pub fn mime_type(&self) -> StorageResult<Option<Confidence<String>>> {
        Ok(self.identification_report()?.mime_types.peek())
    }
}

/// Directory snapshot with recursive aggregates.
///
/// Counts degrade to `-1` (and size to `0`) when the tree cannot be
/// enumerated for permission reasons. The aggregates are computed at
/// information access time, not at handle creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectoryInformation {
    pub record: StorageInfoRecord,
    pub file_count: i64,
    pub directory_count: i64,
    pub size: u64,
}

/// Snapshot variant for any storage path.
#[derive(Debug)]
pub enum StorageInformation {
    File(FileInformation),
    Directory(DirectoryInformation),
}

impl StorageInformation {
    /// Stat a path and produce the matching snapshot variant.
    pub fn for_path(path: &Path) -> StorageResult<Self> {
        let record = crate::info::provider().stat(path)?;
        if record.attributes.contains(StorageAttributes::DIRECTORY) {
            crate::dir::StorageDirectory::new(path)
                .information()
                .map(Self::Directory)
        } else {
            Ok(Self::File(FileInformation::new(path.to_path_buf(), record)))
        }
    }
}
