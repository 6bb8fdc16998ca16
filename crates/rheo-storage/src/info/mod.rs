// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Platform-adapted metadata providers
//!
//! The capability is a single `stat` over a path; the platform routing
//! happens once at compile time. Missing paths raise `NotFound`; access
//! failures during recursive aggregation degrade instead of erroring.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use crate::types::StorageInfoRecord;
use rheo_defs::StorageResult;
use std::path::Path;

/// Metadata capability over the current platform.
pub trait InfoProvider: Send + Sync {
    fn stat(&self, path: &Path) -> StorageResult<StorageInfoRecord>;
}

/// The provider for the platform this binary was built for.
pub fn provider() -> &'static dyn InfoProvider {
    #[cfg(unix)]
    {
        static PROVIDER: unix::UnixInfoProvider = unix::UnixInfoProvider;
        &PROVIDER
    }
    #[cfg(windows)]
    {
        static PROVIDER: windows::WindowsInfoProvider = windows::WindowsInfoProvider;
        &PROVIDER
    }
    #[cfg(not(any(unix, windows)))]
    {
        struct UnsupportedInfoProvider;
        impl InfoProvider for UnsupportedInfoProvider {
            fn stat(&self, _path: &Path) -> StorageResult<StorageInfoRecord> {
                Err(rheo_defs::StorageError::Unsupported)
            }
        }
        static PROVIDER: UnsupportedInfoProvider = UnsupportedInfoProvider;
        &PROVIDER
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
