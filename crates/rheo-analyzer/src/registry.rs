// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Process-wide definitions registry
//!
//! The loaded package and its indices are immutable and shared; the slot is
//! written once and later writers are rejected.

use crate::index::PackageIndex;
use rheo_defs::{Package, StorageError, StorageResult};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// A package together with its eagerly built lookup tables.
#[derive(Debug)]
pub struct LoadedPackage {
    pub package: Package,
    pub index: PackageIndex,
}

impl LoadedPackage {
    pub fn new(package: Package) -> Self {
        let index = PackageIndex::build(&package);
        Self { package, index }
    }
}

static REGISTRY: OnceLock<Arc<LoadedPackage>> = OnceLock::new();

/// Install the process-wide package. Fails with `InvalidState` if a package
/// is already installed.
pub fn install_package(package: Package) -> StorageResult<Arc<LoadedPackage>> {
    let loaded = Arc::new(LoadedPackage::new(package));
    match REGISTRY.set(loaded.clone()) {
        Ok(()) => {
            info!(
                version = loaded.package.version.as_str(),
                definitions = loaded.package.total_definitions(),
                "definitions package installed"
            );
            Ok(loaded)
        }
        Err(_) => Err(StorageError::InvalidState(
            "a definitions package is already installed".into(),
        )),
    }
}

/// Decode a binary package file and install it.
pub fn install_package_file(path: &Path) -> StorageResult<Arc<LoadedPackage>> {
    let bytes = std::fs::read(path).map_err(|err| StorageError::from_io(err, path))?;
    install_package(rheo_defs::codec::decode_package(&bytes)?)
}

/// The installed package, if any.
pub fn installed() -> Option<Arc<LoadedPackage>> {
    REGISTRY.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rheo_defs::PackageTags;

    // Registry state is process-global, so the install/reject pair lives in
    // one test.
    #[test]
    fn second_install_is_rejected() {
        let first = install_package(Package::new("1.0.0", PackageTags::TRID));
        assert!(first.is_ok());
        assert!(installed().is_some());

        let second = install_package(Package::new("2.0.0", PackageTags::TRID));
        assert!(matches!(second, Err(StorageError::InvalidState(_))));
        assert_eq!(installed().unwrap().package.version, "1.0.0");
    }
}
