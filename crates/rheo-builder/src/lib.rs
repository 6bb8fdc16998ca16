// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Offline definitions package builder
//!
//! Extract -> transform -> load pipeline over a TrID catalog: the catalog is
//! parsed, MIME types are cleansed against an allow-list, definitions are
//! filtered and ranked by extension level, and the result is emitted as a
//! binary package with an indented JSON twin plus per-bucket log artifacts.

mod load;
mod transform;

pub use load::{BuildReport, LogBucket};
pub use transform::{TransformOutcome, MAX_EXTENSION_LEVEL};

use rheo_defs::{Package, PackageTags, StorageResult};
use rheo_mime::MimeDataset;
use std::path::{Path, PathBuf};
use tracing::info;

/// Builder configuration.
#[derive(Clone, Debug)]
pub struct BuilderConfig {
    /// Version string stamped into the emitted package.
    pub package_version: String,
    /// Tags stamped into the emitted package.
    pub tags: PackageTags,
    /// Directory receiving the binary and JSON artifacts.
    pub output_dir: PathBuf,
    /// Directory receiving the per-bucket log files.
    pub log_dir: PathBuf,
    /// Shared filename stem of the emitted artifacts.
    pub stem: String,
}

impl BuilderConfig {
    pub fn new(package_version: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            package_version: package_version.into(),
            tags: PackageTags::TRID | PackageTags::VALIDATED,
            log_dir: output_dir.join("logs"),
            output_dir,
            stem: "rheo-definitions".into(),
        }
    }
}

/// Runs the ETL pipeline.
pub struct DefinitionsBuilder {
    config: BuilderConfig,
    dataset: MimeDataset,
}

impl DefinitionsBuilder {
    pub fn new(config: BuilderConfig, dataset: MimeDataset) -> Self {
        Self { config, dataset }
    }

    /// Build from a TrID catalog file on disk.
    pub fn build_from_path(&self, catalog: &Path) -> StorageResult<BuildReport> {
        let definitions = rheo_trid::read_catalog_file(catalog)?;
        self.run(definitions)
    }

    /// Build from raw TrID catalog bytes.
    pub fn build_from_bytes(&self, catalog: &[u8]) -> StorageResult<BuildReport> {
        let definitions = rheo_trid::read_catalog(catalog)?;
        self.run(definitions)
    }

    fn run(&self, definitions: Vec<rheo_trid::TridDefinition>) -> StorageResult<BuildReport> {
        let extracted = definitions.len();
        let outcome = transform::transform(definitions, &self.dataset);

        let mut package = Package::new(self.config.package_version.clone(), self.config.tags);
        package.definitions = outcome.valid.clone();

        let report = load::load(&self.config, &package, &outcome)?;
        info!(
            extracted,
            valid = report.valid,
            invalid_mime = report.invalid_mime,
            filtered = report.filtered,
            "definitions build complete"
        );
        Ok(report)
    }
}
