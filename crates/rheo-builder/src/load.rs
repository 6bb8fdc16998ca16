// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Load stage: artifact emission and log files

use crate::transform::TransformOutcome;
use crate::BuilderConfig;
use chrono::Utc;
use rheo_defs::{codec, Package, StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Log buckets emitted by a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogBucket {
    ValidDefinitions,
    InvalidMimeTypes,
    FilteredInvalidDefinitions,
}

impl LogBucket {
    fn stem(self) -> &'static str {
        match self {
            Self::ValidDefinitions => "ValidDefinitions",
            Self::InvalidMimeTypes => "InvalidMimeTypes",
            Self::FilteredInvalidDefinitions => "FilteredInvalidDefinitions",
        }
    }
}

/// Summary of an ETL run.
#[derive(Clone, Debug)]
pub struct BuildReport {
    pub valid: usize,
    pub invalid_mime: usize,
    pub filtered: usize,
    pub binary_path: PathBuf,
    pub json_path: PathBuf,
    pub log_paths: Vec<PathBuf>,
}

pub(crate) fn load(
    config: &BuilderConfig,
    package: &Package,
    outcome: &TransformOutcome,
) -> StorageResult<BuildReport> {
    fs::create_dir_all(&config.output_dir)
        .map_err(|err| StorageError::from_io(err, &config.output_dir))?;
    fs::create_dir_all(&config.log_dir)
        .map_err(|err| StorageError::from_io(err, &config.log_dir))?;

    let binary_path = config
        .output_dir
        .join(format!("{}.{}", config.stem, codec::BINARY_EXTENSION));
    let json_path = config.output_dir.join(format!("{}.json", config.stem));

    let bytes = codec::encode_package(package)?;
    fs::write(&binary_path, &bytes).map_err(|err| StorageError::from_io(err, &binary_path))?;
    debug!(path = %binary_path.display(), size = bytes.len(), "wrote binary package");

    let json_file =
        fs::File::create(&json_path).map_err(|err| StorageError::from_io(err, &json_path))?;
    codec::write_json(json_file, package)?;
    debug!(path = %json_path.display(), "wrote json package");

    let mut log_paths = Vec::new();
    log_paths.push(write_log(config, LogBucket::ValidDefinitions, |out| {
        for definition in &outcome.valid {
            writeln!(
                out,
                "{} | {} | {}",
                definition.file_type,
                definition.mime_type,
                definition.extensions.join("/")
            )?;
        }
        Ok(())
    })?);
    log_paths.push(write_log(config, LogBucket::InvalidMimeTypes, |out| {
        for (raw_mime, group) in &outcome.invalid_groups {
            writeln!(out, "{:?}: {} definition(s)", raw_mime, group.len())?;
            for definition in group {
                writeln!(out, "    {}", definition.file_type)?;
            }
        }
        Ok(())
    })?);
    log_paths.push(write_log(
        config,
        LogBucket::FilteredInvalidDefinitions,
        |out| {
            for definition in &outcome.filtered {
                let reason = if definition.extensions.is_empty() {
                    "no extensions"
                } else {
                    "too many extensions"
                };
                writeln!(out, "{} | {} | {}", definition.file_type, definition.mime_type, reason)?;
            }
            Ok(())
        },
    )?);

    Ok(BuildReport {
        valid: outcome.valid.len(),
        invalid_mime: outcome.invalid_groups.values().map(Vec::len).sum(),
        filtered: outcome.filtered.len(),
        binary_path,
        json_path,
        log_paths,
    })
}

fn write_log<F>(config: &BuilderConfig, bucket: LogBucket, fill: F) -> StorageResult<PathBuf>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let stamp = Utc::now().format("%Y-%m-%d");
    let base = config.log_dir.join(format!("{}_{stamp}.log", bucket.stem()));
    let path = next_available_log_path(&base);

    let mut file = fs::File::create(&path).map_err(|err| StorageError::from_io(err, &path))?;
    fill(&mut file).map_err(|err| StorageError::from_io(err, &path))?;
    file.flush().map_err(|err| StorageError::from_io(err, &path))?;
    Ok(path)
}

/// Append `" (N)"` before the `.log` extension until the name is free.
fn next_available_log_path(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    let mut n = 1u32;
    loop {
        let candidate = parent.join(format!("{stem} ({n}).log"));
        if !candidate.exists() {
            return candidate;
        }
        if n == u32::MAX {
            warn!(path = %base.display(), "log name space exhausted");
            return base.to_path_buf();
        }
        n += 1;
    }
}
