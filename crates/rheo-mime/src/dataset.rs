// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Allow-list dataset and matching strategy

use crate::clean::clean_mime;
use crate::{ACCEPT_THRESHOLD, SUBTYPE_WEIGHT, TYPE_WEIGHT};
use rheo_defs::{StorageError, StorageResult};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Allow-list of canonical MIME types.
///
/// Keeps the canonical casing for reporting while matching
/// case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct MimeDataset {
    canonical: Vec<String>,
    by_lower: HashMap<String, usize>,
}

impl MimeDataset {
    /// Build a dataset from an in-memory list of canonical types.
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Self::default();
        for mime in types {
            dataset.insert(mime.into());
        }
        dataset
    }

    /// Load the allow-list from a CSV dataset; the first column of each
    /// record is the canonical type. Rows whose first column carries no
    /// `/` (headers, stray notes) are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> StorageResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut dataset = Self::default();
        for record in csv_reader.records() {
            let record =
                record.map_err(|err| StorageError::InvalidFormat(err.to_string()))?;
            if let Some(field) = record.get(0) {
                let field = field.trim();
                if field.contains('/') {
                    dataset.insert(field.to_string());
                }
            }
        }
        debug!(types = dataset.len(), "loaded mime allow-list");
        Ok(dataset)
    }

    pub fn from_csv_path(path: &Path) -> StorageResult<Self> {
        let file = std::fs::File::open(path).map_err(|err| StorageError::from_io(err, path))?;
        Self::from_csv_reader(file)
    }

    fn insert(&mut self, mime: String) {
        let lower = mime.to_lowercase();
        if !self.by_lower.contains_key(&lower) {
            self.by_lower.insert(lower, self.canonical.len());
            self.canonical.push(mime);
        }
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(String::as_str)
    }

    /// Clean a raw value and resolve it against the allow-list.
    ///
    /// Returns the canonical form on a match, `Ok(None)` on rejection.
    /// Blank input is an `InvalidArgument` error.
    pub fn resolve(&self, value: &str) -> StorageResult<Option<String>> {
        let cleaned = clean_mime(value)?;
        if let Some(&idx) = self.by_lower.get(&cleaned) {
            return Ok(Some(self.canonical[idx].clone()));
        }
        Ok(self.fuzzy(&cleaned))
    }

    /// Weighted Levenshtein match over the type and subtype halves.
    fn fuzzy(&self, cleaned: &str) -> Option<String> {
        let (value_type, value_subtype) = split_mime(cleaned);

        let mut best: Option<(f64, usize)> = None;
        for (idx, candidate) in self.canonical.iter().enumerate() {
            if !candidate.contains('/') {
                continue;
            }
            let lowered = candidate.to_lowercase();
            let (candidate_type, candidate_subtype) = split_mime(&lowered);
            let score = TYPE_WEIGHT * strsim::normalized_levenshtein(value_type, candidate_type)
                + SUBTYPE_WEIGHT
                    * strsim::normalized_levenshtein(value_subtype, candidate_subtype);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, idx));
            }
        }

        match best {
            Some((score, idx)) if score > ACCEPT_THRESHOLD => {
                debug!(
                    input = cleaned,
                    matched = self.canonical[idx].as_str(),
                    score,
                    "fuzzy mime match"
                );
                Some(self.canonical[idx].clone())
            }
            _ => None,
        }
    }
}

fn split_mime(value: &str) -> (&str, &str) {
    match value.split_once('/') {
        Some((mime_type, subtype)) => (mime_type, subtype),
        None => (value, ""),
    }
}
