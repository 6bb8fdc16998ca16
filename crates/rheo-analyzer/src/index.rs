// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! First-byte and extension lookup tables
//!
//! All tables are built eagerly from a loaded package and never mutated, so
//! they are safe to share across threads without locking. Two first-byte
//! variants exist: `headers_for` keys only by position-0 patterns, while
//! `patterns_for` enumerates every pattern of every definition. The
//! analyzer's candidate selection uses the all-patterns variant.

use rheo_defs::{DefinitionRef, Package, Pattern};
use std::collections::HashMap;

/// Index slot for entries that cannot be keyed by a first byte.
pub const CATCH_ALL: i16 = -1;

/// Pairs a definition with one of its patterns inside the all-patterns map.
///
/// `pattern` is `None` only for definitions without any pattern, which are
/// filed in the catch-all bucket.
#[derive(Clone, Debug)]
pub struct PatternDefinitionMap {
    pub pattern: Option<Pattern>,
    pub definition: DefinitionRef,
}

/// Immutable lookup tables over a definitions package.
#[derive(Debug, Default)]
pub struct PackageIndex {
    headers: HashMap<i16, Vec<DefinitionRef>>,
    all_patterns: HashMap<i16, Vec<PatternDefinitionMap>>,
    extensions: HashMap<String, Vec<DefinitionRef>>,
}

impl PackageIndex {
    pub fn build(package: &Package) -> Self {
        let mut index = Self::default();
        for definition in &package.definitions {
            index.file_header(definition);
            index.file_patterns(definition);
            index.file_extensions(definition);
        }
        index
    }

    /// Definitions keyed by the first byte of their lowest-position pattern
    /// when that pattern starts at position 0; catch-all otherwise.
    fn file_header(&mut self, definition: &DefinitionRef) {
        let bucket = definition
            .signature
            .patterns
            .iter()
            .min_by_key(|pattern| pattern.position)
            .filter(|pattern| pattern.position == 0)
            .and_then(|pattern| pattern.data.first())
            .map(|&byte| byte as i16)
            .unwrap_or(CATCH_ALL);
        self.headers.entry(bucket).or_default().push(definition.clone());
    }

    /// Every pattern of every definition; empty-data patterns (and
    /// patternless definitions) go to the catch-all bucket.
    fn file_patterns(&mut self, definition: &DefinitionRef) {
        if definition.signature.patterns.is_empty() {
            self.all_patterns.entry(CATCH_ALL).or_default().push(PatternDefinitionMap {
                pattern: None,
                definition: definition.clone(),
            });
            return;
        }
        for pattern in &definition.signature.patterns {
            let bucket = pattern
                .data
                .first()
                .map(|&byte| byte as i16)
                .unwrap_or(CATCH_ALL);
            self.all_patterns.entry(bucket).or_default().push(PatternDefinitionMap {
                pattern: Some(pattern.clone()),
                definition: definition.clone(),
            });
        }
    }

    /// Extension keys are lowercased and dot-stripped; order is preserved
    /// and duplicates are permitted.
    fn file_extensions(&mut self, definition: &DefinitionRef) {
        for extension in &definition.extensions {
            let key = extension.trim_start_matches('.').to_lowercase();
            self.extensions.entry(key).or_default().push(definition.clone());
        }
    }

    pub fn headers_for(&self, byte: i16) -> &[DefinitionRef] {
        self.headers.get(&byte).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn patterns_for(&self, byte: i16) -> &[PatternDefinitionMap] {
        self.all_patterns.get(&byte).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn catch_all(&self) -> &[PatternDefinitionMap] {
        self.patterns_for(CATCH_ALL)
    }

    pub fn definitions_for_extension(&self, extension: &str) -> &[DefinitionRef] {
        let key = extension.trim_start_matches('.').to_lowercase();
        self.extensions.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}
