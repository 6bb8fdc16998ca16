// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Header-window analyzer
//!
//! Reads a bounded window from the front of a file, selects candidate
//! definitions through the all-patterns first-byte table, validates and
//! scores them, and ranks the survivors into confidence stacks. Analysis
//! never errors on non-matching input; it produces an empty result or a
//! fallback-tagged one.

use crate::confidence::ConfidenceStack;
use crate::content::fallback_definition;
use crate::registry::LoadedPackage;
use rheo_defs::{DefinitionRef, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Analyzer tuning; the defaults are the production constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Bytes read from the front of the file for pattern matching.
    pub scan_window: usize,
    /// Per-byte weight of a pattern anchored at position 0.
    pub header_pattern_weight: i64,
    /// Per-byte weight of any other pattern.
    pub pattern_weight: i64,
    /// Per-byte weight of a matched body string.
    pub string_weight: i64,
    /// Body-scan cap; larger files are split-sampled half from each end.
    pub max_body_scan: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            scan_window: 8192,
            header_pattern_weight: 1000,
            pattern_weight: 100,
            string_weight: 500,
            max_body_scan: 10 * 1024 * 1024,
        }
    }
}

/// Byte inserted between the two halves of a split-sampled body.
const BODY_SPLIT_SEPARATOR: u8 = b'|';

/// Ranked identification outcome.
#[derive(Clone, Debug, Default)]
pub struct AnalysisResult {
    pub definitions: ConfidenceStack<DefinitionRef>,
    pub extensions: ConfidenceStack<String>,
    pub mime_types: ConfidenceStack<String>,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Derive the extension and MIME stacks by pushing every occurrence
    /// from the definitions stack, so shared values aggregate by frequency.
    fn from_definitions(definitions: ConfidenceStack<DefinitionRef>) -> Self {
        let mut extensions = ConfidenceStack::new();
        let mut mime_types = ConfidenceStack::new();
        for entry in definitions.entries() {
            for extension in &entry.subject.extensions {
                extensions.push(extension.clone());
            }
            mime_types.push(entry.subject.mime_type.clone());
        }
        Self {
            definitions,
            extensions,
            mime_types,
        }
    }
}

/// Content-based file analyzer over a loaded package.
pub struct FileAnalyzer {
    config: AnalyzerConfig,
    loaded: Arc<LoadedPackage>,
}

impl FileAnalyzer {
    pub fn new(loaded: Arc<LoadedPackage>) -> Self {
        Self::with_config(loaded, AnalyzerConfig::default())
    }

    pub fn with_config(loaded: Arc<LoadedPackage>, config: AnalyzerConfig) -> Self {
        Self { config, loaded }
    }

    /// Analyze a file on disk. A missing path or an empty file yields an
    /// empty result, not an error.
    pub fn analyze_path(&self, path: &Path, check_strings: bool) -> StorageResult<AnalysisResult> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => return Ok(AnalysisResult::empty()),
        };
        if metadata.len() == 0 || !metadata.is_file() {
            return Ok(AnalysisResult::empty());
        }
        let file = File::open(path).map_err(|err| StorageError::from_io(err, path))?;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        self.analyze_stream(file, metadata.len(), extension.as_deref(), check_strings)
    }

    /// Analyze an in-memory buffer.
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        extension: Option<&str>,
        check_strings: bool,
    ) -> StorageResult<AnalysisResult> {
        self.analyze_stream(
            std::io::Cursor::new(bytes),
            bytes.len() as u64,
            extension,
            check_strings,
        )
    }

    /// Analyze a seekable stream of known length.
    pub fn analyze_stream<R: Read + Seek>(
        &self,
        mut reader: R,
        len: u64,
        extension: Option<&str>,
        check_strings: bool,
    ) -> StorageResult<AnalysisResult> {
        if len == 0 {
            return Ok(AnalysisResult::empty());
        }

        let mut window = Vec::with_capacity(self.config.scan_window.min(len as usize));
        reader
            .by_ref()
            .take(self.config.scan_window as u64)
            .read_to_end(&mut window)?;
        if window.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        // Trailing zero bytes cause spurious pattern hits; match against the
        // trimmed window but keep the raw one for the fallback classifier.
        let trimmed_len = window
            .iter()
            .rposition(|&byte| byte != 0)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let trimmed = &window[..trimmed_len];

        let candidates = self.select_candidates(trimmed);
        debug!(candidates = candidates.len(), window = trimmed.len(), "analyzer candidates");

        let mut body: Option<Vec<u8>> = None;
        let mut stack: ConfidenceStack<DefinitionRef> = ConfidenceStack::new();
        for definition in candidates {
            let Some(mut score) = self.pattern_score(&definition, trimmed) else {
                continue;
            };
            if check_strings && !definition.signature.strings.is_empty() {
                if body.is_none() {
                    body = Some(self.sample_body(&mut reader, len)?);
                }
                score += self.string_score(&definition, body.as_deref().unwrap_or(&[]));
            }
            if score > 0 {
                stack.push_weighted(definition, score);
            }
        }

        if stack.is_empty() {
            stack.push_weighted(
                DefinitionRef::new(fallback_definition(&window, extension)),
                100,
            );
        }
        Ok(AnalysisResult::from_definitions(stack))
    }

    /// Union of the catch-all bucket and, for every window offset, the
    /// pattern entries keyed by that byte whose position equals the offset.
    /// Deduplicated to unique definitions in first-seen order.
    fn select_candidates(&self, window: &[u8]) -> Vec<DefinitionRef> {
        let index = &self.loaded.index;
        let mut seen: HashSet<DefinitionRef> = HashSet::new();
        let mut candidates = Vec::new();

        for entry in index.catch_all() {
            if seen.insert(entry.definition.clone()) {
                candidates.push(entry.definition.clone());
            }
        }
        for (offset, &byte) in window.iter().enumerate() {
            for entry in index.patterns_for(byte as i16) {
                let positioned = entry
                    .pattern
                    .as_ref()
                    .is_some_and(|pattern| pattern.position as usize == offset);
                if positioned && seen.insert(entry.definition.clone()) {
                    candidates.push(entry.definition.clone());
                }
            }
        }
        candidates
    }

    /// Sum of pattern weights, or `None` when any matchable pattern misses.
    /// Empty-data patterns contribute nothing either way.
    fn pattern_score(&self, definition: &DefinitionRef, window: &[u8]) -> Option<i64> {
        let mut score = 0i64;
        for pattern in &definition.signature.patterns {
            if !pattern.is_matchable() {
                continue;
            }
            if !pattern.matches(window) {
                return None;
            }
            let weight = if pattern.position == 0 {
                self.config.header_pattern_weight
            } else {
                self.config.pattern_weight
            };
            score += pattern.data.len() as i64 * weight;
        }
        Some(score)
    }

    fn string_score(&self, definition: &DefinitionRef, body: &[u8]) -> i64 {
        let mut score = 0i64;
        for string in &definition.signature.strings {
            if string.is_empty() {
                continue;
            }
            if memchr::memmem::find(body, string).is_some() {
                score += string.len() as i64 * self.config.string_weight;
            }
        }
        score
    }

    /// Body bytes for string scanning. Files beyond the cap are sampled as
    /// first half + separator + last half.
    fn sample_body<R: Read + Seek>(&self, reader: &mut R, len: u64) -> StorageResult<Vec<u8>> {
        reader.seek(SeekFrom::Start(0))?;
        if len <= self.config.max_body_scan {
            let mut body = Vec::with_capacity(len as usize);
            reader.take(len).read_to_end(&mut body)?;
            return Ok(body);
        }

        let half = self.config.max_body_scan / 2;
        let mut body = Vec::with_capacity(self.config.max_body_scan as usize + 1);
        reader.by_ref().take(half).read_to_end(&mut body)?;
        body.push(BODY_SPLIT_SEPARATOR);
        reader.seek(SeekFrom::Start(len - half))?;
        reader.take(half).read_to_end(&mut body)?;
        Ok(body)
    }
}
