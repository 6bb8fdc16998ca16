// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Transform stage: MIME cleansing, extension-level filtering, ranking

use rheo_defs::DefinitionRef;
use rheo_mime::MimeDataset;
use rheo_trid::TridDefinition;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Definitions with more extensions than this are discarded as noise.
pub const MAX_EXTENSION_LEVEL: usize = 5;

/// Result of the transform stage.
#[derive(Clone, Debug, Default)]
pub struct TransformOutcome {
    /// Valid definitions, canonical MIME applied, sorted by priority level
    /// descending (stable).
    pub valid: Vec<DefinitionRef>,
    /// Groups whose MIME could not be validated, keyed by the original
    /// (uncleaned) value.
    pub invalid_groups: BTreeMap<String, Vec<TridDefinition>>,
    /// Definitions dropped by the extension-level filter.
    pub filtered: Vec<DefinitionRef>,
}

/// Group by raw MIME, cleanse each group, then filter and rank the valid
/// definitions by extension level.
pub fn transform(definitions: Vec<TridDefinition>, dataset: &MimeDataset) -> TransformOutcome {
    let mut groups: BTreeMap<String, Vec<TridDefinition>> = BTreeMap::new();
    for definition in definitions {
        groups
            .entry(definition.mime_type.clone())
            .or_default()
            .push(definition);
    }

    let mut outcome = TransformOutcome::default();
    let mut valid: Vec<DefinitionRef> = Vec::new();
    for (raw_mime, group) in groups {
        match dataset.resolve(&raw_mime) {
            Ok(Some(canonical)) => {
                for mut definition in group {
                    definition.mime_type = canonical.clone();
                    let definition = definition.into_definition();
                    let level = definition.extension_level();
                    if level == 0 || level > MAX_EXTENSION_LEVEL {
                        debug!(
                            file_type = definition.file_type.as_str(),
                            level, "definition dropped by extension-level filter"
                        );
                        outcome.filtered.push(DefinitionRef::new(definition));
                    } else {
                        valid.push(DefinitionRef::new(definition));
                    }
                }
            }
            // Rejected and blank values both retain their original key.
            Ok(None) | Err(_) => {
                outcome.invalid_groups.insert(raw_mime, group);
            }
        }
    }

    valid.sort_by_key(|definition| Reverse(definition.priority_level));
    outcome.valid = valid;
    outcome
}
