// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Versioned definitions package

use crate::model::DefinitionRef;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

bitflags::bitflags! {
    /// Release-channel and provenance tags carried by a package.
    ///
    /// The empty set is the untagged state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PackageTags: u32 {
        const STABLE = 1;
        const BETA = 1 << 1;
        const DEPRECATED = 1 << 2;
        const EXPERIMENTAL = 1 << 3;
        const TRID = 1 << 4;
        const VALIDATED = 1 << 5;
    }
}

/// Versioned, dated collection of definitions.
///
/// Immutable once loaded; indices and analyzers share it behind an `Arc`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub tags: PackageTags,
    pub definitions: Vec<DefinitionRef>,
}

impl Package {
    pub fn new(version: impl Into<String>, tags: PackageTags) -> Self {
        Self {
            version: version.into(),
            // Millisecond precision; the binary encoding stores unix millis.
            created_at: Utc::now().trunc_subsecs(3),
            tags,
            definitions: Vec::new(),
        }
    }

    pub fn total_definitions(&self) -> usize {
        self.definitions.len()
    }

    /// Number of distinct MIME types across all definitions.
    pub fn total_mime_types(&self) -> usize {
        self.definitions
            .iter()
            .map(|def| def.mime_type.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

// Package equality is by value: definition handles compare by identity, but
// a decoded package must compare equal to the one that was encoded.
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.created_at == other.created_at
            && self.tags == other.tags
            && self.definitions.len() == other.definitions.len()
            && self
                .definitions
                .iter()
                .zip(other.definitions.iter())
                .all(|(a, b)| **a == **b)
    }
}

impl Eq for Package {}
