// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Definition, signature, and pattern entities

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Positional byte template applied to a file header window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub position: u16,
    pub data: Vec<u8>,
}

impl Pattern {
    pub fn new(position: u16, data: Vec<u8>) -> Self {
        Self { position, data }
    }

    /// A pattern with empty data cannot participate in matching.
    pub fn is_matchable(&self) -> bool {
        !self.data.is_empty()
    }

    /// Exclusive end offset of the pattern within a header window.
    pub fn end(&self) -> usize {
        self.position as usize + self.data.len()
    }

    /// Whether the window bytes at the declared position equal the template.
    pub fn matches(&self, window: &[u8]) -> bool {
        let start = self.position as usize;
        self.is_matchable()
            && self.end() <= window.len()
            && window[start..self.end()] == self.data[..]
    }
}

/// Patterns plus body strings qualifying a definition.
///
/// Patterns are positional against the header window; strings are expected
/// anywhere within the bounded body scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub patterns: Vec<Pattern>,
    pub strings: Vec<Vec<u8>>,
}

impl Signature {
    pub fn new(patterns: Vec<Pattern>, strings: Vec<Vec<u8>>) -> Self {
        Self { patterns, strings }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.strings.is_empty()
    }
}

/// A labeled file-format descriptor with a signature.
///
/// Extensions are stored lowercased without a leading dot, in catalog order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub file_type: String,
    pub extensions: Vec<String>,
    pub mime_type: String,
    pub remarks: String,
    pub signature: Signature,
    pub priority_level: i32,
}

impl Definition {
    /// Number of extensions; the definition's extension level.
    pub fn extension_level(&self) -> usize {
        self.extensions.len()
    }
}

/// Identity-keyed handle to a definition inside a loaded package.
///
/// Two refs compare equal only when they point at the same allocation, so a
/// confidence stack keyed by `DefinitionRef` aggregates per package entry
/// even when two entries happen to carry identical field values.
#[derive(Clone, Debug)]
pub struct DefinitionRef(Arc<Definition>);

impl DefinitionRef {
    pub fn new(definition: Definition) -> Self {
        Self(Arc::new(definition))
    }
}

impl Deref for DefinitionRef {
    type Target = Definition;

    fn deref(&self) -> &Definition {
        &self.0
    }
}

impl From<Definition> for DefinitionRef {
    fn from(definition: Definition) -> Self {
        Self::new(definition)
    }
}

impl PartialEq for DefinitionRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DefinitionRef {}

impl Hash for DefinitionRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Serialize for DefinitionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DefinitionRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Definition::deserialize(deserializer).map(Self::new)
    }
}
