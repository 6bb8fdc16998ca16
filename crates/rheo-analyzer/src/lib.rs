// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Content-based file type identification
//!
//! Builds first-byte and extension lookup tables over a loaded definitions
//! package, scans file header windows against positional patterns, ranks
//! matches into confidence stacks, and falls back to a text/binary
//! classification when nothing matches.

pub mod analyzer;
pub mod confidence;
pub mod content;
pub mod index;
pub mod registry;

pub use analyzer::{AnalysisResult, AnalyzerConfig, FileAnalyzer};
pub use confidence::{Confidence, ConfidenceStack};
pub use content::{classify, fallback_definition, ContentClass, FALLBACK_PRIORITY};
pub use index::{PackageIndex, PatternDefinitionMap, CATCH_ALL};
pub use registry::{install_package, install_package_file, installed, LoadedPackage};
