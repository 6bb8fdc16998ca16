// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Definitions data model for Rheo Storage
//!
//! This crate holds the entities shared by the definitions builder and the
//! runtime analyzer: patterns, signatures, definitions, and the versioned
//! package that bundles them, together with the binary and JSON package
//! encodings and the library-wide error taxonomy.

pub mod codec;
pub mod error;
pub mod model;
pub mod package;

pub use error::{StorageError, StorageResult};
pub use model::{Definition, DefinitionRef, Pattern, Signature};
pub use package::{Package, PackageTags};
