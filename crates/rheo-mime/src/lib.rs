// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! MIME type cleaning and validation
//!
//! Normalizes raw MIME strings coming out of third-party catalogs and
//! resolves them against an allow-list of canonical types, exactly or by
//! weighted Levenshtein similarity over the type and subtype halves.

mod clean;
mod dataset;

pub use clean::clean_mime;
pub use dataset::MimeDataset;

/// Minimum weighted similarity for a fuzzy match to be accepted.
pub const ACCEPT_THRESHOLD: f64 = 0.70;

/// Weight of the type half in the fuzzy score.
pub const TYPE_WEIGHT: f64 = 0.3;

/// Weight of the subtype half in the fuzzy score.
pub const SUBTYPE_WEIGHT: f64 = 0.7;
