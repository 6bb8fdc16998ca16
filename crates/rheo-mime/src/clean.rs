// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! MIME string cleaning pipeline

use rheo_defs::{StorageError, StorageResult};

// Misspelled prefixes observed in the wild, fixed before any other
// normalization so the allow-list match sees the corrected type half.
const MISSPELLED_PREFIXES: &[(&str, &str)] = &[
    ("applicaiton", "application"),
    ("aapplication", "application"),
];

const EDGE_PUNCTUATION: &[char] = &[';', ',', '.', '"'];

/// Normalize a raw MIME string: trim, fix known misspelled prefixes, strip
/// leading/trailing punctuation, lowercase.
///
/// Blank input is an `InvalidArgument` error; cleaning never rejects
/// otherwise, rejection is the matcher's job.
pub fn clean_mime(value: &str) -> StorageResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StorageError::InvalidArgument(
            "mime value is empty or blank".into(),
        ));
    }

    let mut cleaned = trimmed.to_string();
    for (misspelled, corrected) in MISSPELLED_PREFIXES {
        let lowered = cleaned.to_lowercase();
        if let Some(rest) = lowered.strip_prefix(misspelled) {
            cleaned = format!("{corrected}{rest}");
            break;
        }
    }

    let cleaned = cleaned
        .trim_matches(|c: char| EDGE_PUNCTUATION.contains(&c))
        .to_lowercase();
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_runs_in_pipeline_order() {
        assert_eq!(clean_mime("  Application/PDF. ").unwrap(), "application/pdf");
        assert_eq!(clean_mime("\"text/plain\"").unwrap(), "text/plain");
        assert_eq!(clean_mime(";application/json,").unwrap(), "application/json");
    }

    #[test]
    fn known_misspellings_are_fixed() {
        assert_eq!(clean_mime("applicaiton/pdf").unwrap(), "application/pdf");
        assert_eq!(clean_mime("aapplication/zip").unwrap(), "application/zip");
        assert_eq!(clean_mime("Applicaiton/PDF").unwrap(), "application/pdf");
    }

    #[test]
    fn blank_input_is_an_error() {
        assert!(matches!(
            clean_mime("   "),
            Err(StorageError::InvalidArgument(_))
        ));
        assert!(matches!(
            clean_mime(""),
            Err(StorageError::InvalidArgument(_))
        ));
    }
}
