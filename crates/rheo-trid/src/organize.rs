// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Groups catalog entries by their leading header byte

use crate::reader::TridDefinition;
use std::collections::BTreeMap;

/// Bucket for definitions that cannot be keyed by a first byte.
pub const CATCH_ALL_BUCKET: i16 = -1;

/// Group definitions by the first byte of their position-0 pattern.
///
/// Definitions whose lowest-position pattern does not start at position 0,
/// or that have no non-empty pattern at all, land in [`CATCH_ALL_BUCKET`].
pub fn organize_by_first_byte(
    definitions: Vec<TridDefinition>,
) -> BTreeMap<i16, Vec<TridDefinition>> {
    let mut buckets: BTreeMap<i16, Vec<TridDefinition>> = BTreeMap::new();
    for definition in definitions {
        let bucket = definition
            .first_header_byte()
            .map(|byte| byte as i16)
            .unwrap_or(CATCH_ALL_BUCKET);
        buckets.entry(bucket).or_default().push(definition);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rheo_defs::Pattern;

    fn with_patterns(patterns: Vec<Pattern>) -> TridDefinition {
        TridDefinition {
            file_type: "Test".into(),
            patterns,
            ..TridDefinition::default()
        }
    }

    #[test]
    fn position_zero_patterns_key_by_first_byte() {
        let buckets = organize_by_first_byte(vec![
            with_patterns(vec![Pattern::new(0, vec![0x50, 0x4B])]),
            with_patterns(vec![Pattern::new(0, vec![0x25])]),
            with_patterns(vec![Pattern::new(4, vec![0x66])]),
            with_patterns(Vec::new()),
        ]);

        assert_eq!(buckets[&0x50].len(), 1);
        assert_eq!(buckets[&0x25].len(), 1);
        assert_eq!(buckets[&CATCH_ALL_BUCKET].len(), 2);
    }

    #[test]
    fn lowest_position_pattern_decides_the_bucket() {
        // A position-0 pattern exists, but another pattern sits lower in the
        // list; the lowest position wins and it is position 0 here.
        let definition = with_patterns(vec![
            Pattern::new(8, vec![0xAA]),
            Pattern::new(0, vec![0x42]),
        ]);
        let buckets = organize_by_first_byte(vec![definition]);
        assert_eq!(buckets[&0x42].len(), 1);
    }
}
