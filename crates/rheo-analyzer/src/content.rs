// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Text/binary fallback classification
//!
//! Used when no definition matched a non-empty header window. A BOM settles
//! the question immediately; otherwise the byte classes of the window are
//! counted and thresholded.

use rheo_defs::{Definition, Pattern, Signature};

/// Priority level stamped on fallback definitions.
pub const FALLBACK_PRIORITY: i32 = -1000;

// Longer BOMs first: UTF-32 LE starts with the UTF-16 LE mark.
const BOMS: &[&[u8]] = &[
    &[0xEF, 0xBB, 0xBF],
    &[0xFF, 0xFE, 0x00, 0x00],
    &[0x00, 0x00, 0xFE, 0xFF],
    &[0xFF, 0xFE],
    &[0xFE, 0xFF],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentClass {
    Text,
    Binary,
}

/// Classify a header window as text or binary.
pub fn classify(header: &[u8]) -> ContentClass {
    if BOMS.iter().any(|bom| header.starts_with(bom)) {
        return ContentClass::Text;
    }

    let mut nulls = 0usize;
    let mut control = 0usize;
    let mut printable = 0usize;
    let mut extended = 0usize;
    for &byte in header {
        match byte {
            0 => nulls += 1,
            b'\t' | b'\n' | b'\r' => printable += 1,
            0x01..=0x1F | 0x7F => control += 1,
            0x20..=0x7E => printable += 1,
            _ => extended += 1,
        }
    }
    let total = header.len().max(1);

    if nulls as f64 / total as f64 > 0.01 {
        return ContentClass::Binary;
    }
    if control > printable / 2 {
        return ContentClass::Binary;
    }
    if extended > 0 && is_valid_utf8_prefix(header) {
        return ContentClass::Text;
    }
    if (printable + extended) as f64 / total as f64 > 0.75 {
        return ContentClass::Text;
    }
    ContentClass::Binary
}

/// Valid UTF-8, allowing one multi-byte sequence cut off by the window edge.
fn is_valid_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none() && err.valid_up_to() + 4 > bytes.len(),
    }
}

/// Minimal definition produced when the catalog has no match.
pub fn fallback_definition(header: &[u8], extension: Option<&str>) -> Definition {
    let class = classify(header);
    let (file_type, mime_type, default_extension) = match class {
        ContentClass::Text => ("Plain Text", "text/plain", "txt"),
        ContentClass::Binary => ("Binary Data", "application/octet-stream", "bin"),
    };
    let extension = extension
        .filter(|ext| !ext.is_empty())
        .unwrap_or(default_extension)
        .to_lowercase();
    Definition {
        file_type: file_type.into(),
        extensions: vec![extension],
        mime_type: mime_type.into(),
        remarks: String::new(),
        signature: Signature::new(Vec::<Pattern>::new(), Vec::new()),
        priority_level: FALLBACK_PRIORITY,
    }
}
