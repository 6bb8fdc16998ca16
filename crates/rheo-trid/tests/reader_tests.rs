// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use rheo_defs::StorageError;
use rheo_trid::testing::{CatalogEntry, CatalogWriter};
use rheo_trid::{organize_by_first_byte, read_catalog, CATCH_ALL_BUCKET};

fn pdf_entry() -> CatalogEntry {
    CatalogEntry::new("Portable Document Format", "PDF", "application/pdf")
        .pattern(0, b"%PDF-")
        .string(b"startxref")
        .remarks("ISO 32000")
}

fn zip_entry() -> CatalogEntry {
    CatalogEntry::new("ZIP archive", "ZIP/JAR/DOCX", "application/zip")
        .pattern(0, &[0x50, 0x4B, 0x03, 0x04])
}

#[test]
fn parses_a_complete_catalog() {
    let bytes = CatalogWriter::new()
        .entry(pdf_entry())
        .entry(zip_entry())
        .build();

    let definitions = read_catalog(&bytes).unwrap();
    assert_eq!(definitions.len(), 2);

    let pdf = &definitions[0];
    assert_eq!(pdf.file_type, "Portable Document Format");
    assert_eq!(pdf.extensions, vec!["pdf"]);
    assert_eq!(pdf.mime_type, "application/pdf");
    assert_eq!(pdf.remarks, "ISO 32000");
    assert_eq!(pdf.patterns.len(), 1);
    assert_eq!(pdf.patterns[0].position, 0);
    assert_eq!(pdf.patterns[0].data, b"%PDF-");
    assert_eq!(pdf.strings, vec![b"startxref".to_vec()]);

    let zip = &definitions[1];
    assert_eq!(zip.extensions, vec!["zip", "jar", "docx"]);
    assert!(zip.strings.is_empty());
}

#[test]
fn extension_lists_are_lowercased_and_split() {
    let bytes = CatalogWriter::new()
        .entry(CatalogEntry::new("Mixed", "TXT/Log//CFG", "text/plain"))
        .build();

    let definitions = read_catalog(&bytes).unwrap();
    assert_eq!(definitions[0].extensions, vec!["txt", "log", "cfg"]);
}

#[test]
fn wrong_leading_id_is_invalid_format() {
    let mut bytes = CatalogWriter::new().entry(pdf_entry()).build();
    bytes[0] = b'X';
    assert!(matches!(
        read_catalog(&bytes),
        Err(StorageError::InvalidFormat(_))
    ));
}

#[test]
fn wrong_form_id_is_invalid_format() {
    let mut bytes = CatalogWriter::new().entry(pdf_entry()).build();
    // The form id follows the 8-byte RIFF chunk header.
    bytes[8] = b'W';
    assert!(matches!(
        read_catalog(&bytes),
        Err(StorageError::InvalidFormat(_))
    ));
}

#[test]
fn truncated_catalog_is_invalid_format() {
    let bytes = CatalogWriter::new().entry(pdf_entry()).build();
    assert!(matches!(
        read_catalog(&bytes[..bytes.len() - 5]),
        Err(StorageError::InvalidFormat(_))
    ));
}

#[test]
fn unknown_chunks_are_skipped() {
    let bytes = CatalogWriter::new()
        .entry(pdf_entry())
        .unknown_chunk(*b"XTRA", vec![1, 2, 3, 4, 5])
        .build();

    let definitions = read_catalog(&bytes).unwrap();
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].extensions, vec!["pdf"]);
}

#[test]
fn into_definition_carries_extension_level() {
    let bytes = CatalogWriter::new().entry(zip_entry()).build();
    let definition = read_catalog(&bytes).unwrap().remove(0).into_definition();
    assert_eq!(definition.priority_level, 3);
    assert_eq!(definition.signature.patterns.len(), 1);
}

#[test]
fn organizer_buckets_by_leading_byte() {
    let bytes = CatalogWriter::new()
        .entry(pdf_entry())
        .entry(zip_entry())
        .entry(CatalogEntry::new("Offset only", "off", "application/octet-stream").pattern(6, &[0xFF]))
        .build();

    let buckets = organize_by_first_byte(read_catalog(&bytes).unwrap());
    assert_eq!(buckets[&(b'%' as i16)].len(), 1);
    assert_eq!(buckets[&0x50].len(), 1);
    assert_eq!(buckets[&CATCH_ALL_BUCKET].len(), 1);
}
