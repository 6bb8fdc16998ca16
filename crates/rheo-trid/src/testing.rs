// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Helpers for synthesizing TrID catalog bytes in tests

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// One catalog entry to be emitted by [`CatalogWriter`].
#[derive(Clone, Debug, Default)]
pub struct CatalogEntry {
    pub file_type: String,
    /// `/`-separated extension list, as stored in the catalog.
    pub extensions: String,
    pub mime_type: String,
    pub remarks: String,
    pub tag: i32,
    pub file_count: i32,
    pub patterns: Vec<(u16, Vec<u8>)>,
    pub strings: Vec<Vec<u8>>,
}

impl CatalogEntry {
    pub fn new(file_type: &str, extensions: &str, mime_type: &str) -> Self {
        Self {
            file_type: file_type.into(),
            extensions: extensions.into(),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    pub fn pattern(mut self, position: u16, data: &[u8]) -> Self {
        self.patterns.push((position, data.to_vec()));
        self
    }

    pub fn string(mut self, data: &[u8]) -> Self {
        self.strings.push(data.to_vec());
        self
    }

    pub fn remarks(mut self, remarks: &str) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// Builds RIFF/TRID catalog bytes for reader and builder tests.
#[derive(Default)]
pub struct CatalogWriter {
    entries: Vec<CatalogEntry>,
    /// Extra raw chunk injected into the definitions block, for testing
    /// unknown-chunk skipping.
    extra_chunk: Option<([u8; 4], Vec<u8>)>,
}

impl CatalogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: CatalogEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn unknown_chunk(mut self, id: [u8; 4], payload: Vec<u8>) -> Self {
        self.extra_chunk = Some((id, payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut defs_block = Vec::new();
        for entry in &self.entries {
            let payload = definition_payload(entry);
            write_chunk(&mut defs_block, b"DEF ", &payload);
        }
        if let Some((id, payload)) = &self.extra_chunk {
            write_chunk(&mut defs_block, id, payload);
        }

        let mut body = Vec::new();
        // 12-byte info block; bytes 8..12 carry the definition count.
        body.extend_from_slice(&[0u8; 8]);
        body.write_u32::<LittleEndian>(self.entries.len() as u32).unwrap();
        body.write_u32::<LittleEndian>(defs_block.len() as u32).unwrap();
        body.extend_from_slice(&defs_block);

        let mut trid = Vec::new();
        write_chunk(&mut trid, b"TRID", &body);

        let mut out = Vec::new();
        write_chunk(&mut out, b"RIFF", &trid);
        out
    }
}

fn definition_payload(entry: &CatalogEntry) -> Vec<u8> {
    let mut patt = Vec::new();
    patt.write_u16::<LittleEndian>(entry.patterns.len() as u16).unwrap();
    for (position, data) in &entry.patterns {
        patt.write_u16::<LittleEndian>(*position).unwrap();
        patt.write_u16::<LittleEndian>(data.len() as u16).unwrap();
        patt.write_all(data).unwrap();
    }

    let mut strn = Vec::new();
    strn.write_u16::<LittleEndian>(entry.strings.len() as u16).unwrap();
    for string in &entry.strings {
        strn.write_u32::<LittleEndian>(string.len() as u32).unwrap();
        strn.write_all(string).unwrap();
    }

    let mut data = Vec::new();
    write_chunk(&mut data, b"PATT", &patt);
    write_chunk(&mut data, b"STRN", &strn);

    let mut info = Vec::new();
    write_info_text(&mut info, b"TYPE", &entry.file_type);
    write_info_text(&mut info, b"EXT ", &entry.extensions);
    write_info_i32(&mut info, b"TAG ", entry.tag);
    write_info_text(&mut info, b"MIME", &entry.mime_type);
    write_info_i32(&mut info, b"FNUM", entry.file_count);
    if !entry.remarks.is_empty() {
        write_info_text(&mut info, b"REM ", &entry.remarks);
    }

    let mut payload = Vec::new();
    write_chunk(&mut payload, b"DATA", &data);
    write_chunk(&mut payload, b"INFO", &info);
    payload
}

fn write_chunk(out: &mut Vec<u8>, id: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(id);
    out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
}

fn write_info_text(out: &mut Vec<u8>, id: &[u8; 4], text: &str) {
    out.extend_from_slice(id);
    out.write_u16::<LittleEndian>(text.len() as u16).unwrap();
    out.extend_from_slice(text.as_bytes());
}

fn write_info_i32(out: &mut Vec<u8>, id: &[u8; 4], value: i32) {
    out.extend_from_slice(id);
    out.write_u16::<LittleEndian>(4).unwrap();
    out.extend_from_slice(&value.to_le_bytes());
}
