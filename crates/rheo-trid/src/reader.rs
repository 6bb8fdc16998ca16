// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RIFF-based TrID catalog parser
//!
//! The catalog is a little-endian RIFF container: chunks are
//! `{id: 4 bytes, length: u32, payload}`. The file opens with `"RIFF"` and
//! `"TRID"` chunks, followed by a 12-byte info block whose bytes 8..12 hold
//! the definition count, then a length-prefixed definitions block of
//! repeated `"DEF "` chunks. Unknown subchunk ids are skipped by their
//! declared length; every count and length is bound-checked against the
//! remaining payload.

use byteorder::{LittleEndian, ReadBytesExt};
use rheo_defs::{Definition, Pattern, Signature, StorageError, StorageResult};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};

const RIFF_ID: &[u8; 4] = b"RIFF";
const TRID_ID: &[u8; 4] = b"TRID";
const DEF_ID: &[u8; 4] = b"DEF ";
const DATA_ID: &[u8; 4] = b"DATA";
const INFO_ID: &[u8; 4] = b"INFO";
const PATT_ID: &[u8; 4] = b"PATT";
const STRN_ID: &[u8; 4] = b"STRN";

const INFO_TYPE: &[u8; 4] = b"TYPE";
const INFO_EXT: &[u8; 4] = b"EXT ";
const INFO_TAG: &[u8; 4] = b"TAG ";
const INFO_MIME: &[u8; 4] = b"MIME";
const INFO_NAME: &[u8; 4] = b"NAME";
const INFO_FNUM: &[u8; 4] = b"FNUM";
const INFO_RURL: &[u8; 4] = b"RURL";
const INFO_USER: &[u8; 4] = b"USER";
const INFO_MAIL: &[u8; 4] = b"MAIL";
const INFO_HOME: &[u8; 4] = b"HOME";
const INFO_REM: &[u8; 4] = b"REM ";

/// One parsed TrID catalog entry.
///
/// Besides the fields that flow into a runtime [`Definition`], the catalog
/// carries provenance records (author, reference URL, sample file count)
/// that the builder surfaces in its log artifacts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TridDefinition {
    pub file_type: String,
    pub extensions: Vec<String>,
    pub mime_type: String,
    pub remarks: String,
    pub tag: i32,
    pub file_count: i32,
    pub name: String,
    pub ref_url: String,
    pub author_user: String,
    pub author_mail: String,
    pub author_home: String,
    pub patterns: Vec<Pattern>,
    pub strings: Vec<Vec<u8>>,
}

impl TridDefinition {
    /// First byte of the position-0 pattern, if the definition has one
    /// among its lowest-position patterns.
    pub fn first_header_byte(&self) -> Option<u8> {
        self.patterns
            .iter()
            .min_by_key(|pattern| pattern.position)
            .filter(|pattern| pattern.position == 0)
            .and_then(|pattern| pattern.data.first().copied())
    }

    /// Convert into the runtime model. The priority level is the extension
    /// level; the builder filters and re-ranks on top of it.
    pub fn into_definition(self) -> Definition {
        let priority_level = self.extensions.len() as i32;
        Definition {
            file_type: self.file_type,
            extensions: self.extensions,
            mime_type: self.mime_type,
            remarks: self.remarks,
            signature: Signature::new(self.patterns, self.strings),
            priority_level,
        }
    }
}

/// Read a TrID catalog from a file on disk.
pub fn read_catalog_file(path: &Path) -> StorageResult<Vec<TridDefinition>> {
    let bytes = std::fs::read(path).map_err(|err| StorageError::from_io(err, path))?;
    read_catalog(&bytes)
}

/// Read a TrID catalog from raw bytes.
pub fn read_catalog(bytes: &[u8]) -> StorageResult<Vec<TridDefinition>> {
    let mut cursor = Cursor::new(bytes);

    let riff = read_chunk_header(&mut cursor)?;
    if &riff.id != RIFF_ID {
        return Err(StorageError::InvalidFormat(format!(
            "expected RIFF leader, found {:?}",
            fourcc(&riff.id)
        )));
    }
    let trid = read_chunk_header(&mut cursor)?;
    if &trid.id != TRID_ID {
        return Err(StorageError::InvalidFormat(format!(
            "expected TRID form, found {:?}",
            fourcc(&trid.id)
        )));
    }

    // 12-byte info block; bytes 8..12 carry the definition count.
    let info = read_slice(&mut cursor, 12)?;
    let declared = u32::from_le_bytes([info[8], info[9], info[10], info[11]]) as usize;

    let defs_len = read_u32(&mut cursor)? as usize;
    let defs_block = read_slice(&mut cursor, defs_len)?;

    let mut definitions = Vec::new();
    let mut defs_cursor = Cursor::new(defs_block);
    while remaining(&defs_cursor) >= 8 {
        let header = read_chunk_header(&mut defs_cursor)?;
        let payload = read_slice(&mut defs_cursor, header.length as usize)?;
        if &header.id == DEF_ID {
            definitions.push(read_definition(payload)?);
        } else {
            debug!(id = %fourcc(&header.id), "skipping unknown definitions chunk");
        }
    }

    if definitions.len() != declared {
        warn!(
            declared,
            parsed = definitions.len(),
            "catalog definition count mismatch"
        );
    }
    debug!(count = definitions.len(), "parsed TrID catalog");
    Ok(definitions)
}

struct ChunkHeader {
    id: [u8; 4],
    length: u32,
}

fn read_definition(payload: &[u8]) -> StorageResult<TridDefinition> {
    let mut definition = TridDefinition::default();
    let mut cursor = Cursor::new(payload);
    while remaining(&cursor) >= 8 {
        let header = read_chunk_header(&mut cursor)?;
        let body = read_slice(&mut cursor, header.length as usize)?;
        match &header.id {
            id if id == DATA_ID => read_data(body, &mut definition)?,
            id if id == INFO_ID => read_info(body, &mut definition)?,
            id => debug!(id = %fourcc(id), "skipping unknown definition subchunk"),
        }
    }
    Ok(definition)
}

fn read_data(payload: &[u8], definition: &mut TridDefinition) -> StorageResult<()> {
    let mut cursor = Cursor::new(payload);
    while remaining(&cursor) >= 8 {
        let header = read_chunk_header(&mut cursor)?;
        let body = read_slice(&mut cursor, header.length as usize)?;
        match &header.id {
            id if id == PATT_ID => definition.patterns = read_patterns(body)?,
            id if id == STRN_ID => definition.strings = read_strings(body)?,
            id => debug!(id = %fourcc(id), "skipping unknown data subchunk"),
        }
    }
    Ok(())
}

fn read_patterns(payload: &[u8]) -> StorageResult<Vec<Pattern>> {
    let mut cursor = Cursor::new(payload);
    let count = read_u16(&mut cursor)? as usize;
    let mut patterns = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let position = read_u16(&mut cursor)?;
        let length = read_u16(&mut cursor)? as usize;
        let data = read_slice(&mut cursor, length)?.to_vec();
        patterns.push(Pattern::new(position, data));
    }
    Ok(patterns)
}

fn read_strings(payload: &[u8]) -> StorageResult<Vec<Vec<u8>>> {
    let mut cursor = Cursor::new(payload);
    let count = read_u16(&mut cursor)? as usize;
    let mut strings = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let length = read_u32(&mut cursor)? as usize;
        strings.push(read_slice(&mut cursor, length)?.to_vec());
    }
    Ok(strings)
}

fn read_info(payload: &[u8], definition: &mut TridDefinition) -> StorageResult<()> {
    let mut cursor = Cursor::new(payload);
    // Typed records `{type: u32 fourcc, length: u16, bytes}` in any order.
    while remaining(&cursor) >= 6 {
        let mut id = [0u8; 4];
        read_exact(&mut cursor, &mut id)?;
        let length = read_u16(&mut cursor)? as usize;
        let body = read_slice(&mut cursor, length)?;
        match &id {
            t if t == INFO_TYPE => definition.file_type = read_text(body)?,
            t if t == INFO_EXT => {
                // The extension field is a `/`-separated, case-insensitive list.
                definition.extensions = read_text(body)?
                    .split('/')
                    .filter(|ext| !ext.is_empty())
                    .map(|ext| ext.to_lowercase())
                    .collect();
            }
            t if t == INFO_TAG => definition.tag = read_i32_record(body)?,
            t if t == INFO_MIME => definition.mime_type = read_text(body)?,
            t if t == INFO_NAME => definition.name = read_text(body)?,
            t if t == INFO_FNUM => definition.file_count = read_i32_record(body)?,
            t if t == INFO_RURL => definition.ref_url = read_text(body)?,
            t if t == INFO_USER => definition.author_user = read_text(body)?,
            t if t == INFO_MAIL => definition.author_mail = read_text(body)?,
            t if t == INFO_HOME => definition.author_home = read_text(body)?,
            t if t == INFO_REM => definition.remarks = read_text(body)?,
            t => debug!(id = %fourcc(t), "skipping unknown info record"),
        }
    }
    Ok(())
}

fn read_text(body: &[u8]) -> StorageResult<String> {
    String::from_utf8(body.to_vec())
        .map_err(|err| StorageError::InvalidFormat(format!("invalid utf-8 info record: {err}")))
}

fn read_i32_record(body: &[u8]) -> StorageResult<i32> {
    if body.len() != 4 {
        return Err(StorageError::InvalidFormat(format!(
            "integer info record of length {}",
            body.len()
        )));
    }
    Ok(i32::from_le_bytes([body[0], body[1], body[2], body[3]]))
}

fn read_chunk_header(cursor: &mut Cursor<&[u8]>) -> StorageResult<ChunkHeader> {
    let mut id = [0u8; 4];
    read_exact(cursor, &mut id)?;
    let length = read_u32(cursor)?;
    Ok(ChunkHeader { id, length })
}

fn remaining(cursor: &Cursor<&[u8]>) -> u64 {
    cursor.get_ref().len() as u64 - cursor.position()
}

fn read_slice<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> StorageResult<&'a [u8]> {
    if len as u64 > remaining(cursor) {
        return Err(StorageError::InvalidFormat(format!(
            "declared length {len} exceeds remaining payload {}",
            remaining(cursor)
        )));
    }
    let start = cursor.position() as usize;
    cursor.set_position((start + len) as u64);
    Ok(&cursor.get_ref()[start..start + len])
}

fn read_exact(cursor: &mut Cursor<&[u8]>, buf: &mut [u8]) -> StorageResult<()> {
    cursor
        .read_exact(buf)
        .map_err(|_| StorageError::InvalidFormat("truncated catalog data".into()))
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> StorageResult<u16> {
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| StorageError::InvalidFormat("truncated catalog data".into()))
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> StorageResult<u32> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| StorageError::InvalidFormat("truncated catalog data".into()))
}

fn fourcc(id: &[u8; 4]) -> String {
    id.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            }
        })
        .collect()
}
