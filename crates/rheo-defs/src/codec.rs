// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Binary and JSON package encodings
//!
//! The binary layout is little-endian throughout. Field ordering is stable:
//! `Definition` fields are written in index order 0-5 (file type,
//! extensions, mime type, remarks, signature, priority level), `Signature`
//! fields 0-1 (patterns, strings), `Pattern` fields 0-1 (position, data).
//! Counts are u16/u32, byte arrays and strings are length-prefixed, and the
//! package version string is ASCII and compared textually.

use crate::error::{StorageError, StorageResult};
use crate::model::{Definition, DefinitionRef, Pattern, Signature};
use crate::package::{Package, PackageTags};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::DateTime;
use std::io::{Cursor, Read, Write};

/// Leading magic of the binary package format.
pub const MAGIC: &[u8; 4] = b"RPKG";

/// Version byte of the binary layout itself, distinct from `Package.version`.
pub const FORMAT_VERSION: u8 = 1;

/// Conventional extension of the binary artifact.
pub const BINARY_EXTENSION: &str = "rpkg";

/// Encode a package into the binary `.rpkg` layout.
pub fn encode_package(package: &Package) -> StorageResult<Vec<u8>> {
    let mut out = Vec::new();
    out.write_all(MAGIC)?;
    out.write_u8(FORMAT_VERSION)?;
    if !package.version.is_ascii() {
        return Err(StorageError::InvalidArgument(format!(
            "package version is not ascii: {:?}",
            package.version
        )));
    }
    write_string(&mut out, &package.version)?;
    out.write_i64::<LittleEndian>(package.created_at.timestamp_millis())?;
    out.write_u32::<LittleEndian>(package.tags.bits())?;
    out.write_u32::<LittleEndian>(package.definitions.len() as u32)?;
    for definition in &package.definitions {
        write_definition(&mut out, definition)?;
    }
    Ok(out)
}

/// Decode a package from the binary `.rpkg` layout.
pub fn decode_package(bytes: &[u8]) -> StorageResult<Package> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    read_exact(&mut cursor, &mut magic)?;
    if &magic != MAGIC {
        return Err(StorageError::InvalidFormat(format!(
            "bad package magic: {:02x?}",
            magic
        )));
    }
    let format_version = read_u8(&mut cursor)?;
    if format_version != FORMAT_VERSION {
        return Err(StorageError::InvalidFormat(format!(
            "unsupported package format version {format_version}"
        )));
    }

    let version = read_string(&mut cursor)?;
    let millis = read_i64(&mut cursor)?;
    let created_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StorageError::InvalidFormat(format!("timestamp out of range: {millis}"))
    })?;
    let tags = PackageTags::from_bits_truncate(read_u32(&mut cursor)?);

    let count = read_u32(&mut cursor)? as usize;
    let mut definitions = Vec::new();
    for _ in 0..count {
        definitions.push(DefinitionRef::new(read_definition(&mut cursor)?));
    }

    Ok(Package {
        version,
        created_at,
        tags,
        definitions,
    })
}

/// Write the indented JSON twin of a package.
pub fn write_json<W: Write>(writer: W, package: &Package) -> StorageResult<()> {
    serde_json::to_writer_pretty(writer, package)
        .map_err(|err| StorageError::InvalidFormat(err.to_string()))
}

/// Read a package from its JSON twin.
pub fn read_json<R: Read>(reader: R) -> StorageResult<Package> {
    serde_json::from_reader(reader).map_err(|err| StorageError::InvalidFormat(err.to_string()))
}

fn write_definition(out: &mut Vec<u8>, definition: &Definition) -> StorageResult<()> {
    write_string(out, &definition.file_type)?;
    out.write_u16::<LittleEndian>(definition.extensions.len() as u16)?;
    for extension in &definition.extensions {
        write_string(out, extension)?;
    }
    write_string(out, &definition.mime_type)?;
    write_string(out, &definition.remarks)?;
    write_signature(out, &definition.signature)?;
    out.write_i32::<LittleEndian>(definition.priority_level)?;
    Ok(())
}

fn read_definition(cursor: &mut Cursor<&[u8]>) -> StorageResult<Definition> {
    let file_type = read_string(cursor)?;
    let extension_count = read_u16(cursor)? as usize;
    let mut extensions = Vec::with_capacity(extension_count.min(64));
    for _ in 0..extension_count {
        extensions.push(read_string(cursor)?);
    }
    let mime_type = read_string(cursor)?;
    let remarks = read_string(cursor)?;
    let signature = read_signature(cursor)?;
    let priority_level = read_i32(cursor)?;
    Ok(Definition {
        file_type,
        extensions,
        mime_type,
        remarks,
        signature,
        priority_level,
    })
}

fn write_signature(out: &mut Vec<u8>, signature: &Signature) -> StorageResult<()> {
    out.write_u16::<LittleEndian>(signature.patterns.len() as u16)?;
    for pattern in &signature.patterns {
        out.write_u16::<LittleEndian>(pattern.position)?;
        write_bytes(out, &pattern.data)?;
    }
    out.write_u16::<LittleEndian>(signature.strings.len() as u16)?;
    for string in &signature.strings {
        write_bytes(out, string)?;
    }
    Ok(())
}

fn read_signature(cursor: &mut Cursor<&[u8]>) -> StorageResult<Signature> {
    let pattern_count = read_u16(cursor)? as usize;
    let mut patterns = Vec::with_capacity(pattern_count.min(64));
    for _ in 0..pattern_count {
        let position = read_u16(cursor)?;
        let data = read_bytes(cursor)?;
        patterns.push(Pattern::new(position, data));
    }
    let string_count = read_u16(cursor)? as usize;
    let mut strings = Vec::with_capacity(string_count.min(64));
    for _ in 0..string_count {
        strings.push(read_bytes(cursor)?);
    }
    Ok(Signature::new(patterns, strings))
}

fn write_string(out: &mut Vec<u8>, value: &str) -> StorageResult<()> {
    write_bytes(out, value.as_bytes())
}

fn write_bytes(out: &mut Vec<u8>, value: &[u8]) -> StorageResult<()> {
    out.write_u32::<LittleEndian>(value.len() as u32)?;
    out.write_all(value)?;
    Ok(())
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> StorageResult<String> {
    let bytes = read_bytes(cursor)?;
    String::from_utf8(bytes)
        .map_err(|err| StorageError::InvalidFormat(format!("invalid utf-8 string: {err}")))
}

fn read_bytes(cursor: &mut Cursor<&[u8]>) -> StorageResult<Vec<u8>> {
    let len = read_u32(cursor)? as usize;
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if len as u64 > remaining {
        return Err(StorageError::InvalidFormat(format!(
            "declared length {len} exceeds remaining payload {remaining}"
        )));
    }
    let mut bytes = vec![0u8; len];
    read_exact(cursor, &mut bytes)?;
    Ok(bytes)
}

fn read_exact(cursor: &mut Cursor<&[u8]>, buf: &mut [u8]) -> StorageResult<()> {
    cursor
        .read_exact(buf)
        .map_err(|_| StorageError::InvalidFormat("truncated package data".into()))
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> StorageResult<u8> {
    cursor
        .read_u8()
        .map_err(|_| StorageError::InvalidFormat("truncated package data".into()))
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> StorageResult<u16> {
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| StorageError::InvalidFormat("truncated package data".into()))
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> StorageResult<u32> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| StorageError::InvalidFormat("truncated package data".into()))
}

fn read_i32(cursor: &mut Cursor<&[u8]>) -> StorageResult<i32> {
    cursor
        .read_i32::<LittleEndian>()
        .map_err(|_| StorageError::InvalidFormat("truncated package data".into()))
}

fn read_i64(cursor: &mut Cursor<&[u8]>) -> StorageResult<i64> {
    cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| StorageError::InvalidFormat("truncated package data".into()))
}
