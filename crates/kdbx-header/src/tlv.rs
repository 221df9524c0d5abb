//! Type-length-value record streams
//!
//! Two record shapes share the same walk:
//! ```text
//! outer header:  [u8 id][u32 size][size bytes]                         id 0 terminates
//! variant dict:  [u16 version] then
//!                [u8 type][u32 klen][klen bytes utf-8][u32 vlen][vlen bytes]  type 0 terminates
//! ```
//! Neither is a streaming protocol: running out of bytes before the terminator
//! is `MalformedHeader`, never "need more data".

use std::collections::BTreeMap;

use kdbx_core::{KdbxError, KdbxResult};

use crate::codec::ByteReader;

/// Variant dictionary format version written by KeePass 2.35+.
pub const VARIANT_DICTIONARY_VERSION: u16 = 0x0100;
const VARIANT_DICTIONARY_CRITICAL_MASK: u16 = 0xFF00;

/// Value type tags of variant dictionary entries
pub mod value_type {
    pub const END: u8 = 0x00;
    pub const UINT32: u8 = 0x04;
    pub const UINT64: u8 = 0x05;
    pub const BOOL: u8 = 0x08;
    pub const INT32: u8 = 0x0C;
    pub const INT64: u8 = 0x0D;
    pub const STRING: u8 = 0x18;
    pub const BYTE_ARRAY: u8 = 0x42;
}

/// An undecoded outer header record. Borrows from the file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub id: u8,
    pub data: &'a [u8],
}

fn malformed(what: &str) -> impl FnOnce(KdbxError) -> KdbxError + '_ {
    move |err| match err {
        KdbxError::TruncatedInput { offset, needed, len } => KdbxError::MalformedHeader(format!(
            "{what}: need {needed} bytes at offset {offset}, buffer has {len}"
        )),
        other => other,
    }
}

/// Decode `[id][size][value]` records from `start` up to and including the
/// `id == 0` terminator.
///
/// Returns the offset just past the terminator's value and every
/// non-terminator record in file order.
pub fn decode_records(buf: &[u8], start: usize) -> KdbxResult<(usize, Vec<RawRecord<'_>>)> {
    let mut reader = ByteReader::at(buf, start);
    let mut records = Vec::new();

    loop {
        if reader.remaining() == 0 {
            return Err(KdbxError::MalformedHeader(
                "header ended without an end-of-header record".into(),
            ));
        }

        let id = reader.read_u8().map_err(malformed("record id"))?;
        let size = reader.read_u32().map_err(malformed("record size"))? as usize;
        let data = reader
            .read_slice(size)
            .map_err(malformed("record value"))?;

        if id == 0 {
            return Ok((reader.position(), records));
        }
        records.push(RawRecord { id, data });
    }
}

/// One value of a variant dictionary, tagged with its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantValue<'a> {
    pub kind: u8,
    pub data: &'a [u8],
}

impl<'a> VariantValue<'a> {
    /// The value as a little-endian u32, if it is exactly 4 bytes wide.
    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// The value as a little-endian u64, if it is exactly 8 bytes wide.
    pub fn as_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.data.try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            value_type::UINT32 => "u32",
            value_type::UINT64 => "u64",
            value_type::BOOL => "bool",
            value_type::INT32 => "i32",
            value_type::INT64 => "i64",
            value_type::STRING => "string",
            value_type::BYTE_ARRAY => "bytes",
            _ => "unknown",
        }
    }
}

/// Name-keyed mapping decoded from a variant dictionary blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDictionary<'a> {
    pub version: u16,
    entries: BTreeMap<String, VariantValue<'a>>,
}

impl<'a> VariantDictionary<'a> {
    pub fn get(&self, key: &str) -> Option<&VariantValue<'a>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantValue<'a>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Decode a variant dictionary (the `kdfParams` and `publicCustomData` blobs).
///
/// Later entries with a repeated key replace earlier ones.
pub fn decode_variant_dictionary(buf: &[u8]) -> KdbxResult<VariantDictionary<'_>> {
    let mut reader = ByteReader::new(buf);
    let version = reader
        .read_u16()
        .map_err(malformed("variant dictionary version"))?;

    if version & VARIANT_DICTIONARY_CRITICAL_MASK
        > VARIANT_DICTIONARY_VERSION & VARIANT_DICTIONARY_CRITICAL_MASK
    {
        return Err(KdbxError::MalformedHeader(format!(
            "unsupported variant dictionary version {version:#06x}"
        )));
    }

    let mut entries = BTreeMap::new();
    loop {
        if reader.remaining() == 0 {
            return Err(KdbxError::MalformedHeader(
                "variant dictionary ended without a terminator".into(),
            ));
        }

        let kind = reader.read_u8().map_err(malformed("entry type"))?;
        if kind == value_type::END {
            break;
        }

        let key_len = reader.read_u32().map_err(malformed("entry key length"))? as usize;
        let key = reader.read_slice(key_len).map_err(malformed("entry key"))?;
        let key = std::str::from_utf8(key).map_err(|e| {
            KdbxError::MalformedHeader(format!("variant dictionary key is not UTF-8: {e}"))
        })?;
        let value_len = reader
            .read_u32()
            .map_err(malformed("entry value length"))? as usize;
        let data = reader
            .read_slice(value_len)
            .map_err(malformed("entry value"))?;

        entries.insert(key.to_owned(), VariantValue { kind, data });
    }

    Ok(VariantDictionary { version, entries })
}
