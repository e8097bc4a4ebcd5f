//! Object record decoder.
//!
//! Every response to an evaluate or type request is a blob that starts with
//! a fixed-size record. Strings, buffers and packages keep their payload
//! elsewhere in the same blob and refer to it with an offset relative to
//! the record's anchor:
//!
//! ```text
//!   0      4        8                16       24
//!   +------+--------+----------------+--------+
//!   | type | length | value / offset |  pad   |
//!   +------+--------+----------------+--------+
//! ```
//!
//! The anchor of a top-level record is its own base (blob offset 0). The
//! records in a package's element array are anchored at the base of the
//! package record that contains them. All offsets are resolved against the
//! owned slice and bounds-checked; no pointer arithmetic leaves the blob.

use thiserror::Error;

use crate::object::ObjectType;
use crate::value::NamespaceValue;

/// Size of one object record in bytes.
pub const RECORD_SIZE: usize = 24;

/// Size of the header that precedes an encoded argument list.
pub const ARG_LIST_HEADER_SIZE: usize = 16;

/// Deepest package nesting the decoder will follow.
pub const MAX_PACKAGE_DEPTH: usize = 32;

pub(crate) const TYPE_INTEGER: u32 = 0x01;
pub(crate) const TYPE_STRING: u32 = 0x02;
pub(crate) const TYPE_BUFFER: u32 = 0x03;
pub(crate) const TYPE_PACKAGE: u32 = 0x04;

/// Errors produced while decoding a blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// An integer blob was not exactly one record long.
    #[error("integer record is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Required size.
        expected: usize,
        /// Size of the blob that was supplied.
        actual: usize,
    },
    /// A length, count or offset field points past the end of the blob.
    #[error("record refers to bytes up to {needed}, blob holds {available}")]
    Truncated {
        /// One past the last byte the record refers to (saturated).
        needed: usize,
        /// Length of the blob.
        available: usize,
    },
    /// The record's type code is not one the caller can interpret.
    #[error("unsupported object type code {type_code:#x}")]
    UnsupportedType {
        /// Raw type code.
        type_code: u32,
    },
    /// The record decoded to a different variant than the caller needs.
    #[error("expected {expected} object, found {found}")]
    UnexpectedType {
        /// The type the caller asked for.
        expected: ObjectType,
        /// The type that was decoded.
        found: ObjectType,
    },
    /// Packages nest deeper than [`MAX_PACKAGE_DEPTH`].
    #[error("package nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// The nesting limit.
        limit: usize,
    },
    /// The blob describes more records than it has room for, which only
    /// happens when element arrays overlap.
    #[error("blob decodes to more than {limit} records")]
    TooManyRecords {
        /// Most records a blob of this size can hold.
        limit: usize,
    },
}

/// Reads a little-endian `u32` at `offset` in `data`.
pub(crate) fn read_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Reads a little-endian `u64` at `offset` in `data`.
pub(crate) fn read_u64_at(data: &[u8], offset: usize) -> Option<u64> {
    let bytes: [u8; 8] = data.get(offset..offset.checked_add(8)?)?.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

/// Header fields shared by all record kinds.
struct RecordHeader {
    type_code: u32,
    length: u32,
    value: u64,
}

fn truncated(needed: usize, raw: &[u8]) -> DecodeError {
    DecodeError::Truncated {
        needed,
        available: raw.len(),
    }
}

fn read_header(raw: &[u8], base: usize) -> Result<RecordHeader, DecodeError> {
    let end = base.saturating_add(RECORD_SIZE);
    if end > raw.len() {
        return Err(truncated(end, raw));
    }
    // In bounds: checked above.
    let type_code = read_u32_at(raw, base).ok_or_else(|| truncated(end, raw))?;
    let length = read_u32_at(raw, base + 4).ok_or_else(|| truncated(end, raw))?;
    let value = read_u64_at(raw, base + 8).ok_or_else(|| truncated(end, raw))?;
    Ok(RecordHeader {
        type_code,
        length,
        value,
    })
}

/// Resolves `anchor + offset .. + len` to a range inside `raw`.
fn resolve(
    raw: &[u8],
    anchor: usize,
    offset: u64,
    len: usize,
) -> Result<core::ops::Range<usize>, DecodeError> {
    let start = usize::try_from(offset)
        .ok()
        .and_then(|off| anchor.checked_add(off))
        .ok_or_else(|| truncated(usize::MAX, raw))?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| truncated(usize::MAX, raw))?;
    if end > raw.len() {
        return Err(truncated(end, raw));
    }
    Ok(start..end)
}

/// Number of records left to decode from one blob.
///
/// A well-formed blob stores every record in its own slot, so it can never
/// hold more than `len / RECORD_SIZE` of them. Overlapping element arrays
/// would otherwise expand a small blob into an exponentially large value.
struct Budget {
    limit: usize,
    left: usize,
}

impl Budget {
    fn for_blob(raw: &[u8]) -> Self {
        let limit = raw.len() / RECORD_SIZE;
        Self { limit, left: limit }
    }

    fn take(&mut self) -> Result<(), DecodeError> {
        self.left = self
            .left
            .checked_sub(1)
            .ok_or(DecodeError::TooManyRecords { limit: self.limit })?;
        Ok(())
    }
}

fn decode_record(
    raw: &[u8],
    base: usize,
    anchor: usize,
    depth: usize,
    budget: &mut Budget,
) -> Result<NamespaceValue, DecodeError> {
    let header = read_header(raw, base)?;
    budget.take()?;

    match header.type_code {
        TYPE_INTEGER => Ok(NamespaceValue::Integer(header.value)),
        TYPE_STRING | TYPE_BUFFER => {
            let range = resolve(raw, anchor, header.value, header.length as usize)?;
            let bytes = raw[range].to_vec();
            if header.type_code == TYPE_STRING {
                Ok(NamespaceValue::Str(bytes))
            } else {
                Ok(NamespaceValue::Buffer(bytes))
            }
        }
        TYPE_PACKAGE => {
            if depth >= MAX_PACKAGE_DEPTH {
                return Err(DecodeError::NestingTooDeep {
                    limit: MAX_PACKAGE_DEPTH,
                });
            }
            let count = header.length as usize;
            let array_len = count
                .checked_mul(RECORD_SIZE)
                .ok_or_else(|| truncated(usize::MAX, raw))?;
            let array = resolve(raw, anchor, header.value, array_len)?;

            let mut elements = Vec::with_capacity(count);
            for i in 0..count {
                let element_base = array.start + i * RECORD_SIZE;
                elements.push(decode_record(raw, element_base, base, depth + 1, budget)?);
            }
            Ok(NamespaceValue::Package(elements))
        }
        type_code => Ok(NamespaceValue::Unknown { type_code }),
    }
}

/// Decodes a blob into a [`NamespaceValue`].
///
/// # Errors
///
/// Returns [`DecodeError::SizeMismatch`] if an integer blob is not exactly
/// [`RECORD_SIZE`] bytes, [`DecodeError::Truncated`] if any length, count
/// or offset field reaches past the end of `raw`, and
/// [`DecodeError::NestingTooDeep`] or [`DecodeError::TooManyRecords`] for
/// pathologically nested or overlapping packages. Unrecognised type codes
/// decode to [`NamespaceValue::Unknown`].
pub fn decode(raw: &[u8]) -> Result<NamespaceValue, DecodeError> {
    let type_code = read_u32_at(raw, 0).ok_or_else(|| truncated(RECORD_SIZE, raw))?;
    if type_code == TYPE_INTEGER && raw.len() != RECORD_SIZE {
        return Err(DecodeError::SizeMismatch {
            expected: RECORD_SIZE,
            actual: raw.len(),
        });
    }
    decode_record(raw, 0, 0, 0, &mut Budget::for_blob(raw))
}

/// Decodes a blob that must hold a single integer record.
///
/// # Errors
///
/// Propagates [`decode`] errors. Returns [`DecodeError::UnsupportedType`]
/// for unrecognised type codes and [`DecodeError::UnexpectedType`] for any
/// other non-integer value.
pub fn decode_integer(raw: &[u8]) -> Result<u64, DecodeError> {
    match decode(raw)? {
        NamespaceValue::Integer(v) => Ok(v),
        NamespaceValue::Unknown { type_code } => Err(DecodeError::UnsupportedType { type_code }),
        other => Err(DecodeError::UnexpectedType {
            expected: ObjectType::Integer,
            found: other.object_type(),
        }),
    }
}

/// Decodes a type-query response into an [`ObjectType`].
///
/// Codes that do not fit in 32 bits are reported as
/// [`ObjectType::Invalid`].
///
/// # Errors
///
/// Same as [`decode_integer`].
pub fn decode_type_code(raw: &[u8]) -> Result<ObjectType, DecodeError> {
    let code = decode_integer(raw)?;
    Ok(u32::try_from(code).map_or(ObjectType::Invalid, ObjectType::from_code))
}

/// Decodes an encoded method argument list.
///
/// The list starts with a `{ count: u32, pad: u32, offset: u64 }` header;
/// `count` records follow at `offset`, anchored at the start of the blob.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the header or any record lies
/// outside `raw`.
pub fn decode_args(raw: &[u8]) -> Result<Vec<NamespaceValue>, DecodeError> {
    let count = read_u32_at(raw, 0).ok_or_else(|| truncated(ARG_LIST_HEADER_SIZE, raw))? as usize;
    let offset = read_u64_at(raw, 8).ok_or_else(|| truncated(ARG_LIST_HEADER_SIZE, raw))?;
    let array_len = count
        .checked_mul(RECORD_SIZE)
        .ok_or_else(|| truncated(usize::MAX, raw))?;
    let array = resolve(raw, 0, offset, array_len)?;

    let mut budget = Budget::for_blob(raw);
    (0..count)
        .map(|i| decode_record(raw, array.start + i * RECORD_SIZE, 0, 1, &mut budget))
        .collect()
}
