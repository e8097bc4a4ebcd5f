//! Object record encoder.
//!
//! Produces blobs in the layout [`decode`](crate::decode) reads. Used to
//! serve responses from an in-memory namespace and to build the argument
//! list that precedes an evaluate request for a method taking parameters.

use crate::decode::{
    ARG_LIST_HEADER_SIZE, RECORD_SIZE, TYPE_BUFFER, TYPE_INTEGER, TYPE_PACKAGE, TYPE_STRING,
};
use crate::value::NamespaceValue;

fn put_u32(out: &mut [u8], at: usize, v: u32) {
    out[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(out: &mut [u8], at: usize, v: u64) {
    out[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

/// Appends `payload` and returns its offset from `anchor`.
fn append_payload(out: &mut Vec<u8>, anchor: usize, payload: &[u8]) -> u64 {
    let at = out.len();
    out.extend_from_slice(payload);
    (at - anchor) as u64
}

/// Fills in the record reserved at `base`. Payloads are appended to `out`.
#[allow(clippy::cast_possible_truncation)]
fn write_record(out: &mut Vec<u8>, base: usize, anchor: usize, value: &NamespaceValue) {
    match value {
        NamespaceValue::Integer(v) => {
            put_u32(out, base, TYPE_INTEGER);
            put_u64(out, base + 8, *v);
        }
        NamespaceValue::Str(bytes) | NamespaceValue::Buffer(bytes) => {
            let type_code = if matches!(value, NamespaceValue::Str(_)) {
                TYPE_STRING
            } else {
                TYPE_BUFFER
            };
            let offset = append_payload(out, anchor, bytes);
            put_u32(out, base, type_code);
            put_u32(out, base + 4, bytes.len() as u32);
            put_u64(out, base + 8, offset);
        }
        NamespaceValue::Package(elements) => {
            let array = out.len();
            out.resize(array + elements.len() * RECORD_SIZE, 0);
            put_u32(out, base, TYPE_PACKAGE);
            put_u32(out, base + 4, elements.len() as u32);
            put_u64(out, base + 8, (array - anchor) as u64);
            for (i, element) in elements.iter().enumerate() {
                write_record(out, array + i * RECORD_SIZE, base, element);
            }
        }
        NamespaceValue::Unknown { type_code } => {
            put_u32(out, base, *type_code);
        }
    }
}

/// Encodes a value as a self-contained blob.
#[must_use]
pub fn encode(value: &NamespaceValue) -> Vec<u8> {
    let mut out = vec![0u8; RECORD_SIZE];
    write_record(&mut out, 0, 0, value);
    out
}

/// Encodes a method argument list.
///
/// The blob holds a `{ count, pad, offset }` header followed by one record
/// per argument; every offset is relative to the start of the blob.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_args(args: &[NamespaceValue]) -> Vec<u8> {
    let mut out = vec![0u8; ARG_LIST_HEADER_SIZE + args.len() * RECORD_SIZE];
    put_u32(&mut out, 0, args.len() as u32);
    put_u64(&mut out, 8, ARG_LIST_HEADER_SIZE as u64);
    for (i, arg) in args.iter().enumerate() {
        write_record(&mut out, ARG_LIST_HEADER_SIZE + i * RECORD_SIZE, 0, arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, decode_args};

    #[test]
    fn integer_is_one_record() {
        let raw = encode(&NamespaceValue::Integer(0x1234));
        assert_eq!(raw.len(), RECORD_SIZE);
        assert_eq!(&raw[..4], &TYPE_INTEGER.to_le_bytes());
        assert_eq!(&raw[8..16], &0x1234u64.to_le_bytes());
    }

    #[test]
    fn string_payload_follows_record() {
        let raw = encode(&NamespaceValue::Str(b"PNP".to_vec()));
        assert_eq!(raw.len(), RECORD_SIZE + 3);
        assert_eq!(&raw[4..8], &3u32.to_le_bytes());
        assert_eq!(&raw[8..16], &(RECORD_SIZE as u64).to_le_bytes());
        assert_eq!(&raw[RECORD_SIZE..], b"PNP");
    }

    #[test]
    fn mixed_package_decodes_back() {
        let value = NamespaceValue::Package(vec![
            NamespaceValue::Integer(0x8000_0100),
            NamespaceValue::Buffer(vec![0x79, 0x00]),
            NamespaceValue::Package(vec![
                NamespaceValue::Str(b"LCD".to_vec()),
                NamespaceValue::Integer(0),
            ]),
            NamespaceValue::Unknown { type_code: 0x0E },
        ]);
        assert_eq!(decode(&encode(&value)), Ok(value));
    }

    #[test]
    fn single_integer_argument_layout() {
        // One integer argument, as passed to _DCK or _DSS.
        let raw = encode_args(&[NamespaceValue::Integer(1)]);
        assert_eq!(raw.len(), ARG_LIST_HEADER_SIZE + RECORD_SIZE);
        assert_eq!(&raw[..4], &1u32.to_le_bytes());
        assert_eq!(&raw[8..16], &16u64.to_le_bytes());
        assert_eq!(&raw[16..20], &TYPE_INTEGER.to_le_bytes());
        assert_eq!(decode_args(&raw), Ok(vec![NamespaceValue::Integer(1)]));
    }

    #[test]
    fn string_argument_anchors_at_blob_start() {
        let args = [NamespaceValue::Integer(2), NamespaceValue::Str(b"on".to_vec())];
        let raw = encode_args(&args);
        assert_eq!(decode_args(&raw), Ok(args.to_vec()));
    }
}
