//! Decoded namespace object values.

use core::fmt;

use crate::object::ObjectType;

/// A value decoded from a channel response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceValue {
    /// A 64-bit integer.
    Integer(u64),
    /// String contents, without any terminator.
    Str(Vec<u8>),
    /// A raw byte buffer.
    Buffer(Vec<u8>),
    /// An ordered sequence of nested values.
    Package(Vec<NamespaceValue>),
    /// A record whose type code the decoder does not interpret.
    Unknown {
        /// The raw type code from the record header.
        type_code: u32,
    },
}

impl NamespaceValue {
    /// Returns the object type this value corresponds to.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Integer(_) => ObjectType::Integer,
            Self::Str(_) => ObjectType::String,
            Self::Buffer(_) => ObjectType::Buffer,
            Self::Package(_) => ObjectType::Package,
            Self::Unknown { type_code } => ObjectType::from_code(*type_code),
        }
    }

    /// Returns the integer, if this is an [`Integer`](Self::Integer).
    #[must_use]
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer reinterpreted as signed.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().map(|v| v as i64)
    }

    /// Returns the text of a string-valued object.
    ///
    /// Strings are returned up to the first NUL. Buffers go through
    /// [`narrow_buffer_to_string`] first, since string-like fields such as
    /// `_STR` are stored as 16-bit character buffers.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        let bytes = match self {
            Self::Str(s) => s.clone(),
            Self::Buffer(b) => narrow_buffer_to_string(b),
            _ => return None,
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

/// Narrows a buffer of 16-bit characters to one byte per character.
///
/// The buffer is read as `len / 2` little-endian 16-bit elements and each
/// element contributes its low byte. A trailing odd byte is dropped.
#[must_use]
pub fn narrow_buffer_to_string(buf: &[u8]) -> Vec<u8> {
    buf.chunks_exact(2).map(|pair| pair[0]).collect()
}

impl fmt::Display for NamespaceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "0x{v:x}"),
            Self::Str(s) => write!(f, "\"{}\"", String::from_utf8_lossy(s)),
            Self::Buffer(b) => {
                write!(f, "Buffer({}) {{", b.len())?;
                for (i, byte) in b.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {byte:02x}")?;
                }
                f.write_str(" }")
            }
            Self::Package(elements) => {
                write!(f, "Package({}) {{", elements.len())?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {element}")?;
                }
                f.write_str(" }")
            }
            Self::Unknown { type_code } => {
                write!(f, "<{}>", ObjectType::from_code(*type_code))
            }
        }
    }
}
