//! Compressed EISA/PnP hardware identifiers.
//!
//! `_HID` and `_CID` objects commonly evaluate to a 32-bit integer holding
//! a compressed EISA ID. The 3-letter manufacturer code and the 16-bit
//! product number are packed big-endian inside an otherwise little-endian
//! integer, so the value is byte-swapped before the fields are extracted.

use core::fmt;

/// Hex digit table used for the product number.
const HEX_DIGITS: [u8; 16] = *b"0123456789ABCDEF";

/// Decodes a raw 32-bit EISA ID into its 7-character form (e.g. `PNP0A03`).
///
/// Every input produces a deterministic output, even values that are not
/// meaningful hardware IDs. Out-of-range letter fields come out as `@` or
/// punctuation above `Z`.
#[must_use]
pub fn encode_eisa_id(id: u32) -> [u8; 7] {
    // After swapping:
    //   Bits 30-26: first letter - '@'
    //   Bits 25-21: second letter - '@'
    //   Bits 20-16: third letter - '@'
    //   Bits 15-0:  product ID as 4 hex digits
    let swapped = id.swap_bytes();
    let letter = |shift: u32| b'@' + ((swapped >> shift) & 0x1F) as u8;
    let nibble = |shift: u32| HEX_DIGITS[((swapped >> shift) & 0xF) as usize];

    [
        letter(26),
        letter(21),
        letter(16),
        nibble(12),
        nibble(8),
        nibble(4),
        nibble(0),
    ]
}

/// A compressed EISA/PnP device identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EisaId {
    /// The raw 32-bit value as returned by evaluating the object.
    pub raw: u32,
}

impl EisaId {
    /// Wraps a raw 32-bit EISA ID.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self { raw }
    }

    /// Returns the decoded 7-character ID.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; 7] {
        encode_eisa_id(self.raw)
    }

    /// Compresses a textual ID such as `"PNP0A03"` into its raw form.
    ///
    /// Returns `None` unless the input is exactly three uppercase letters
    /// followed by four hex digits.
    #[must_use]
    pub fn from_str_id(id: &str) -> Option<Self> {
        let bytes = id.as_bytes();
        if bytes.len() != 7 {
            return None;
        }

        let mut packed: u32 = 0;
        for (i, &c) in bytes[..3].iter().enumerate() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            packed |= u32::from(c - b'@') << (26 - 5 * i);
        }
        for (i, &c) in bytes[3..].iter().enumerate() {
            let digit = (c as char).to_digit(16)?;
            if c.is_ascii_lowercase() {
                return None;
            }
            packed |= digit << (12 - 4 * i);
        }

        Some(Self::new(packed.swap_bytes()))
    }
}

impl fmt::Display for EisaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The codec only ever emits ASCII.
        for &b in &self.as_bytes() {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pci_host_bridge() {
        // EisaId("PNP0A03") as stored in AML.
        assert_eq!(&encode_eisa_id(0x030A_D041), b"PNP0A03");
    }

    #[test]
    fn decodes_vendor_id() {
        assert_eq!(&encode_eisa_id(0x0C0C_D041), b"PNP0C0C");
        assert_eq!(EisaId::new(0x0DA4_06D2).to_string().len(), 7);
    }

    #[test]
    fn zero_maps_to_at_signs() {
        assert_eq!(&encode_eisa_id(0), b"@@@0000");
    }

    #[test]
    fn output_shape_holds_over_full_range() {
        // Stride through the full u32 range, hitting both ends.
        let mut id: u32 = 0;
        loop {
            let out = encode_eisa_id(id);
            assert_eq!(out.len(), 7);
            for &c in &out[..3] {
                assert!((b'@'..=b'_').contains(&c), "letter field {c:#x} for {id:#x}");
            }
            for &c in &out[3..] {
                assert!(c.is_ascii_digit() || (b'A'..=b'F').contains(&c));
            }
            match id.checked_add(0x0001_0F31) {
                Some(next) => id = next,
                None => break,
            }
        }
        assert_eq!(&encode_eisa_id(u32::MAX)[3..], b"FFFF");
    }

    #[test]
    fn letters_in_range_are_uppercase() {
        for raw in [0x030A_D041_u32, 0x0C0C_D041, 0x0501_2E4F] {
            let out = encode_eisa_id(raw);
            assert!(out[..3].iter().all(u8::is_ascii_uppercase));
        }
    }

    #[test]
    fn textual_id_round_trips() {
        let id = EisaId::from_str_id("PNP0A03").unwrap();
        assert_eq!(id.raw, 0x030A_D041);
        assert_eq!(id.to_string(), "PNP0A03");
    }

    #[test]
    fn rejects_malformed_textual_id() {
        assert!(EisaId::from_str_id("PNP0A0").is_none());
        assert!(EisaId::from_str_id("pnp0A03").is_none());
        assert!(EisaId::from_str_id("PNP0a03").is_none());
        assert!(EisaId::from_str_id("PNP0G03").is_none());
    }
}
