//! UCS-2 helpers for descriptions and file path nodes.
//!
//! Firmware strings are `CHAR16` sequences: one little-endian 16-bit code unit
//! per character, no surrogate pairs, terminated by a single NUL unit.

use crate::error::EncodingError;
use alloc::string::String;
use alloc::vec::Vec;

/// Converts `text` into UCS-2 code units without a terminator.
///
/// # Errors
/// Rejects NUL characters and anything outside the Basic Multilingual Plane.
pub fn encode_str(text: &str) -> Result<Vec<u16>, EncodingError> {
    let mut units = Vec::with_capacity(text.len());
    for c in text.chars() {
        if c == '\0' {
            return Err(EncodingError::EmbeddedNul);
        }
        let mut buf = [0u16; 2];
        let encoded = c.encode_utf16(&mut buf);
        if encoded.len() != 1 {
            return Err(EncodingError::NotUcs2(c));
        }
        units.push(encoded[0]);
    }
    Ok(units)
}

/// Appends `units` followed by a NUL unit, little-endian.
pub fn write_with_nul(units: &[u16], out: &mut Vec<u8>) {
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
}

/// Reads code units up to the first NUL unit.
///
/// Returns the units (without the terminator) and the number of bytes
/// consumed including the terminator, or `None` if no terminator exists.
#[must_use]
pub fn read_until_nul(bytes: &[u8]) -> Option<(Vec<u16>, usize)> {
    let mut units = Vec::new();
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if unit == 0 {
            return Some((units, (i + 1) * 2));
        }
        units.push(unit);
    }
    None
}

/// Lossy conversion for display.
#[must_use]
pub fn to_string_lossy(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let units = encode_str("\\EFI\\Boot").unwrap();
        let mut bytes = Vec::new();
        write_with_nul(&units, &mut bytes);
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[18..], &[0, 0]);

        let (decoded, consumed) = read_until_nul(&bytes).unwrap();
        assert_eq!(consumed, 20);
        assert_eq!(to_string_lossy(&decoded), "\\EFI\\Boot");
    }

    #[test]
    fn rejects_nul_and_astral_characters() {
        assert_eq!(encode_str("a\0b"), Err(EncodingError::EmbeddedNul));
        assert_eq!(encode_str("boot 🚀"), Err(EncodingError::NotUcs2('🚀')));
    }

    #[test]
    fn missing_terminator_is_detected() {
        assert!(read_until_nul(&[b'A', 0, b'B', 0]).is_none());
    }
}
