// SPDX-License-Identifier: MIT OR Apache-2.0

//! Null-terminated UTF-16 strings as stored in firmware data.
//!
//! Firmware strings are sequences of little-endian 16-bit code units,
//! terminated by a null code unit, and may appear on any byte boundary.
//! Characters outside the Basic Multilingual Plane are stored as surrogate
//! pairs.

use std::char::{decode_utf16, DecodeUtf16Error};

/// Errors converting between Rust strings and UTF-16.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Utf16Error {
    /// No null terminator was found.
    #[error("string is not null-terminated")]
    Unterminated,

    /// A code unit is an unpaired surrogate.
    #[error("unpaired surrogate {0:#06x}")]
    UnpairedSurrogate(u16),

    /// The string contains a null character before its end.
    #[error("string contains an interior null character")]
    InteriorNul,
}

impl From<DecodeUtf16Error> for Utf16Error {
    fn from(err: DecodeUtf16Error) -> Self {
        Self::UnpairedSurrogate(err.unpaired_surrogate())
    }
}

/// Decode the null-terminated string at the start of `bytes`.
///
/// Returns the string and the number of bytes it occupies, terminator
/// included.
pub fn read_cstr16(bytes: &[u8]) -> Result<(String, usize), Utf16Error> {
    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&c| c != 0)
        .collect();

    let size = (code_units.len() + 1) * 2;
    if size > bytes.len() {
        return Err(Utf16Error::Unterminated);
    }

    let s = decode_utf16(code_units).collect::<Result<String, _>>()?;
    Ok((s, size))
}

/// Number of bytes `s` occupies as a null-terminated UTF-16 string.
pub fn cstr16_size(s: &str) -> Result<usize, Utf16Error> {
    check_interior_nul(s)?;
    Ok((s.encode_utf16().count() + 1) * 2)
}

/// Append `s` to `out` as a null-terminated UTF-16 string.
pub fn write_cstr16(s: &str, out: &mut Vec<u8>) -> Result<(), Utf16Error> {
    check_interior_nul(s)?;
    for c in s.encode_utf16().chain([0]) {
        out.extend_from_slice(&c.to_le_bytes());
    }
    Ok(())
}

fn check_interior_nul(s: &str) -> Result<(), Utf16Error> {
    if s.contains('\0') {
        Err(Utf16Error::InteriorNul)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cstr16() {
        let bytes = [b'A', 0, b'r', 0, 0, 0, 0xff, 0xff];
        assert_eq!(read_cstr16(&bytes), Ok(("Ar".to_owned(), 6)));

        assert_eq!(read_cstr16(&[0, 0]), Ok((String::new(), 2)));
        assert_eq!(read_cstr16(&bytes[..4]), Err(Utf16Error::Unterminated));
        // A dangling odd byte cannot hold a terminator.
        assert_eq!(read_cstr16(&[b'A', 0, 0]), Err(Utf16Error::Unterminated));
    }

    #[test]
    fn test_read_surrogate_pair() {
        let bytes = [0x41, 0x00, 0x3e, 0xd8, 0x80, 0xdd, 0x00, 0x00];
        assert_eq!(read_cstr16(&bytes), Ok(("A🦀".to_owned(), 8)));

        // High surrogate followed by the terminator.
        assert_eq!(
            read_cstr16(&[0x3e, 0xd8, 0x00, 0x00]),
            Err(Utf16Error::UnpairedSurrogate(0xd83e))
        );
    }

    #[test]
    fn test_write_cstr16() {
        let mut out = vec![0xaa];
        write_cstr16("Arch", &mut out).unwrap();
        assert_eq!(out, [0xaa, b'A', 0, b'r', 0, b'c', 0, b'h', 0, 0, 0]);
        assert_eq!(cstr16_size("Arch"), Ok(10));
        assert_eq!(cstr16_size(""), Ok(2));
    }

    #[test]
    fn test_write_surrogate_pair() {
        let mut out = Vec::new();
        write_cstr16("A🦀", &mut out).unwrap();
        assert_eq!(out, [0x41, 0x00, 0x3e, 0xd8, 0x80, 0xdd, 0x00, 0x00]);
        assert_eq!(cstr16_size("🦀"), Ok(6));
    }

    #[test]
    fn test_interior_nul() {
        assert_eq!(cstr16_size("a\0b"), Err(Utf16Error::InteriorNul));
        assert_eq!(
            write_cstr16("a\0b", &mut Vec::new()),
            Err(Utf16Error::InteriorNul)
        );
    }
}
