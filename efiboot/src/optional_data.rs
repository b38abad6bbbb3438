// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional data of a load option.
//!
//! The bytes following the device path of a load option belong to the
//! image being loaded. Linux EFI stub kernels and most boot managers read
//! them as a UCS-2 command line, others as plain bytes. [`OptionalData`]
//! keeps the bytes and offers both text views.

use core::fmt;
use core::ops::Deref;
use std::borrow::Cow;

/// Trailing payload of a load option, passed as-is to the loaded image.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OptionalData(Vec<u8>);

impl OptionalData {
    /// Wrap raw bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Store `text` as UTF-8 bytes.
    #[must_use]
    pub fn from_utf8(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }

    /// Store `text` as UTF-16LE code units, low byte first, without a
    /// terminator.
    #[must_use]
    pub fn from_ucs2(text: &str) -> Self {
        Self(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
    }

    /// The raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume `self` and return the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Read the bytes as UTF-8 text. Invalid sequences are replaced with
    /// U+FFFD rather than rejected.
    #[must_use]
    pub fn interpret_as_utf8(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Read the bytes as little-endian UCS-2 text.
    ///
    /// Returns an empty string if the length is odd. Unpaired surrogates are
    /// replaced with U+FFFD. Null code units are kept.
    #[must_use]
    pub fn interpret_as_ucs2(&self) -> String {
        if self.0.len() % 2 != 0 {
            return String::new();
        }

        let code_units = self
            .0
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        char::decode_utf16(code_units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

impl Deref for OptionalData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for OptionalData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for OptionalData {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Shows printable ASCII bytes as-is and every other byte as `.`.
impl fmt::Display for OptionalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '.'
            };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}
