// SPDX-License-Identifier: MIT OR Apache-2.0

use efivar::device_path::DevicePathError;
use efivar::string::Utf16Error;
use efivar::{VariableError, VariableName};

/// Structural problem found while decoding firmware data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Corruption {
    /// The record is shorter than the fixed load option header.
    #[error("record is shorter than the load option header")]
    TooShort,

    /// The description has no null terminator.
    #[error("description is not null-terminated")]
    UnterminatedDescription,

    /// The description is not valid UTF-16.
    #[error("description is not valid UTF-16")]
    InvalidDescription,

    /// The device path length is zero.
    #[error("device path is empty")]
    EmptyFilePath,

    /// The device path runs past the end of the record.
    #[error("device path of {length} bytes runs past the end of the record")]
    FilePathOutOfBounds {
        /// Device path length from the header.
        length: u16,
    },

    /// The device path bytes are not a valid device path.
    #[error("malformed device path: {0}")]
    InvalidFilePath(DevicePathError),

    /// A list of 16-bit indices has an odd number of bytes.
    #[error("index list has odd length {0}")]
    OddIndexLength(usize),

    /// A variable holding a single index holds some other number of them.
    #[error("expected exactly one index, found {0}")]
    IndexCount(usize),
}

/// Errors from encoding or decoding a [`LoadOption`].
///
/// [`LoadOption`]: crate::LoadOption
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum LoadOptionError {
    /// The binary record is malformed.
    #[error("corrupted load option: {0}")]
    Corrupted(#[from] Corruption),

    /// The file path no longer matches the device path it was read from.
    /// Changing the device path of a load option is not supported.
    #[error("changing the device path of a load option is not supported")]
    UnsupportedMutation,

    /// The device path could not be converted to text.
    #[error("failed to format device path")]
    DevicePath(#[source] DevicePathError),

    /// The description cannot be stored as a null-terminated UTF-16 string.
    #[error("invalid description")]
    InvalidDescription(#[source] Utf16Error),

    /// The device path does not fit in the 16-bit length field.
    #[error("device path of {0} bytes is too long for a load option")]
    FilePathTooLong(usize),

    /// The output buffer cannot hold the serialized load option.
    #[error("buffer of {actual} bytes is too small, {required} bytes are required")]
    BufferTooSmall {
        /// Size of the serialized load option.
        required: usize,
        /// Size of the buffer that was passed in.
        actual: usize,
    },
}

/// Errors from reading or writing boot variables.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The variable does not exist.
    #[error("variable {0} not found")]
    NotFound(VariableName),

    /// The variable's contents are malformed.
    #[error("variable {name} is corrupted: {corruption}")]
    Corrupted {
        /// The variable being decoded.
        name: VariableName,
        /// What is wrong with it.
        corruption: Corruption,
    },

    /// The variable's load option could not be parsed or serialized.
    #[error("invalid load option in variable {name}")]
    LoadOption {
        /// The variable holding the load option.
        name: VariableName,
        /// The underlying error.
        #[source]
        source: LoadOptionError,
    },

    /// The variable store failed.
    #[error(transparent)]
    Store(VariableError),
}

impl Error {
    /// Whether the error means a variable is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the error means some firmware data is malformed.
    #[must_use]
    pub fn is_corrupted(&self) -> bool {
        matches!(
            self,
            Self::Corrupted { .. }
                | Self::LoadOption {
                    source: LoadOptionError::Corrupted(_),
                    ..
                }
        )
    }
}

impl From<VariableError> for Error {
    fn from(err: VariableError) -> Self {
        match err {
            VariableError::NotFound(name) => Self::NotFound(name),
            err => Self::Store(err),
        }
    }
}
