// SPDX-License-Identifier: MIT OR Apache-2.0

//! EFI load options.
//!
//! A load option is the binary record stored in a `Boot####` variable. All
//! fields are little-endian and packed:
//!
//! ```text
//! ┌────────────┬──────────────────┬──────────────────┬─────────────┬───────────────┐
//! │ attributes │ file path length │ description      │ file path   │ optional data │
//! │ u32        │ u16 (L)          │ UTF-16, null-ter │ L bytes     │ rest          │
//! └────────────┴──────────────────┴──────────────────┴─────────────┴───────────────┘
//! ```
//!
//! The file path is an EFI device path. It is kept as raw bytes next to its
//! text form, and only the description, the attributes and the optional
//! data can be changed.

use crate::error::{Corruption, LoadOptionError};
use crate::optional_data::OptionalData;
use bitflags::bitflags;
use efivar::device_path::{self, DevicePath};
use efivar::string::{self, Utf16Error};

/// Size of the attributes and file path length fields.
const HEADER_SIZE: usize = 6;

bitflags! {
    /// Attributes of a load option.
    ///
    /// Bits without a name here are kept as they are.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LoadOptionAttributes: u32 {
        /// The boot manager will try to boot this option automatically.
        const ACTIVE = 0x0000_0001;
        /// All drivers are disconnected and reconnected after loading a
        /// driver option.
        const FORCE_RECONNECT = 0x0000_0002;
        /// The option is not shown in the boot manager menu.
        const HIDDEN = 0x0000_0008;
        /// Mask of the option's category.
        const CATEGORY = 0x0000_1f00;
    }
}

efivar::newtype_enum! {
    /// Category of a load option.
    pub enum LoadOptionCategory: u32 => {
        /// Part of the normal boot processing.
        BOOT = 0x0000_0000,
        /// An application, only executed on demand.
        APP = 0x0000_0100,
    }
}

impl LoadOptionAttributes {
    /// Category of the option.
    #[must_use]
    pub const fn category(self) -> LoadOptionCategory {
        LoadOptionCategory(self.bits() & Self::CATEGORY.bits())
    }
}

/// A parsed load option.
///
/// [`file_path`] is the text form of the device path the option was parsed
/// with. Serialization fails with [`LoadOptionError::UnsupportedMutation`]
/// if it no longer matches.
///
/// [`file_path`]: Self::file_path
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadOption {
    /// Attribute bits.
    pub attributes: LoadOptionAttributes,
    /// Human readable label shown by boot managers.
    pub description: String,
    /// Text form of the device path.
    pub file_path: String,
    raw_file_path: Vec<u8>,
    /// Data passed to the loaded image.
    pub optional_data: OptionalData,
}

impl LoadOption {
    /// Parse a load option from the contents of a `Boot####` variable.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadOptionError> {
        if bytes.len() < HEADER_SIZE {
            return Err(Corruption::TooShort.into());
        }
        let attributes = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let file_path_length = u16::from_le_bytes([bytes[4], bytes[5]]);

        let (description, description_size) =
            string::read_cstr16(&bytes[HEADER_SIZE..]).map_err(|err| match err {
                Utf16Error::Unterminated => Corruption::UnterminatedDescription,
                _ => Corruption::InvalidDescription,
            })?;

        if file_path_length == 0 {
            return Err(Corruption::EmptyFilePath.into());
        }
        let file_path_start = HEADER_SIZE + description_size;
        let file_path_end = file_path_start + usize::from(file_path_length);
        let raw_file_path = bytes
            .get(file_path_start..file_path_end)
            .ok_or(Corruption::FilePathOutOfBounds {
                length: file_path_length,
            })?;
        DevicePath::new(raw_file_path).map_err(Corruption::InvalidFilePath)?;
        let file_path = device_path::to_text(raw_file_path).map_err(LoadOptionError::DevicePath)?;

        log::trace!("parsed load option {description:?} at {file_path}");

        Ok(Self {
            attributes: LoadOptionAttributes::from_bits_retain(attributes),
            description,
            file_path,
            raw_file_path: raw_file_path.to_vec(),
            optional_data: OptionalData::from(&bytes[file_path_end..]),
        })
    }

    /// The device path in its binary encoding.
    #[must_use]
    pub fn raw_file_path(&self) -> &[u8] {
        &self.raw_file_path
    }

    /// Serialize the load option.
    ///
    /// Fails with [`LoadOptionError::UnsupportedMutation`] if
    /// [`file_path`] was changed.
    ///
    /// [`file_path`]: Self::file_path
    pub fn to_bytes(&self) -> Result<Vec<u8>, LoadOptionError> {
        let file_path =
            device_path::to_text(&self.raw_file_path).map_err(LoadOptionError::DevicePath)?;
        if file_path != self.file_path {
            return Err(LoadOptionError::UnsupportedMutation);
        }

        let size = self.create(&mut [])?;
        let mut buf = vec![0; size];
        let written = self.create(&mut buf)?;
        debug_assert_eq!(written, size);
        Ok(buf)
    }

    /// Render the load option into `buf` and return its size in bytes.
    ///
    /// If `buf` is empty nothing is written, and only the required size is
    /// returned. Otherwise `buf` must be at least that large.
    pub fn create(&self, buf: &mut [u8]) -> Result<usize, LoadOptionError> {
        let file_path_length = u16::try_from(self.raw_file_path.len())
            .map_err(|_| LoadOptionError::FilePathTooLong(self.raw_file_path.len()))?;
        let description_size =
            string::cstr16_size(&self.description).map_err(LoadOptionError::InvalidDescription)?;
        let size = HEADER_SIZE
            + description_size
            + self.raw_file_path.len()
            + self.optional_data.len();

        if buf.is_empty() {
            return Ok(size);
        }
        if buf.len() < size {
            return Err(LoadOptionError::BufferTooSmall {
                required: size,
                actual: buf.len(),
            });
        }

        let mut description = Vec::with_capacity(description_size);
        string::write_cstr16(&self.description, &mut description)
            .map_err(LoadOptionError::InvalidDescription)?;

        let (header, rest) = buf[..size].split_at_mut(HEADER_SIZE);
        header[..4].copy_from_slice(&self.attributes.bits().to_le_bytes());
        header[4..].copy_from_slice(&file_path_length.to_le_bytes());
        let (description_buf, rest) = rest.split_at_mut(description_size);
        description_buf.copy_from_slice(&description);
        let (file_path_buf, optional_data_buf) = rest.split_at_mut(self.raw_file_path.len());
        file_path_buf.copy_from_slice(&self.raw_file_path);
        optional_data_buf.copy_from_slice(&self.optional_data);

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCH_LINUX: &[u8] = include_bytes!("../tests/fixtures/arch-linux.bin");
    const ARCH_LINUX_EDITED: &[u8] = include_bytes!("../tests/fixtures/arch-linux-edited.bin");

    #[test]
    fn test_parse() {
        let lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        assert_eq!(lo.attributes, LoadOptionAttributes::ACTIVE);
        assert_eq!(lo.attributes.category(), LoadOptionCategory::BOOT);
        assert_eq!(lo.description, "Arch Linux");
        assert_eq!(
            lo.file_path,
            r"HD(1,GPT,41c147b6-e9bf-4c27-81c6-174026e79fd0,0x10000,0x3a9800)/File(\vmlinuz-linux)"
        );
        assert_eq!(lo.raw_file_path().len(), 80);
        assert_eq!(
            lo.optional_data.interpret_as_ucs2(),
            r"root=LABEL=LINROOT rw initrd=\intel-ucode.img initrd=\initramfs-linux.img nvidia-drm.modeset=1"
        );
    }

    #[test]
    fn test_round_trip() {
        let lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        assert_eq!(lo.to_bytes().unwrap(), ARCH_LINUX);
    }

    #[test]
    fn test_edit_description_and_data() {
        let mut lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        lo.description = "MArch Winux".to_owned();
        lo.optional_data = OptionalData::from_utf8("hello world");
        assert_eq!(lo.to_bytes().unwrap(), ARCH_LINUX_EDITED);
    }

    #[test]
    fn test_changed_file_path_is_rejected() {
        let mut lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        lo.description = "Other".to_owned();
        lo.file_path = "foo".to_owned();
        assert_eq!(lo.to_bytes(), Err(LoadOptionError::UnsupportedMutation));
    }

    #[test]
    fn test_unknown_attribute_bits_survive() {
        let mut bytes = ARCH_LINUX.to_vec();
        bytes[0] = 0x09;
        bytes[1] = 0x01;
        bytes[3] = 0x80;
        let lo = LoadOption::from_bytes(&bytes).unwrap();
        assert!(lo.attributes.contains(LoadOptionAttributes::HIDDEN));
        assert_eq!(lo.attributes.category(), LoadOptionCategory::APP);
        assert_eq!(lo.attributes.bits(), 0x8000_0109);
        assert_eq!(lo.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_create_two_phase() {
        let lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        let size = lo.create(&mut []).unwrap();
        assert_eq!(size, ARCH_LINUX.len());

        let mut small = vec![0; size - 1];
        assert_eq!(
            lo.create(&mut small),
            Err(LoadOptionError::BufferTooSmall {
                required: size,
                actual: size - 1
            })
        );

        let mut large = vec![0xaa; size + 2];
        assert_eq!(lo.create(&mut large), Ok(size));
        assert_eq!(&large[..size], ARCH_LINUX);
        assert_eq!(large[size..], [0xaa, 0xaa]);
    }

    #[test]
    fn test_invalid_description() {
        let mut lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        lo.description = "Arch\0Linux".to_owned();
        assert_eq!(
            lo.to_bytes(),
            Err(LoadOptionError::InvalidDescription(Utf16Error::InteriorNul))
        );
    }

    /// Replace the "Arch Linux" description of the fixture with `description`,
    /// given as raw UTF-16LE bytes including the terminator.
    fn with_raw_description(description: &[u8]) -> Vec<u8> {
        let mut bytes = ARCH_LINUX[..HEADER_SIZE].to_vec();
        bytes.extend_from_slice(description);
        bytes.extend_from_slice(&ARCH_LINUX[HEADER_SIZE + 22..]);
        bytes
    }

    #[test]
    fn test_surrogate_pair_description() {
        let bytes = with_raw_description(&[0x41, 0x00, 0x3e, 0xd8, 0x80, 0xdd, 0x00, 0x00]);
        let lo = LoadOption::from_bytes(&bytes).unwrap();
        assert_eq!(lo.description, "A🦀");
        assert_eq!(lo.to_bytes().unwrap(), bytes);

        let mut lo = LoadOption::from_bytes(ARCH_LINUX).unwrap();
        lo.description = "A🦀".to_owned();
        assert_eq!(lo.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_unpaired_surrogate_description() {
        let bytes = with_raw_description(&[0x41, 0x00, 0x3e, 0xd8, 0x00, 0x00]);
        assert_eq!(
            LoadOption::from_bytes(&bytes),
            Err(LoadOptionError::Corrupted(Corruption::InvalidDescription))
        );
    }

    #[test]
    fn test_corrupted() {
        let corruption = |bytes: &[u8]| match LoadOption::from_bytes(bytes) {
            Err(LoadOptionError::Corrupted(c)) => c,
            other => panic!("unexpected result: {other:?}"),
        };

        assert_eq!(corruption(&ARCH_LINUX[..5]), Corruption::TooShort);
        // Cut inside the description.
        assert_eq!(
            corruption(&ARCH_LINUX[..12]),
            Corruption::UnterminatedDescription
        );
        // Cut inside the device path.
        assert_eq!(
            corruption(&ARCH_LINUX[..60]),
            Corruption::FilePathOutOfBounds { length: 80 }
        );

        let mut bytes = ARCH_LINUX.to_vec();
        bytes[4] = 0;
        bytes[5] = 0;
        assert_eq!(corruption(&bytes), Corruption::EmptyFilePath);

        // Drop the end node from the device path.
        let mut bytes = ARCH_LINUX.to_vec();
        bytes[4] = 76;
        assert!(matches!(
            corruption(&bytes),
            Corruption::InvalidFilePath(_)
        ));
    }
}
