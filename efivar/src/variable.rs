// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firmware variable naming and attributes.

use bitflags::bitflags;
use core::fmt;
use uguid::{guid, Guid};

/// Creation mode used when a store has to create the backing object of a
/// variable and the caller has no preference.
pub const DEFAULT_MODE: u32 = 0o644;

newtype_enum! {
    /// Unique key for a variable's vendor.
    ///
    /// A variable name is only unique within its vendor namespace, so the
    /// same name may exist under several vendors.
    pub enum VariableVendor: Guid => {
        /// Used to access global variables. All boot variables
        /// (`BootOrder`, `BootCurrent`, `Boot####`...) live here.
        GLOBAL_VARIABLE = guid!("8be4df61-93ca-11d2-aa0d-00e098032b8c"),

        /// Used to access EFI signature database variables.
        IMAGE_SECURITY_DATABASE = guid!("d719b2cb-3d3a-4596-a3bc-dad00e67656f"),
    }
}

impl fmt::Display for VariableVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

bitflags! {
    /// Flags describing the attributes of a variable.
    ///
    /// Bits this crate has no name for are kept as they are so that writing
    /// a variable back does not alter them.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct VariableAttributes: u32 {
        /// Variable is maintained across a power cycle.
        const NON_VOLATILE = 0x01;

        /// Variable is accessible during the time that boot services are
        /// accessible.
        const BOOTSERVICE_ACCESS = 0x02;

        /// Variable is accessible during the time that runtime services are
        /// accessible.
        const RUNTIME_ACCESS = 0x04;

        /// Variable is stored in the portion of NVR allocated for error
        /// records.
        const HARDWARE_ERROR_RECORD = 0x08;

        /// Deprecated.
        const AUTHENTICATED_WRITE_ACCESS = 0x10;

        /// Variable payload begins with an EFI_VARIABLE_AUTHENTICATION_2
        /// structure.
        const TIME_BASED_AUTHENTICATED_WRITE_ACCESS = 0x20;

        /// This is never set in the attributes returned by a read. When
        /// passed to a write, the data is appended to the existing value.
        const APPEND_WRITE = 0x40;

        /// Variable payload begins with an EFI_VARIABLE_AUTHENTICATION_3
        /// structure.
        const ENHANCED_AUTHENTICATED_ACCESS = 0x80;
    }
}

impl VariableAttributes {
    /// Attributes carried by boot variables created by operating system
    /// tools.
    pub const BOOT_VARIABLE: Self = Self::NON_VOLATILE
        .union(Self::BOOTSERVICE_ACCESS)
        .union(Self::RUNTIME_ACCESS);
}

/// Name of a firmware variable: a vendor namespace plus a name within it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VariableName {
    /// Namespace the variable belongs to.
    pub vendor: VariableVendor,
    /// Name of the variable, unique within `vendor`.
    pub name: String,
}

impl VariableName {
    /// Create a variable name.
    pub fn new(vendor: VariableVendor, name: impl Into<String>) -> Self {
        Self {
            vendor,
            name: name.into(),
        }
    }

    /// Create the name of a variable in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self::new(VariableVendor::GLOBAL_VARIABLE, name)
    }

    /// Whether the variable lives in the global namespace.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.vendor == VariableVendor::GLOBAL_VARIABLE
    }
}

/// Formats as `Name-vendor`, the naming used by efivarfs.
impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.vendor)
    }
}

/// A firmware variable: its name, attributes and raw contents.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    /// Name of the variable.
    pub name: VariableName,
    /// Attribute bits stored alongside the contents.
    pub attributes: VariableAttributes,
    /// Raw contents.
    pub data: Vec<u8>,
}

impl Variable {
    /// Create a variable.
    pub fn new(name: VariableName, attributes: VariableAttributes, data: Vec<u8>) -> Self {
        Self {
            name,
            attributes,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name_display() {
        let name = VariableName::global("BootOrder");
        assert_eq!(
            name.to_string(),
            "BootOrder-8be4df61-93ca-11d2-aa0d-00e098032b8c"
        );
        assert!(name.is_global());
    }

    #[test]
    fn test_vendor_debug() {
        assert_eq!(
            format!("{:?}", VariableVendor::GLOBAL_VARIABLE),
            "GLOBAL_VARIABLE"
        );
        let other = VariableVendor(guid!("01234567-89ab-cdef-0123-456789abcdef"));
        assert!(format!("{other:?}").starts_with("VariableVendor("));
    }

    #[test]
    fn test_attributes_keep_unknown_bits() {
        let attrs = VariableAttributes::from_bits_retain(0x1007);
        assert!(attrs.contains(VariableAttributes::BOOT_VARIABLE));
        assert_eq!(attrs.bits(), 0x1007);
    }
}
