// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tooling for C-style enums.
//!
//! Firmware data routinely carries enumerations that are open-ended: a
//! device path node may use a sub-type newer than this crate, and a load
//! option may set category bits nobody has assigned yet. Storing such a
//! value in a Rust `enum` would mean rejecting data that round-trips fine.
//! These enums are therefore modeled as newtypes around their raw
//! representation with a set of associated constants.

/// Interface a C-style enum as an integer newtype.
///
/// The generated type is `Copy`, comparable, hashable and ordered, and its
/// `Debug` output names the matching constant, or falls back to the raw
/// value for unknown variants.
///
/// ```
/// use efivar::newtype_enum;
///
/// newtype_enum! {
/// pub enum UnixBool: i32 => #[allow(missing_docs)] {
///     FALSE          =  0,
///     TRUE           =  1,
///     FILE_NOT_FOUND = -1,
/// }}
///
/// assert_eq!(format!("{:?}", UnixBool::TRUE), "TRUE");
/// assert_eq!(format!("{:?}", UnixBool(7)), "UnixBool(7)");
/// ```
#[macro_export]
macro_rules! newtype_enum {
    (
        $(#[$type_attrs:meta])*
        $visibility:vis enum $type:ident : $base:ty => $(#[$impl_attrs:meta])* {
            $(
                $(#[$variant_attrs:meta])*
                $variant:ident = $value:expr,
            )*
        }
    ) => {
        $(#[$type_attrs])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
        $visibility struct $type(pub $base);

        $(#[$impl_attrs])*
        #[allow(unused)]
        impl $type {
            $(
                $(#[$variant_attrs])*
                pub const $variant: $type = $type($value);
            )*
        }

        impl core::fmt::Debug for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                $(
                    if *self == Self::$variant {
                        return f.write_str(stringify!($variant));
                    }
                )*
                write!(f, "{}({:?})", stringify!($type), self.0)
            }
        }
    };
}
