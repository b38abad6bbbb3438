// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse, edit and write UEFI boot entries.
//!
//! Boot entries are `Boot####` firmware variables holding an EFI load
//! option: attributes, a description, the device path of the image to
//! load, and optional data for that image. This crate decodes load options
//! into a [`LoadOption`], lets the description, attributes and optional
//! data be changed, and encodes them back bit-exactly. It also resolves the
//! `BootCurrent`, `BootNext` and `BootOrder` variables that refer to boot
//! entries by index.
//!
//! Variables are accessed through an [`efivar::VariableStore`].
//!
//! # Example
//!
//! ```no_run
//! use efiboot::{boot_options, OptionalData};
//! use efivar::{Efivarfs, DEFAULT_MODE};
//!
//! # fn main() -> Result<(), efiboot::Error> {
//! let mut store = Efivarfs::new();
//! for mut option in boot_options(&store)? {
//!     if option.load_option.description == "Linux" {
//!         option.load_option.optional_data = OptionalData::from_ucs2("root=/dev/sda2 rw");
//!         option.write(&mut store, DEFAULT_MODE)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(clippy::all)]

pub mod boot;
mod error;
pub mod load_option;
pub mod optional_data;

pub use boot::{
    boot_current, boot_entry_name, boot_next, boot_options, boot_order, BootOption,
};
pub use error::{Corruption, Error, LoadOptionError};
pub use load_option::{LoadOption, LoadOptionAttributes, LoadOptionCategory};
pub use optional_data::OptionalData;
