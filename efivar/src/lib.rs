// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to UEFI firmware variables from a running operating system.
//!
//! Firmware keeps its configuration in variables: small blobs identified by
//! a vendor GUID and a name, tagged with a set of attribute bits. This crate
//! provides the types to name and hold such variables, and the
//! [`VariableStore`] trait through which they are read and written.
//!
//! # Crate organisation
//!
//! - [`variable`]: [`VariableName`], [`VariableVendor`],
//!   [`VariableAttributes`] and [`Variable`].
//! - [`store`]: the [`VariableStore`] trait, the Linux efivarfs backend and
//!   an in-memory store.
//! - [`device_path`]: a reader for the binary encoding of EFI device paths
//!   and their conversion to text.
//! - [`string`]: null-terminated UTF-16 strings as found in firmware data.
//!
//! # Example
//!
//! ```
//! use efivar::{InMemoryStore, Variable, VariableAttributes, VariableName, VariableStore};
//!
//! let mut store = InMemoryStore::new();
//! let name = VariableName::global("BootNext");
//! store
//!     .set(
//!         &Variable::new(name.clone(), VariableAttributes::BOOT_VARIABLE, vec![0x3a, 0]),
//!         efivar::DEFAULT_MODE,
//!     )
//!     .unwrap();
//! assert!(store.exists(&name).unwrap());
//! ```

#![warn(missing_docs)]
#![deny(clippy::all)]

#[macro_use]
mod enums;

pub mod device_path;
pub mod store;
pub mod string;
pub mod variable;

pub use store::{Efivarfs, InMemoryStore, VariableError, VariableStore};
pub use uguid::{guid, Guid};
pub use variable::{Variable, VariableAttributes, VariableName, VariableVendor, DEFAULT_MODE};
