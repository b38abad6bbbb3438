// SPDX-License-Identifier: MIT OR Apache-2.0

//! Variable stores.
//!
//! A [`VariableStore`] is the host's view of the firmware variable storage:
//! a flat key-value map from [`VariableName`] to raw bytes plus attributes.
//! Two implementations are provided:
//!
//! * [`Efivarfs`] reads and writes the variables of the running firmware
//!   through the Linux efivarfs filesystem.
//! * [`InMemoryStore`] keeps everything in a map. It is useful for tests and
//!   for staging a set of edits before committing them.

mod efivarfs;
mod in_memory;

pub use efivarfs::Efivarfs;
pub use in_memory::InMemoryStore;

use crate::variable::{Variable, VariableName};
use std::io;

/// Errors returned by a [`VariableStore`].
#[derive(Debug, thiserror::Error)]
pub enum VariableError {
    /// The variable does not exist.
    #[error("variable {0} not found")]
    NotFound(VariableName),

    /// The store returned a value it could not decode.
    #[error("variable {name} is corrupted: {reason}")]
    Corrupted {
        /// The variable being accessed.
        name: VariableName,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// An I/O error occurred while accessing the variable.
    #[error("failed to access variable {name}")]
    Io {
        /// The variable being accessed.
        name: VariableName,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The names of the variables in the store could not be read.
    #[error("failed to list variables")]
    List(#[source] io::Error),
}

impl VariableError {
    /// Whether this error means the variable is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Access to a set of firmware variables.
///
/// [`is_supported`] should be queried once before anything else; the other
/// operations are unavailable on a store that is not supported.
///
/// [`is_supported`]: Self::is_supported
pub trait VariableStore {
    /// Whether the store can be used on this system.
    fn is_supported(&self) -> bool;

    /// Get the contents and attributes of a variable.
    fn get(&self, name: &VariableName) -> Result<Variable, VariableError>;

    /// Set the contents and attributes of a variable, creating it if it
    /// does not exist yet. `mode` holds the permission bits used when the
    /// store has to create a backing object for the variable.
    fn set(&mut self, variable: &Variable, mode: u32) -> Result<(), VariableError>;

    /// Delete a variable.
    fn delete(&mut self, name: &VariableName) -> Result<(), VariableError>;

    /// Get the names of all the variables in the store.
    fn variable_names(&self) -> Result<Vec<VariableName>, VariableError>;

    /// Check whether a variable exists.
    ///
    /// A missing variable is reported as `Ok(false)`, any other failure is
    /// returned as an error.
    fn exists(&self, name: &VariableName) -> Result<bool, VariableError> {
        match self.get(name) {
            Ok(_) => Ok(true),
            Err(VariableError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
