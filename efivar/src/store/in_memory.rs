// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`VariableStore`] that lives entirely in memory.

use super::{VariableError, VariableStore};
use crate::variable::{Variable, VariableAttributes, VariableName};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    attributes: VariableAttributes,
    data: Vec<u8>,
}

/// An in-memory implementation of [`VariableStore`].
///
/// Nothing is persisted. Variables are kept ordered by vendor, then name.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    variables: BTreeMap<VariableName, Entry>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, replacing any previous value, and return the store.
    #[must_use]
    pub fn with(mut self, variable: Variable) -> Self {
        self.insert(variable);
        self
    }

    /// Add a variable, replacing any previous value.
    pub fn insert(&mut self, variable: Variable) {
        self.variables.insert(
            variable.name,
            Entry {
                attributes: variable.attributes,
                data: variable.data,
            },
        );
    }

    /// Iterate over all variables in the store.
    pub fn iter(&self) -> impl Iterator<Item = Variable> + '_ {
        self.variables.iter().map(|(name, entry)| Variable {
            name: name.clone(),
            attributes: entry.attributes,
            data: entry.data.clone(),
        })
    }

    /// Number of variables in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the store holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl VariableStore for InMemoryStore {
    fn is_supported(&self) -> bool {
        true
    }

    fn get(&self, name: &VariableName) -> Result<Variable, VariableError> {
        self.variables
            .get(name)
            .map(|entry| Variable {
                name: name.clone(),
                attributes: entry.attributes,
                data: entry.data.clone(),
            })
            .ok_or_else(|| VariableError::NotFound(name.clone()))
    }

    fn set(&mut self, variable: &Variable, _mode: u32) -> Result<(), VariableError> {
        let append = variable
            .attributes
            .contains(VariableAttributes::APPEND_WRITE);
        let attributes = variable
            .attributes
            .difference(VariableAttributes::APPEND_WRITE);

        match self.variables.get_mut(&variable.name) {
            Some(entry) if append => {
                entry.data.extend_from_slice(&variable.data);
            }
            Some(entry) => {
                entry.attributes = attributes;
                entry.data.clone_from(&variable.data);
            }
            None => {
                self.variables.insert(
                    variable.name.clone(),
                    Entry {
                        attributes,
                        data: variable.data.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    fn delete(&mut self, name: &VariableName) -> Result<(), VariableError> {
        self.variables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VariableError::NotFound(name.clone()))
    }

    fn variable_names(&self) -> Result<Vec<VariableName>, VariableError> {
        Ok(self.variables.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableVendor;

    fn boot_order(data: &[u8]) -> Variable {
        Variable::new(
            VariableName::global("BootOrder"),
            VariableAttributes::BOOT_VARIABLE,
            data.to_vec(),
        )
    }

    #[test]
    fn test_get_set_delete() {
        let mut store = InMemoryStore::new();
        let name = VariableName::global("BootOrder");

        assert!(matches!(store.get(&name), Err(VariableError::NotFound(_))));
        assert!(!store.exists(&name).unwrap());

        store.set(&boot_order(&[1, 0, 2, 0]), 0o644).unwrap();
        assert!(store.exists(&name).unwrap());
        let var = store.get(&name).unwrap();
        assert_eq!(var.data, [1, 0, 2, 0]);
        assert_eq!(var.attributes, VariableAttributes::BOOT_VARIABLE);

        store.delete(&name).unwrap();
        assert!(!store.exists(&name).unwrap());
        assert!(store.delete(&name).unwrap_err().is_not_found());
    }

    #[test]
    fn test_append_write() {
        let mut store = InMemoryStore::new().with(boot_order(&[1, 0]));

        let mut append = boot_order(&[2, 0]);
        append.attributes |= VariableAttributes::APPEND_WRITE;
        store.set(&append, 0o644).unwrap();

        let var = store.get(&VariableName::global("BootOrder")).unwrap();
        assert_eq!(var.data, [1, 0, 2, 0]);
        assert!(!var.attributes.contains(VariableAttributes::APPEND_WRITE));
    }

    #[test]
    fn test_names_are_per_vendor() {
        let store = InMemoryStore::new()
            .with(boot_order(&[1, 0]))
            .with(Variable::new(
                VariableName::new(VariableVendor::IMAGE_SECURITY_DATABASE, "BootOrder"),
                VariableAttributes::NON_VOLATILE,
                vec![],
            ));

        assert_eq!(store.len(), 2);
        let names = store.variable_names().unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.name == "BootOrder"));
        assert_eq!(store.iter().filter(|v| v.name.is_global()).count(), 1);
    }
}
