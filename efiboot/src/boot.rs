// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boot variables.
//!
//! The boot manager's configuration is spread over several variables in
//! the global namespace:
//!
//! - `Boot####` variables each hold a [`LoadOption`]. `####` is the
//!   option's index in uppercase hex, e.g. `Boot000A`.
//! - `BootOrder` lists the indices of the options to try, in order.
//! - `BootNext` holds the index of the option to try on the next boot only.
//! - `BootCurrent` holds the index of the option the system booted from.
//!
//! Indices are stored as little-endian `u16`s.

use crate::error::{Corruption, Error};
use crate::load_option::LoadOption;
use efivar::{Variable, VariableName, VariableStore};

/// Name of the variable holding the index of the current boot option.
pub const BOOT_CURRENT: &str = "BootCurrent";

/// Name of the variable holding the index of the option for the next boot.
pub const BOOT_NEXT: &str = "BootNext";

/// Name of the variable holding the boot order.
pub const BOOT_ORDER: &str = "BootOrder";

/// Name of the `Boot####` variable for `index`.
#[must_use]
pub fn boot_entry_name(index: u16) -> VariableName {
    VariableName::global(format!("Boot{index:04X}"))
}

/// Index of a `Boot####` variable name, if it is one.
fn boot_entry_index(name: &str) -> Option<u16> {
    let digits = name.strip_prefix("Boot")?;
    if digits.len() != 4
        || !digits
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Whether `name` is a `Boot####` variable in the global namespace.
#[must_use]
pub fn is_boot_entry_name(name: &VariableName) -> bool {
    name.is_global() && name.name != BOOT_NEXT && boot_entry_index(&name.name).is_some()
}

/// Decode a list of little-endian `u16` indices.
pub fn decode_indices(data: &[u8]) -> Result<Vec<u16>, Corruption> {
    if data.len() % 2 != 0 {
        return Err(Corruption::OddIndexLength(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn read_indices<S>(store: &S, name: &VariableName) -> Result<Vec<u16>, Error>
where
    S: VariableStore + ?Sized,
{
    let variable = store.get(name)?;
    decode_indices(&variable.data).map_err(|corruption| Error::Corrupted {
        name: name.clone(),
        corruption,
    })
}

/// Read a variable holding exactly one index, and return the name of the
/// `Boot####` variable it refers to.
pub fn resolve_index<S>(store: &S, name: &VariableName) -> Result<VariableName, Error>
where
    S: VariableStore + ?Sized,
{
    let indices = read_indices(store, name)?;
    match indices[..] {
        [index] => {
            log::debug!("{} refers to Boot{index:04X}", name.name);
            Ok(boot_entry_name(index))
        }
        _ => Err(Error::Corrupted {
            name: name.clone(),
            corruption: Corruption::IndexCount(indices.len()),
        }),
    }
}

/// Read a variable holding a list of indices, and return the names of the
/// `Boot####` variables it refers to, in order.
pub fn resolve_index_list<S>(store: &S, name: &VariableName) -> Result<Vec<VariableName>, Error>
where
    S: VariableStore + ?Sized,
{
    Ok(read_indices(store, name)?
        .into_iter()
        .map(boot_entry_name)
        .collect())
}

/// The boot option the system booted from.
pub fn boot_current<S: VariableStore + ?Sized>(store: &S) -> Result<VariableName, Error> {
    resolve_index(store, &VariableName::global(BOOT_CURRENT))
}

/// The boot option to try on the next boot only.
pub fn boot_next<S: VariableStore + ?Sized>(store: &S) -> Result<VariableName, Error> {
    resolve_index(store, &VariableName::global(BOOT_NEXT))
}

/// The boot options in boot order.
pub fn boot_order<S: VariableStore + ?Sized>(store: &S) -> Result<Vec<VariableName>, Error> {
    resolve_index_list(store, &VariableName::global(BOOT_ORDER))
}

/// A `Boot####` variable and the load option it holds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootOption {
    /// The variable as read from the store.
    pub variable: Variable,
    /// The parsed contents of the variable.
    pub load_option: LoadOption,
}

impl BootOption {
    fn read<S>(store: &S, name: &VariableName) -> Result<Self, Error>
    where
        S: VariableStore + ?Sized,
    {
        let variable = store.get(name)?;
        let load_option =
            LoadOption::from_bytes(&variable.data).map_err(|source| Error::LoadOption {
                name: name.clone(),
                source,
            })?;
        Ok(Self {
            variable,
            load_option,
        })
    }

    /// Name of the variable.
    #[must_use]
    pub fn name(&self) -> &VariableName {
        &self.variable.name
    }

    /// Index of the option.
    #[must_use]
    pub fn index(&self) -> u16 {
        // Only names with a valid index are read.
        boot_entry_index(&self.variable.name.name).unwrap_or_default()
    }

    /// Serialize the load option and write it back to its variable.
    ///
    /// The variable keeps its attributes. `mode` is passed to the store in
    /// case the variable has to be created again.
    pub fn write<S>(&mut self, store: &mut S, mode: u32) -> Result<(), Error>
    where
        S: VariableStore + ?Sized,
    {
        self.variable.data = self
            .load_option
            .to_bytes()
            .map_err(|source| Error::LoadOption {
                name: self.variable.name.clone(),
                source,
            })?;
        log::debug!(
            "writing {} ({} bytes)",
            self.variable.name.name,
            self.variable.data.len()
        );
        store.set(&self.variable, mode)?;
        Ok(())
    }
}

/// Read all boot options, sorted by variable name.
///
/// Fails if any `Boot####` variable cannot be read or parsed.
pub fn boot_options<S: VariableStore + ?Sized>(store: &S) -> Result<Vec<BootOption>, Error> {
    let mut names: Vec<VariableName> = store
        .variable_names()?
        .into_iter()
        .filter(is_boot_entry_name)
        .collect();
    names.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("found {} boot options", names.len());

    names
        .iter()
        .map(|name| BootOption::read(store, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use efivar::{InMemoryStore, VariableAttributes, VariableVendor};

    fn store_with(name: &str, data: &[u8]) -> InMemoryStore {
        InMemoryStore::new().with(Variable::new(
            VariableName::global(name),
            VariableAttributes::BOOT_VARIABLE,
            data.to_vec(),
        ))
    }

    #[test]
    fn test_boot_entry_name() {
        assert_eq!(boot_entry_name(0x003a).name, "Boot003A");
        assert_eq!(boot_entry_name(0xbeef).name, "BootBEEF");
        assert!(boot_entry_name(1).is_global());
    }

    #[test]
    fn test_is_boot_entry_name() {
        for name in ["Boot0000", "Boot000A", "BootFFFF"] {
            assert!(is_boot_entry_name(&VariableName::global(name)), "{name}");
        }
        for name in ["BootNext", "BootOrder", "Boot000a", "Boot00001", "BootCurrent"] {
            assert!(!is_boot_entry_name(&VariableName::global(name)), "{name}");
        }
        let other_vendor = VariableName::new(VariableVendor::IMAGE_SECURITY_DATABASE, "Boot0001");
        assert!(!is_boot_entry_name(&other_vendor));
    }

    #[test]
    fn test_decode_indices() {
        assert_eq!(decode_indices(&[]), Ok(vec![]));
        assert_eq!(decode_indices(&[0x3a, 0x00, 0x01, 0x20]), Ok(vec![0x003a, 0x2001]));
        assert_eq!(decode_indices(&[1, 0, 2]), Err(Corruption::OddIndexLength(3)));
    }

    #[test]
    fn test_resolve_index() {
        let store = store_with(BOOT_CURRENT, &[0x3a, 0x00]);
        assert_eq!(boot_current(&store).unwrap().name, "Boot003A");
        assert!(boot_next(&store).unwrap_err().is_not_found());
    }

    #[test]
    fn test_resolve_index_count() {
        for data in [&[][..], &[1, 0, 2, 0][..]] {
            let store = store_with(BOOT_NEXT, data);
            let err = boot_next(&store).unwrap_err();
            assert!(err.is_corrupted(), "{err}");
        }

        let store = store_with(BOOT_NEXT, &[1, 0, 2]);
        assert!(matches!(
            boot_next(&store),
            Err(Error::Corrupted {
                corruption: Corruption::OddIndexLength(3),
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_index_list() {
        let store = store_with(BOOT_ORDER, &[0x02, 0x00, 0x0a, 0x00, 0x01, 0x00]);
        let order: Vec<String> = boot_order(&store)
            .unwrap()
            .into_iter()
            .map(|name| name.name)
            .collect();
        assert_eq!(order, ["Boot0002", "Boot000A", "Boot0001"]);

        let store = store_with(BOOT_ORDER, &[]);
        assert!(boot_order(&store).unwrap().is_empty());

        let store = store_with(BOOT_ORDER, &[0x02]);
        assert!(boot_order(&store).unwrap_err().is_corrupted());
    }
}
