// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`VariableStore`] backed by the Linux efivarfs filesystem.
//!
//! Each variable is a file named `Name-vendor` in the efivarfs mount. The
//! file holds the variable's attributes as a little-endian `u32`, followed
//! by the variable's data. A variable is updated in one `write` call
//! carrying both the attributes and the complete new contents; split writes
//! are rejected by the kernel.
//!
//! The kernel marks most variable files immutable so that a stray write
//! cannot brick the machine. The flag is cleared before a variable is
//! overwritten or removed.
//!
//! The store builds on every platform, but efivarfs only exists on Linux.
//! Elsewhere [`Efivarfs::is_supported`] returns `false` unless `root` is
//! pointed at a directory laid out the same way.

use super::{VariableError, VariableStore};
use crate::variable::{Variable, VariableAttributes, VariableName, VariableVendor};
use fs_err as fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uguid::Guid;

/// Size of the attribute prefix at the start of each file.
const ATTRIBUTES_SIZE: usize = 4;

/// Length of a hyphenated GUID string.
const GUID_STR_LEN: usize = 36;

/// Variable store reading and writing files in an efivarfs mount.
#[derive(Clone, Debug)]
pub struct Efivarfs {
    root: PathBuf,
}

impl Efivarfs {
    /// Where efivarfs is mounted on a standard Linux system.
    pub const DEFAULT_ROOT: &'static str = "/sys/firmware/efi/efivars";

    /// Create a store using the standard mount point.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(Self::DEFAULT_ROOT)
    }

    /// Create a store rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the variable files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &VariableName) -> PathBuf {
        self.root.join(name.to_string())
    }

    fn io_error(name: &VariableName, err: io::Error) -> VariableError {
        match err.kind() {
            io::ErrorKind::NotFound => VariableError::NotFound(name.clone()),
            _ => VariableError::Io {
                name: name.clone(),
                source: err,
            },
        }
    }
}

impl Default for Efivarfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an efivarfs file name into a variable name.
fn parse_file_name(file_name: &str) -> Option<VariableName> {
    let separator = file_name.len().checked_sub(GUID_STR_LEN + 1)?;
    if separator == 0 || file_name.as_bytes()[separator] != b'-' {
        return None;
    }
    let name = file_name.get(..separator)?;
    let vendor: Guid = file_name.get(separator + 1..)?.parse().ok()?;
    Some(VariableName::new(VariableVendor(vendor), name))
}

/// Clear the immutable flag of the file at `path`, if it exists.
#[cfg(target_os = "linux")]
fn make_mutable(path: &Path) -> io::Result<()> {
    use nix::libc::{c_int, c_long};
    use std::os::unix::io::AsRawFd;

    // The ioctl numbers are declared with a `long` argument, but the
    // kernel reads and writes an `int`.
    nix::ioctl_read_bad!(
        fs_ioc_getflags,
        nix::request_code_read!(b'f', 1, std::mem::size_of::<c_long>()),
        c_int
    );
    nix::ioctl_write_ptr_bad!(
        fs_ioc_setflags,
        nix::request_code_write!(b'f', 2, std::mem::size_of::<c_long>()),
        c_int
    );

    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    let fd = file.file().as_raw_fd();

    let mut flags: c_int = 0;
    // SAFETY: `fd` is open for the duration of the call and `flags` is a
    // valid `int` for the kernel to write to.
    if let Err(errno) = unsafe { fs_ioc_getflags(fd, &mut flags) } {
        log::debug!("cannot read flags of {}: {errno}", path.display());
        return Ok(());
    }

    if let Some(flags) = without_immutable(flags) {
        log::debug!("clearing immutable flag of {}", path.display());
        // SAFETY: as above, `flags` is a valid `int` for the kernel to read.
        unsafe { fs_ioc_setflags(fd, &flags) }.map_err(io::Error::from)?;
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn make_mutable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Inode flag set on efivarfs files the kernel protects from writes.
#[cfg(target_os = "linux")]
const FS_IMMUTABLE_FL: nix::libc::c_int = 0x0000_0010;

/// The inode flags with the immutable bit cleared, or `None` if it is not
/// set.
#[cfg(target_os = "linux")]
fn without_immutable(flags: nix::libc::c_int) -> Option<nix::libc::c_int> {
    (flags & FS_IMMUTABLE_FL != 0).then_some(flags & !FS_IMMUTABLE_FL)
}

impl VariableStore for Efivarfs {
    fn is_supported(&self) -> bool {
        self.root.is_dir()
    }

    fn get(&self, name: &VariableName) -> Result<Variable, VariableError> {
        let path = self.path(name);
        log::trace!("reading {}", path.display());
        let contents = fs::read(&path).map_err(|err| Self::io_error(name, err))?;

        if contents.len() < ATTRIBUTES_SIZE {
            return Err(VariableError::Corrupted {
                name: name.clone(),
                reason: "file is shorter than its attribute prefix",
            });
        }
        let (attributes, data) = contents.split_at(ATTRIBUTES_SIZE);
        let attributes =
            u32::from_le_bytes([attributes[0], attributes[1], attributes[2], attributes[3]]);

        Ok(Variable {
            name: name.clone(),
            attributes: VariableAttributes::from_bits_retain(attributes),
            data: data.to_vec(),
        })
    }

    fn set(&mut self, variable: &Variable, mode: u32) -> Result<(), VariableError> {
        let name = &variable.name;
        let path = self.path(name);
        log::debug!("writing {} ({} bytes)", path.display(), variable.data.len());

        let mut contents = Vec::with_capacity(ATTRIBUTES_SIZE + variable.data.len());
        contents.extend_from_slice(&variable.attributes.bits().to_le_bytes());
        contents.extend_from_slice(&variable.data);

        let append = variable
            .attributes
            .contains(VariableAttributes::APPEND_WRITE);
        let mut options = std::fs::OpenOptions::new();
        options
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append);
        #[cfg(unix)]
        std::os::unix::fs::OpenOptionsExt::mode(&mut options, mode);
        #[cfg(not(unix))]
        let _ = mode;

        make_mutable(&path).map_err(|err| Self::io_error(name, err))?;
        let mut file =
            fs::File::from_options(&path, &options).map_err(|err| Self::io_error(name, err))?;
        let written = file
            .write(&contents)
            .map_err(|err| Self::io_error(name, err))?;
        if written != contents.len() {
            return Err(VariableError::Io {
                name: name.clone(),
                source: io::Error::new(io::ErrorKind::WriteZero, "short write to variable"),
            });
        }
        Ok(())
    }

    fn delete(&mut self, name: &VariableName) -> Result<(), VariableError> {
        let path = self.path(name);
        log::debug!("removing {}", path.display());
        make_mutable(&path).map_err(|err| Self::io_error(name, err))?;
        fs::remove_file(path).map_err(|err| Self::io_error(name, err))
    }

    fn variable_names(&self) -> Result<Vec<VariableName>, VariableError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(VariableError::List)? {
            let entry = entry.map_err(VariableError::List)?;
            let file_name = entry.file_name();
            match file_name.to_str().and_then(parse_file_name) {
                Some(name) => names.push(name),
                None => log::warn!("skipping {file_name:?}: not a variable file"),
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name() {
        let name = parse_file_name("Boot0001-8be4df61-93ca-11d2-aa0d-00e098032b8c").unwrap();
        assert_eq!(name, VariableName::global("Boot0001"));

        // Names may contain dashes themselves.
        let name = parse_file_name("My-Var-8be4df61-93ca-11d2-aa0d-00e098032b8c").unwrap();
        assert_eq!(name.name, "My-Var");

        assert!(parse_file_name("-8be4df61-93ca-11d2-aa0d-00e098032b8c").is_none());
        assert!(parse_file_name("Boot0001_8be4df61-93ca-11d2-aa0d-00e098032b8c").is_none());
        assert!(parse_file_name("Boot0001-not-a-guid").is_none());
        assert!(parse_file_name("lost+found").is_none());
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Efivarfs::with_root(dir.path());
        assert!(store.is_supported());

        let var = Variable::new(
            VariableName::global("BootNext"),
            VariableAttributes::BOOT_VARIABLE,
            vec![0x3a, 0x00],
        );
        store.set(&var, 0o600).unwrap();

        let raw = std::fs::read(dir.path().join(var.name.to_string())).unwrap();
        assert_eq!(raw, [0x07, 0, 0, 0, 0x3a, 0x00]);
        assert_eq!(store.get(&var.name).unwrap(), var);
        assert_eq!(store.variable_names().unwrap(), [var.name.clone()]);

        store.delete(&var.name).unwrap();
        assert!(!store.exists(&var.name).unwrap());
        assert!(store.get(&var.name).unwrap_err().is_not_found());
    }

    #[test]
    fn test_short_file_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let name = VariableName::global("BootCurrent");
        std::fs::write(dir.path().join(name.to_string()), [7, 0]).unwrap();
        std::fs::write(dir.path().join("README"), b"not a variable").unwrap();

        let store = Efivarfs::with_root(dir.path());
        assert!(matches!(
            store.get(&name),
            Err(VariableError::Corrupted { .. })
        ));
        assert_eq!(store.variable_names().unwrap(), [name]);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_without_immutable() {
        assert_eq!(without_immutable(0x10), Some(0));
        // FS_EXTENT_FL and FS_NOATIME_FL are kept.
        assert_eq!(without_immutable(0x0008_0090), Some(0x0008_0080));
        assert_eq!(without_immutable(0x0008_0080), None);
        assert_eq!(without_immutable(0), None);
    }

    #[test]
    fn test_overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Efivarfs::with_root(dir.path());
        let name = VariableName::global("Boot0001");
        std::fs::write(dir.path().join(name.to_string()), [7, 0, 0, 0, 1, 2, 3]).unwrap();

        let var = Variable::new(name.clone(), VariableAttributes::BOOT_VARIABLE, vec![9]);
        store.set(&var, 0o644).unwrap();
        assert_eq!(store.get(&name).unwrap(), var);
    }

    #[test]
    fn test_missing_root_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Efivarfs::with_root(dir.path().join("efivars"));
        assert!(!store.is_supported());
    }
}
