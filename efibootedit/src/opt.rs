// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{ArgAction, Parser};
use efivar::Efivarfs;
use std::path::PathBuf;

/// Show and edit the description and optional data of UEFI boot entries.
///
/// Without a boot entry, lists the available boot entries and exits with a
/// failure status.
#[derive(Debug, Parser)]
#[clap(name = "efibootedit", version)]
pub struct Opt {
    /// Boot entry to show or edit, e.g. Boot0001.
    #[clap(action)]
    pub variable: Option<String>,

    /// Treat the optional data as UCS-2 text. Pass `false` to treat it as
    /// UTF-8 instead.
    #[clap(long, action = ArgAction::Set, default_value_t = true)]
    pub unicode_data: bool,

    /// Replace the description of the boot entry.
    #[clap(long, action)]
    pub description: Option<String>,

    /// Replace the optional data of the boot entry, encoded according to
    /// `--unicode-data`.
    #[clap(long, action)]
    pub data: Option<String>,

    /// Directory where efivarfs is mounted.
    #[clap(long, action, default_value = Efivarfs::DEFAULT_ROOT)]
    pub efivarfs: PathBuf,

    /// Log more details. Repeat for even more.
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Opt {
    /// Whether any field of the boot entry is to be changed.
    pub fn has_edits(&self) -> bool {
        self.description.is_some() || self.data.is_some()
    }
}
