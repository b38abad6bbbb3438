// SPDX-License-Identifier: MIT OR Apache-2.0

mod logger;
mod opt;

use anyhow::{Context, Result};
use clap::Parser;
use efiboot::{boot_current, boot_options, LoadOption, OptionalData};
use efivar::{Efivarfs, VariableName, VariableStore, DEFAULT_MODE};
use opt::Opt;
use std::process::ExitCode;

/// Print the available boot options to stderr.
fn list_boot_options(store: &impl VariableStore) -> Result<()> {
    let current = match boot_current(store) {
        Ok(name) => Some(name),
        Err(err) if err.is_not_found() => None,
        Err(err) => {
            log::warn!("cannot read the current boot option: {err}");
            None
        }
    };
    let options = boot_options(store).context("failed to read boot options")?;

    eprintln!("Usage: efibootedit [OPTIONS] <Boot####>");
    eprintln!();
    eprintln!("Available boot options:");
    for option in &options {
        let marker = if current.as_ref() == Some(option.name()) {
            " [current]"
        } else {
            ""
        };
        eprintln!(
            "  - {} ({}){marker}",
            option.name().name,
            option.load_option.description
        );
    }
    Ok(())
}

fn optional_data_text(data: &OptionalData, unicode: bool) -> String {
    if unicode {
        data.interpret_as_ucs2()
    } else {
        data.interpret_as_utf8().into_owned()
    }
}

fn print_load_option(name: &VariableName, option: &LoadOption, unicode: bool) {
    println!("{}", name.name);
    println!(
        "  attributes:    {:?} ({:#010x})",
        option.attributes,
        option.attributes.bits()
    );
    println!("  description:   {}", option.description);
    println!("  file path:     {}", option.file_path);
    println!(
        "  optional data: {}",
        optional_data_text(&option.optional_data, unicode)
    );
    log::debug!("optional data as ASCII: {}", option.optional_data);
}

fn run(opt: &Opt) -> Result<ExitCode> {
    let mut store = Efivarfs::with_root(&opt.efivarfs);
    if !store.is_supported() {
        eprintln!(
            "EFI variables are not supported on this system ({} is not a directory)",
            opt.efivarfs.display()
        );
        return Ok(ExitCode::FAILURE);
    }

    let Some(entry) = opt.variable.as_deref() else {
        list_boot_options(&store)?;
        return Ok(ExitCode::FAILURE);
    };

    let name = VariableName::global(entry);
    if !store.exists(&name)? {
        eprintln!("No such boot option: {entry}");
        return Ok(ExitCode::FAILURE);
    }
    let mut variable = store.get(&name)?;
    let mut option =
        LoadOption::from_bytes(&variable.data).with_context(|| format!("failed to parse {entry}"))?;

    if !opt.has_edits() {
        print_load_option(&name, &option, opt.unicode_data);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(description) = &opt.description {
        option.description = description.clone();
    }
    if let Some(data) = &opt.data {
        option.optional_data = if opt.unicode_data {
            OptionalData::from_ucs2(data)
        } else {
            OptionalData::from_utf8(data)
        };
    }

    variable.data = option
        .to_bytes()
        .with_context(|| format!("failed to serialize {entry}"))?;
    store
        .set(&variable, DEFAULT_MODE)
        .with_context(|| format!("failed to write {entry}"))?;
    log::info!("updated {entry} ({} bytes)", variable.data.len());

    print_load_option(&name, &option, opt.unicode_data);
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let opt = Opt::parse();
    logger::init(opt.verbose);

    match run(&opt) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("efibootedit: {err:#}");
            ExitCode::FAILURE
        }
    }
}
