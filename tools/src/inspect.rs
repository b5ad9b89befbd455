//! The `inspect` subcommand

use crate::utils::has_extension;
use anyhow::{Context, Result, bail};
use clap::Args;
use log::warn;
use lsdj_store::{
    fs::{Entry, File},
    lsdsng::is_likely_valid_lsdsng_path,
    project::Project,
    serde::BLOCK_COUNT,
    sram::SRam,
};
use std::path::{Path, PathBuf};

/// Arguments for the `inspect` subcommand
#[derive(Args)]
#[clap(author, version, about = "Inspect LSDJ .sav and .lsdsng files for their contents", long_about = None)]
pub struct InspectArgs {
    /// The path(s) to inspect
    #[clap(required = true)]
    path: Vec<PathBuf>,

    /// List the blocks every song occupies
    #[clap(short, long)]
    blocks: bool,
}

/// Inspect LSDJ .sav and .lsdsng files for their contents
pub fn inspect(args: &InspectArgs) -> Result<()> {
    if let Some((last, rest)) = args.path.split_last() {
        for path in rest {
            print(path, args.blocks)?;
            println!();
        }

        print(last, args.blocks)?;
    }

    Ok(())
}

fn print(path: &Path, blocks: bool) -> Result<()> {
    if has_extension(path, "sav") {
        print_sav(path, blocks)
    } else if has_extension(path, "lsdsng") {
        print_lsdsng(path)
    } else {
        bail!("{} is not a .sav or .lsdsng file", path.to_string_lossy())
    }
}

fn print_sav(path: &Path, blocks: bool) -> Result<()> {
    let sram = SRam::from_path(path).context("Reading the SRAM from file failed")?;
    let used = sram.filesystem.blocks_used_count();

    println!(
        "{:<32}Mem {used}/{BLOCK_COUNT}    [{}]",
        file_name(path),
        usage_bar(used, 24)
    );

    for file in sram.filesystem.files().flatten() {
        let active = sram.filesystem.active_file() == Some(file.index());
        println!("{}", describe_file(&file, active, blocks));
    }

    Ok(())
}

/// One line of the slot table
///
/// A slot that doesn't decompress still gets its line, with the error in place of the format
/// version, so one damaged song doesn't hide the others.
fn describe_file(file: &Entry, active: bool, blocks: bool) -> String {
    let index = u8::from(file.index());
    let active = if active { '*' } else { ' ' };
    let mut line = format!(
        "{index:>3}{active}| {:<8} | v{:03} | ",
        file.name().to_string_lossy(),
        file.version()
    );

    match file.decompress() {
        Ok(song) => line.push_str(&format!(
            "f{:03} | {:>3} blocks",
            song.format_version(),
            file.blocks().len()
        )),
        Err(error) => {
            warn!("Could not decompress file {index}: {error}");
            line.push_str(&format!(
                "error: {error} | {:>3} blocks",
                file.blocks().len()
            ));
        }
    }

    if blocks {
        line.push_str(&format!(" | {:?}", file.blocks()));
    }

    line
}

fn print_lsdsng(path: &Path) -> Result<()> {
    if !is_likely_valid_lsdsng_path(path).context("Could not read the file size")? {
        bail!("{} does not have the size of an .lsdsng", path.to_string_lossy());
    }

    let project = Project::from_lsdsng_path(path).context("Reading the lsdsng from file failed")?;
    let format_version = project.song().map(|song| song.format_version()).unwrap_or_default();

    println!(
        "{:<32}{:<8} | v{:03} | f{:03}",
        file_name(path),
        project.name().to_string_lossy(),
        project.version(),
        format_version
    );

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn usage_bar(used: usize, width: usize) -> String {
    let filled = used * width / BLOCK_COUNT;
    format!("{}{}", "=".repeat(filled), " ".repeat(width - filled))
}
