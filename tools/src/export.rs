//! The `export` subcommand

use crate::utils::check_for_overwrite;
use anyhow::{Context, Result, bail};
use clap::Args;
use log::info;
use lsdj_store::{
    fs::{File, Filesystem},
    name::Name,
    project::Project,
    sram::SRam,
};
use std::{
    env::current_dir,
    fs::create_dir_all,
    path::PathBuf,
};

/// Export songs from an LSDJ save file
#[derive(Args)]
#[clap(author, version, about = "Export .lsdsng's from a .sav file", long_about = None)]
pub struct ExportArgs {
    /// The path to the save file to export from
    path: PathBuf,

    /// Indices of the songs that should be exported. No indices means all songs.
    index: Vec<usize>,

    /// The destination folder to place the songs
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Prepend the song position to the start of the filename
    #[clap(short = 'p', long)]
    output_pos: bool,

    /// Append the song version to the end of the filename
    #[clap(short = 'v', long)]
    output_version: bool,

    /// Use decimal version numbers, instead of hexadecimal
    #[clap(short, long)]
    decimal: bool,
}

/// Export songs from an LSDJ save file
pub fn export(mut args: ExportArgs) -> Result<()> {
    if let Some(index) = args
        .index
        .iter()
        .find(|index| **index >= Filesystem::FILES_CAPACITY)
    {
        bail!(
            "Index {index} is out of range, a save holds {} songs",
            Filesystem::FILES_CAPACITY
        );
    }

    let sram = SRam::from_path(&args.path).context("Reading the SRAM from file failed")?;

    if args.index.is_empty() {
        args.index = (0..Filesystem::FILES_CAPACITY).collect();
    }

    let folder = match &args.output {
        Some(folder) => folder.clone(),
        None => current_dir().context("Could not fetch current working directory")?,
    };
    create_dir_all(&folder).context("Could not create output directory")?;

    for (index, file) in sram.filesystem.files().enumerate() {
        if !args.index.contains(&index) {
            continue;
        }

        if let Some(file) = file {
            let project = file
                .project()
                .with_context(|| format!("Could not read the song in slot {index}"))?;

            let path = folder.join(file_name(&args, index, &project));

            if !check_for_overwrite(&path)? {
                info!("Skipped exporting slot {index}");
                continue;
            }

            project
                .to_lsdsng_path(&path)
                .context("Could not write lsdsng to file")?;

            println!(
                "{:02}. {:8} => {}",
                index,
                project.name().to_string_lossy(),
                path.to_string_lossy()
            );
        }
    }

    Ok(())
}

fn file_name(args: &ExportArgs, index: usize, project: &Project) -> PathBuf {
    let mut name = String::new();
    if args.output_pos {
        name.push_str(&format!("{index:02}_"));
    }

    // Keep path separators and the like out of the file name
    let characters = &project.name().bytes()[..project.name().len()];
    name.extend(characters.iter().map(|byte| {
        if Name::<8>::is_byte_allowed(*byte) {
            char::from(*byte)
        } else {
            '_'
        }
    }));

    if args.output_version {
        if args.decimal {
            name.push_str(&format!("_v{:03}", project.version()));
        } else {
            name.push_str(&format!("_v{:02X}", project.version()));
        }
    }

    PathBuf::from(format!("{name}.lsdsng"))
}
