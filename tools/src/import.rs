//! The `import` subcommand

use crate::utils::{check_for_overwrite, has_extension};
use anyhow::{Context, Result, bail};
use clap::Args;
use log::{debug, info};
use lsdj_store::{
    fs::{File, Filesystem, Index, InsertError},
    project::Project,
    serde::CompressError,
    sram::SRam,
};
use std::path::PathBuf;

/// Arguments for the `import` subcommand
#[derive(Args)]
#[clap(author, version, about = "Import .lsdsng's into a .sav file", long_about = None)]
pub struct ImportArgs {
    /// Paths to the songs that should be imported into a save
    ///
    /// Songs from other .sav files can be imported as well.
    #[clap(required = true)]
    song: Vec<PathBuf>,

    /// The output path
    #[clap(short, long)]
    output: PathBuf,
}

/// Import .lsdsng's into a .sav file
pub fn import(args: ImportArgs) -> Result<()> {
    let mut index = 0;
    let mut sram = SRam::new();

    for path in &args.song {
        if has_extension(path, "lsdsng") {
            let project = Project::from_lsdsng_path(path)
                .with_context(|| format!("Could not load {}", path.to_string_lossy()))?;

            insert(&mut sram, &mut index, &project)?;
            println!("{:02} => {}", index - 1, path.to_string_lossy());
        } else if has_extension(path, "sav") {
            let sav = SRam::from_path(path)
                .with_context(|| format!("Could not open {}", path.to_string_lossy()))?;

            for (source_index, file) in sav.filesystem.files().enumerate() {
                if let Some(file) = file {
                    let project = file.project().with_context(|| {
                        format!(
                            "Could not read file {} from {}",
                            source_index,
                            path.to_string_lossy()
                        )
                    })?;

                    insert(&mut sram, &mut index, &project)?;
                    println!(
                        "{:02} => {} - {}",
                        index - 1,
                        path.to_string_lossy(),
                        project.name().to_string_lossy(),
                    );
                }
            }
        } else {
            bail!("{} is not a .lsdsng or .sav file", path.to_string_lossy());
        }
    }

    if check_for_overwrite(&args.output)? {
        sram.to_path(&args.output).with_context(|| {
            format!("Could not write SRAM to {}", args.output.to_string_lossy())
        })?;

        println!("Wrote {}", args.output.to_string_lossy());
    } else {
        info!("Left {} untouched", args.output.to_string_lossy());
    }

    Ok(())
}

/// Insert a project into the next free slot
fn insert(sram: &mut SRam, index: &mut u8, project: &Project) -> Result<()> {
    if *index as usize == Filesystem::FILES_CAPACITY {
        bail!("Reached the maximum file limit. Aborting import.");
    }

    match sram.filesystem.insert_file(Index::new(*index), project) {
        Err(InsertError::Compress(CompressError::NoBlockLeft)) => {
            bail!("Ran out of space in the SRAM memory")
        }
        result => {
            result.context("Could not insert song")?;
        }
    }

    debug!(
        "Inserted {} into slot {index}, {} block(s) left",
        project.name(),
        sram.filesystem.blocks_free_count()
    );

    *index += 1;
    Ok(())
}
