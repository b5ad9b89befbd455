use anyhow::{Context, Result};
use std::{
    io::{BufRead, stdin},
    path::Path,
};

pub fn has_extension(path: &Path, extension: &str) -> bool {
    match path.extension() {
        Some(ext) => ext.eq_ignore_ascii_case(extension),
        None => false,
    }
}

/// Ask on the terminal before replacing an existing file
///
/// Returns whether writing to `path` may go ahead.
pub fn check_for_overwrite(path: &Path) -> Result<bool> {
    confirm_overwrite(path, stdin().lock())
}

/// Ask before replacing an existing file, reading the answers from `input`
///
/// Running out of input counts as a no.
fn confirm_overwrite<R>(path: &Path, mut input: R) -> Result<bool>
where
    R: BufRead,
{
    if !path.exists() {
        return Ok(true);
    }

    loop {
        println!(
            "{} already exists. Do you want to overwrite it? Y/n",
            path.to_string_lossy()
        );

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Could not read terminal input")?;

        if read == 0 {
            return Ok(false);
        }

        match line.trim_end() {
            "Y" => return Ok(true),
            "n" => return Ok(false),
            _ => (),
        }
    }
}
