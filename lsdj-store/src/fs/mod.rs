//! The filesystem in which a save stores its projects
//!
//! Every save comes with a filesystem to store the (compressed) projects you're currently not
//! working on. This module contains the types for reading and manipulating it, though you
//! usually get at one through [`SRam`](crate::sram::SRam).

mod filesystem;

pub use filesystem::{Entries, Entry, Filesystem, FromReaderError, Index, InsertError};

use crate::{
    name::Name,
    project::Project,
    serde::DecompressError,
    song::SongBuffer,
};
use thiserror::Error;

/// A [`Name`], version and _compressed_ [`SongBuffer`] stored somewhere
///
/// Slots in the [`Filesystem`] don't keep their song around in decompressed form. This trait
/// represents the interface to such a stored project, which is decompressed on demand.
pub trait File {
    /// The name of the project stored in the file, exactly as stored
    fn name(&self) -> Name<8>;

    /// The version (increased with every save) of the project
    fn version(&self) -> u8;

    /// Decompress the song stored in the file
    fn decompress(&self) -> Result<SongBuffer, DecompressError>;

    /// Decompress and combine all fields into a [`Project`]
    fn project(&self) -> Result<Project, FileToProjectError> {
        let name = self.name();
        let version = self.version();
        let song = self.decompress()?;

        Ok(Project::with_song(name, version, song))
    }
}

/// Errors that might occur converting a [`File`] to a [`Project`]
#[derive(Debug, Error)]
pub enum FileToProjectError {
    /// Decompressing the song failed
    #[error("Decompressing the song failed")]
    Decompress(#[from] DecompressError),
}
