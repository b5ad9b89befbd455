//! LittleSoundDJ SRAM/`.sav` file handling
//!
//! Game Boy emulators store the SRAM tied to a ROM in `.sav` files, and flashcarts let you
//! copy them to and from real hardware. For LSDJ, that SRAM holds the song being worked on and
//! a [`Filesystem`] with the other projects.

use crate::{
    fs::{self, Filesystem},
    song::SongBuffer,
};
use log::debug;
use std::{
    fs::{File, create_dir_all},
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};
use thiserror::Error;

/// A full representation of LittleSoundDJ SRAM
///
/// Every LSDJ save consists of the same amount of bytes: the song you're currently working on
/// (uncompressed), followed by a filesystem containing at most 32 (compressed) projects.
///
/// ```no_run
/// # use lsdj_store::sram::SRam;
/// # use std::fs::File;
/// // Construct valid SRAM with the default/empty song and an empty filesystem
/// let sram = SRam::new();
///
/// // Load SRAM from a path on disk
/// let sram = SRam::from_path("bangers.sav")?;
///
/// // Load SRAM from an arbitrary reader
/// let sram = SRam::from_reader(File::open("bangers.sav")?)?;
///
/// // And write it back
/// sram.to_path("bangers.sav")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SRam {
    /// The song that's currently being worked on in LSDJ
    pub working_song: SongBuffer,

    /// Compressed storage for projects not currently worked on
    pub filesystem: Filesystem,
}

impl SRam {
    /// The length in bytes of a `.sav`
    pub const LEN: usize = SongBuffer::LEN + Filesystem::LEN;

    /// Construct a new SRAM, with a default song and empty filesystem
    pub fn new() -> Self {
        Self {
            working_song: SongBuffer::new(),
            filesystem: Filesystem::new(),
        }
    }

    /// Deserialize SRAM from an arbitrary I/O reader
    pub fn from_reader<R>(mut reader: R) -> Result<Self, FromReaderError>
    where
        R: Read,
    {
        let working_song =
            SongBuffer::from_reader(&mut reader).map_err(FromReaderError::WorkingSong)?;
        let filesystem = Filesystem::from_reader(&mut reader)?;

        debug!(
            "Read SRAM with {} block(s) in use",
            filesystem.blocks_used_count()
        );

        Ok(Self {
            working_song,
            filesystem,
        })
    }

    /// Deserialize SRAM from a path on disk (.sav)
    pub fn from_path<P>(path: P) -> Result<Self, FromPathError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        let sram = Self::from_reader(BufReader::new(file))?;

        Ok(sram)
    }

    /// Serialize SRAM to an arbitrary I/O writer
    pub fn to_writer<W>(&self, mut writer: W) -> Result<(), io::Error>
    where
        W: Write,
    {
        self.working_song.to_writer(&mut writer)?;
        self.filesystem.to_writer(&mut writer)?;
        writer.flush()
    }

    /// Serialize SRAM to a path on disk (.sav), creating its parent directories if necessary
    pub fn to_path<P>(&self, path: P) -> Result<(), io::Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        self.to_writer(BufWriter::new(File::create(path)?))
    }
}

/// Errors that might be returned from [`SRam::from_reader()`]
#[derive(Debug, Error)]
pub enum FromReaderError {
    /// Deserializing the working song from I/O failed
    #[error("Reading the working song failed")]
    WorkingSong(#[source] io::Error),

    /// Deserializing the file system from I/O failed
    #[error("Reading the filesystem failed")]
    Filesystem(#[from] fs::FromReaderError),
}

/// Errors that might be returned from [`SRam::from_path()`]
#[derive(Debug, Error)]
pub enum FromPathError {
    /// Opening the file itself failed
    #[error("Opening the file failed")]
    FileOpen(#[from] io::Error),

    /// Deserialization failed
    #[error("Reading the SRAM from file failed")]
    Read(#[from] FromReaderError),
}
