//! The `.lsdsng` format
//!
//! Artists move single songs in and out of a save with `.lsdsng` files. The format is a
//! stripped down version of the save [`Filesystem`](crate::fs::Filesystem): the 8 byte name
//! field, the version byte and the compressed blocks of one song, back to back.
//!
//! ```no_run
//! # use lsdj_store::project::Project;
//! let project = Project::from_lsdsng_path("banger.lsdsng")?;
//! project.to_lsdsng_path("banger_copy.lsdsng")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::{
    name::Name,
    project::Project,
    serde::{
        BLOCK_COUNT, BLOCK_LEN, CompressError, DecompressError, FIRST_BLOCK, compress,
        decompress_sequential,
    },
};
use log::{debug, warn};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
    slice,
};
use thiserror::Error;

/// The length of the name field
const NAME_LEN: usize = 8;

/// The length of the name and version that precede the blocks
pub const HEADER_LEN: usize = NAME_LEN + 1;

/// The length of the largest possible `.lsdsng`
pub const MAX_LEN: usize = HEADER_LEN + BLOCK_COUNT * BLOCK_LEN;

impl Project {
    /// Deserialize a [`Project`] from an `.lsdsng` reader
    ///
    /// The blocks are read in the order they are stored in. Block jump values are validated,
    /// but don't move the reader, because `.lsdsng` files keep the jump values of the save
    /// they were exported from. The name field is kept byte for byte, even when it holds
    /// characters LSDJ can't display.
    pub fn from_lsdsng<R>(mut reader: R) -> Result<Self, ReadError>
    where
        R: Read,
    {
        let mut name = [0; NAME_LEN];
        reader.read_exact(&mut name)?;
        let name = Name::from_raw_bytes(name);
        if !name.is_valid() {
            warn!("The lsdsng name {name:?} holds characters LSDJ can't display");
        }

        let mut version = 0;
        reader.read_exact(slice::from_mut(&mut version))?;

        let song = decompress_sequential(&mut reader)?;
        debug!("Read lsdsng {name} (version {version:#04X})");

        Ok(Self::with_song(name, version, song))
    }

    /// Deserialize a [`Project`] from an `.lsdsng` file on disk
    pub fn from_lsdsng_path<P>(path: P) -> Result<Self, FromPathError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Ok(Self::from_lsdsng(BufReader::new(file))?)
    }

    /// Deserialize a [`Project`] from `.lsdsng` bytes in memory
    pub fn from_lsdsng_bytes(bytes: &[u8]) -> Result<Self, ReadError> {
        Self::from_lsdsng(bytes)
    }

    /// Serialize the [`Project`] to an `.lsdsng` writer
    ///
    /// The song is compressed into consecutive blocks, starting at block 1. Returns the total
    /// number of bytes written. Projects without a song can't be written, which is checked
    /// before anything goes out.
    pub fn to_lsdsng<W>(&self, mut writer: W) -> Result<usize, WriteError>
    where
        W: Write,
    {
        let song = self.song().ok_or(WriteError::NoSong)?;

        writer.write_all(self.name().bytes())?;
        writer.write_all(slice::from_ref(&self.version()))?;
        let blocks = compress(song, &mut writer, FIRST_BLOCK, BLOCK_COUNT)?;
        writer.flush()?;

        debug!(
            "Wrote lsdsng {} (version {:#04X}) in {blocks} block(s)",
            self.name(),
            self.version()
        );

        Ok(HEADER_LEN + blocks * BLOCK_LEN)
    }

    /// Serialize the [`Project`] to an `.lsdsng` file on disk
    pub fn to_lsdsng_path<P>(&self, path: P) -> Result<usize, WriteError>
    where
        P: AsRef<Path>,
    {
        if !self.has_song() {
            return Err(WriteError::NoSong);
        }

        let file = File::create(path)?;
        self.to_lsdsng(BufWriter::new(file))
    }

    /// Serialize the [`Project`] to `.lsdsng` bytes in memory
    pub fn to_lsdsng_bytes(&self) -> Result<Vec<u8>, WriteError> {
        let mut bytes = Vec::new();
        self.to_lsdsng(&mut bytes)?;
        Ok(bytes)
    }
}

/// Could a stream of `len` bytes be an `.lsdsng`?
///
/// This only checks that the header is followed by whole blocks. Passing it doesn't mean the
/// contents decompress.
pub fn is_valid_lsdsng_len(len: u64) -> bool {
    len >= HEADER_LEN as u64 && (len - HEADER_LEN as u64) % BLOCK_LEN as u64 == 0
}

/// Check the length of a stream (from its current position to the end) with [`is_valid_lsdsng_len()`]
///
/// The stream is left at the position it started at.
pub fn is_likely_valid_lsdsng<S>(mut stream: S) -> Result<bool, io::Error>
where
    S: Seek,
{
    let begin = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(begin))?;

    Ok(is_valid_lsdsng_len(end.saturating_sub(begin)))
}

/// Check the length of a file on disk with [`is_valid_lsdsng_len()`]
pub fn is_likely_valid_lsdsng_path<P>(path: P) -> Result<bool, io::Error>
where
    P: AsRef<Path>,
{
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.is_file() && is_valid_lsdsng_len(metadata.len()))
}

/// Errors that might be returned from [`Project::from_lsdsng()`]
#[derive(Debug, Error)]
pub enum ReadError {
    /// The name or version could not be read
    #[error("Reading the lsdsng header failed")]
    Io(#[from] io::Error),

    /// The song could not be decompressed
    #[error("Decompressing the lsdsng song failed")]
    Decompress(#[from] DecompressError),
}

/// Errors that might be returned from [`Project::from_lsdsng_path()`]
#[derive(Debug, Error)]
pub enum FromPathError {
    /// Could not open the file for reading
    #[error("Could not open the file for reading")]
    FileOpen(#[from] io::Error),

    /// Deserialization from the file failed
    #[error("Reading the lsdsng from file failed")]
    Read(#[from] ReadError),
}

/// Errors that might be returned from [`Project::to_lsdsng()`]
#[derive(Debug, Error)]
pub enum WriteError {
    /// Only projects with a song can be written
    #[error("The project has no song to write")]
    NoSong,

    /// Writing the name, version or blocks failed
    #[error("Writing the lsdsng failed")]
    Io(#[from] io::Error),

    /// The song could not be compressed
    #[error("Compressing the lsdsng song failed")]
    Compress(#[from] CompressError),
}
