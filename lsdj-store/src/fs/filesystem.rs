use super::{File, FileToProjectError};
use crate::{
    name::Name,
    project::Project,
    serde::{
        BLOCK_COUNT, BLOCK_LEN, CompressError, DecompressError, compress_with, decompress,
        is_data_block,
    },
    song::SongBuffer,
};
use log::{debug, trace, warn};
use std::{
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
    ops::Range,
};
use thiserror::Error;

/// A 5-bit (0 - 31) index into the [`Filesystem`]
pub type Index = ux::u5;

const NAME_LEN: usize = 8;
const FILE_NAMES_RANGE: Range<usize> = 0x0000..0x0100;
const FILE_VERSIONS_RANGE: Range<usize> = 0x0100..0x0120;
const CHECK_RANGE: Range<usize> = 0x013E..0x0140;
const CHECK_VALUE: [u8; 2] = [0x6A, 0x6B]; // "jk"
const ACTIVE_FILE_INDEX: usize = 0x0140;
const NO_ACTIVE_FILE: u8 = 0xFF;
const ALLOC_TABLE_RANGE: Range<usize> = 0x0141..0x0200;
const UNUSED_BLOCK: u8 = 0xFF;

/// A pool of compression blocks shared by up to 32 projects
///
/// A save consists of one uncompressed song, and this filesystem where projects not currently
/// being worked on are kept in compressed form. The compression itself is implemented in
/// [`serde`](crate::serde).
///
/// Block 0 is the directory: it holds the name and version of every slot, and an allocation
/// table that records which slot owns each of the [`BLOCK_COUNT`] data blocks. A slot is in use
/// solely when it owns blocks. The blocks of one project don't have to be contiguous; they
/// are chained together by the block jumps in the compressed stream.
#[derive(Clone, PartialEq, Eq)]
pub struct Filesystem {
    bytes: [u8; Self::LEN],
}

impl Filesystem {
    /// The maximal number of files that can be stored in the filesystem
    pub const FILES_CAPACITY: usize = 0x20;

    /// The length in bytes of the entire filesystem, directory block included
    pub const LEN: usize = BLOCK_LEN * (BLOCK_COUNT + 1);

    /// Construct a valid, but empty filesystem
    ///
    /// This sets the bytes LSDJ checks to detect memory corruption, just like LSDJ does the
    /// first time it boots.
    pub fn new() -> Self {
        let mut bytes = [0; Self::LEN];

        bytes[CHECK_RANGE].copy_from_slice(&CHECK_VALUE);
        bytes[ACTIVE_FILE_INDEX] = NO_ACTIVE_FILE;
        bytes[ALLOC_TABLE_RANGE].fill(UNUSED_BLOCK);

        Self { bytes }
    }

    /// Deserialize a [`Filesystem`] from an arbitrary I/O reader
    pub fn from_reader<R>(mut reader: R) -> Result<Self, FromReaderError>
    where
        R: Read,
    {
        let mut bytes = [0; Self::LEN];
        reader.read_exact(bytes.as_mut_slice())?;

        if bytes[CHECK_RANGE] != CHECK_VALUE {
            return Err(FromReaderError::InitializationCheckIncorrect);
        }

        Ok(Self { bytes })
    }

    /// Serialize the [`Filesystem`] to an arbitrary I/O writer
    pub fn to_writer<W>(&self, mut writer: W) -> Result<(), io::Error>
    where
        W: Write,
    {
        writer.write_all(&self.bytes)
    }

    /// Is any compressed song data stored for the file slot at this index?
    pub fn is_file_in_use(&self, index: Index) -> bool {
        let index = index.into();
        self.alloc_table().iter().any(|block| *block == index)
    }

    /// Retrieve a [`File`] [`Entry`] from the filesystem
    ///
    /// Returns [`None`] if the slot is empty.
    pub fn file(&self, index: Index) -> Option<Entry<'_>> {
        let first_block = *self.file_blocks(index).first()?;

        Some(Entry {
            fs: self,
            index,
            first_block,
        })
    }

    /// Iterate over all the slots in the filesystem, empty ones included
    pub fn files(&self) -> Entries<'_> {
        Entries { fs: self, index: 0 }
    }

    /// Compress a [`Project`] into a slot of the filesystem
    ///
    /// The song is compressed into the blocks that are free or already belong to the slot, in
    /// ascending order. If it doesn't fit, [`InsertError::Compress`] is returned and the
    /// filesystem is left untouched.
    ///
    /// The project that previously occupied the slot (if any) is returned.
    pub fn insert_file(
        &mut self,
        index: Index,
        project: &Project,
    ) -> Result<Option<Project>, InsertError> {
        let song = project.song().ok_or(InsertError::NoSong)?;

        // Compress into a staging area first, so nothing changes if the song doesn't fit
        let file = u8::from(index);
        let candidates: Vec<u8> = self
            .alloc_table()
            .iter()
            .zip(1..)
            .filter_map(|(owner, block)| {
                (*owner == UNUSED_BLOCK || *owner == file).then_some(block)
            })
            .collect();

        let (&start_block, rest) = candidates
            .split_first()
            .ok_or(CompressError::NoBlockLeft)?;

        let mut staged = Vec::new();
        let mut next_blocks = rest.iter().copied();
        let count = compress_with(song, &mut staged, start_block, || next_blocks.next())?;

        let old = match self.file(index) {
            Some(entry) => Some(entry.project().map_err(InsertError::Replaced)?),
            None => None,
        };

        self.clear_file(index);

        self.file_name_mut(index).copy_from_slice(project.name().bytes());
        *self.file_version_mut(index) = project.version();

        for (block, bytes) in candidates[..count].iter().zip(staged.chunks_exact(BLOCK_LEN)) {
            trace!("Allocating block {block} to file {file}");
            self.alloc_table_mut()[*block as usize - 1] = file;
            self.block_mut(*block).copy_from_slice(bytes);
        }

        debug!(
            "Inserted {} into file {file}, {} block(s) left",
            project.name(),
            self.blocks_free_count()
        );

        Ok(old)
    }

    /// Remove a file from the filesystem
    ///
    /// Returns [`None`] if the slot was empty. Otherwise the slot is cleared and its blocks are
    /// freed, even when the project it held can't be decompressed.
    pub fn remove_file(&mut self, index: Index) -> Option<Result<Project, FileToProjectError>> {
        let project = self.file(index)?.project();
        self.clear_file(index);

        debug!(
            "Removed file {}, {} block(s) left",
            u8::from(index),
            self.blocks_free_count()
        );

        Some(project)
    }

    /// The index of the file currently being worked on
    ///
    /// The working song of an [`SRam`](crate::sram::SRam) is usually an edited version of one
    /// of the files in the filesystem.
    pub fn active_file(&self) -> Option<Index> {
        match self.bytes[ACTIVE_FILE_INDEX] {
            index if (index as usize) < Self::FILES_CAPACITY => Some(Index::new(index)),
            _ => None,
        }
    }

    /// Mark a file as the one being worked on, or [`None`] for no file at all
    pub fn set_active_file(&mut self, index: Option<Index>) {
        self.bytes[ACTIVE_FILE_INDEX] = index.map_or(NO_ACTIVE_FILE, u8::from);
    }

    /// Return the number of blocks in use
    pub fn blocks_used_count(&self) -> usize {
        self.alloc_table()
            .iter()
            .filter(|block| **block != UNUSED_BLOCK)
            .count()
    }

    /// Return the number of blocks still available
    pub fn blocks_free_count(&self) -> usize {
        BLOCK_COUNT - self.blocks_used_count()
    }

    /// Retrieve the indices of the blocks belonging to a specific file, in ascending order
    pub fn file_blocks(&self, index: Index) -> Vec<u8> {
        let file = index.into();
        self.alloc_table()
            .iter()
            .zip(1..)
            .filter_map(|(owner, block)| (*owner == file).then_some(block))
            .collect()
    }

    /// Decompress a file starting at a specific block
    fn decompress(&self, block: u8) -> Result<SongBuffer, DecompressError> {
        if !is_data_block(block) {
            return Err(DecompressError::InvalidBlock { block });
        }

        let mut reader = Cursor::new(self.bytes.as_slice());
        reader.seek(SeekFrom::Start(Self::block_range(block).start as u64))?;

        decompress(reader, block)
    }

    /// Empty a slot's directory entry and free its blocks
    fn clear_file(&mut self, index: Index) {
        for block in self.file_blocks(index) {
            self.block_mut(block).fill(0);
            self.alloc_table_mut()[block as usize - 1] = UNUSED_BLOCK;
        }

        self.file_name_mut(index).fill(0);
        *self.file_version_mut(index) = 0;
    }

    /// What's the byte range for a given block in the filesystem?
    fn block_range(block: u8) -> Range<usize> {
        let offset = BLOCK_LEN * block as usize;
        offset..offset + BLOCK_LEN
    }

    /// Access the bytes belonging to a specific block
    fn block_mut(&mut self, block: u8) -> &mut [u8] {
        &mut self.bytes[Self::block_range(block)]
    }

    /// Access the part of block 0 that represents the block allocation table
    ///
    /// Entry `n` of the table belongs to block `n + 1`, because block 0 itself isn't in it.
    fn alloc_table(&self) -> &[u8] {
        &self.bytes[ALLOC_TABLE_RANGE]
    }

    fn alloc_table_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[ALLOC_TABLE_RANGE]
    }

    fn name_range(index: Index) -> Range<usize> {
        let offset = FILE_NAMES_RANGE.start + u8::from(index) as usize * NAME_LEN;
        offset..offset + NAME_LEN
    }

    fn file_name(&self, index: Index) -> &[u8] {
        &self.bytes[Self::name_range(index)]
    }

    fn file_name_mut(&mut self, index: Index) -> &mut [u8] {
        &mut self.bytes[Self::name_range(index)]
    }

    fn file_version(&self, index: Index) -> u8 {
        self.bytes[FILE_VERSIONS_RANGE][u8::from(index) as usize]
    }

    fn file_version_mut(&mut self, index: Index) -> &mut u8 {
        &mut self.bytes[FILE_VERSIONS_RANGE][u8::from(index) as usize]
    }
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filesystem")
            .field("blocks_used", &self.blocks_used_count())
            .field("active_file", &self.active_file())
            .finish_non_exhaustive()
    }
}

/// Errors that might occur deserializing a [`Filesystem`] from I/O
#[derive(Debug, Error)]
pub enum FromReaderError {
    /// All correctly initialized filesystem memory has certain bytes set for
    /// verification against memory corruption.
    ///
    /// This error is returned when those bytes are faulty during a read.
    #[error("The initialization check failed")]
    InitializationCheckIncorrect,

    /// Any failure that has to do with I/O
    #[error("Something failed with I/O")]
    Io(#[from] io::Error),
}

/// Errors that might be returned from [`Filesystem::insert_file()`]
#[derive(Debug, Error)]
pub enum InsertError {
    /// Only projects with a song can be inserted
    #[error("The project has no song to insert")]
    NoSong,

    /// The song could not be compressed into the free blocks
    #[error("Compressing the song into the filesystem failed")]
    Compress(#[from] CompressError),

    /// The project currently in the slot could not be read back
    ///
    /// Use [`Filesystem::remove_file()`] to clear a damaged slot first.
    #[error("Reading the project that would be replaced failed")]
    Replaced(#[source] FileToProjectError),
}

/// Iterator over all the file [`Entry`]'s in a [`Filesystem`]
pub struct Entries<'a> {
    fs: &'a Filesystem,
    index: u8,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Option<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if (self.index as usize) < Filesystem::FILES_CAPACITY {
            let file = self.fs.file(Index::new(self.index));
            self.index += 1;
            Some(file)
        } else {
            None
        }
    }
}

/// Immutable reference to a single [`File`] in the [`Filesystem`]
pub struct Entry<'a> {
    fs: &'a Filesystem,
    index: Index,
    first_block: u8,
}

impl Entry<'_> {
    /// The slot this entry lives in
    pub fn index(&self) -> Index {
        self.index
    }

    /// The blocks holding the compressed song
    pub fn blocks(&self) -> Vec<u8> {
        self.fs.file_blocks(self.index)
    }
}

impl File for Entry<'_> {
    fn name(&self) -> Name<8> {
        let mut bytes = [0; NAME_LEN];
        bytes.copy_from_slice(self.fs.file_name(self.index));

        let name = Name::from_raw_bytes(bytes);
        if !name.is_valid() {
            warn!(
                "File {} has a name with characters LSDJ can't display: {:02X?}",
                u8::from(self.index),
                &name.bytes()[..name.len()]
            );
        }

        name
    }

    fn version(&self) -> u8 {
        self.fs.file_version(self.index)
    }

    /// Decompress the chain that starts at the lowest block owned by the slot
    fn decompress(&self) -> Result<SongBuffer, DecompressError> {
        self.fs.decompress(self.first_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn project(name: &str, version: u8, song: SongBuffer) -> Project {
        Project::with_song(Name::from_str(name).unwrap(), version, song)
    }

    /// A song that barely compresses, taking up about a third of the blocks
    fn noise(seed: u32) -> SongBuffer {
        let mut song = SongBuffer::zeroed();
        let mut state = seed;
        for byte in song.as_mut_slice() {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            *byte = (state >> 24) as u8;
        }
        song
    }

    fn snapshot(filesystem: &Filesystem) -> Vec<u8> {
        let mut bytes = Vec::new();
        filesystem.to_writer(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn empty() {
        let filesystem = Filesystem::new();

        assert_eq!(filesystem.blocks_used_count(), 0);
        assert_eq!(filesystem.blocks_free_count(), BLOCK_COUNT);
        assert_eq!(filesystem.active_file(), None);
        assert_eq!(filesystem.files().count(), Filesystem::FILES_CAPACITY);
        assert!(filesystem.files().all(|file| file.is_none()));
    }

    #[test]
    fn io() {
        let mut filesystem = Filesystem::new();
        filesystem
            .insert_file(Index::new(3), &project("IO", 1, SongBuffer::new()))
            .unwrap();

        let bytes = snapshot(&filesystem);
        assert_eq!(bytes.len(), Filesystem::LEN);
        assert_eq!(bytes[CHECK_RANGE], *b"jk");
        assert_eq!(&bytes[Filesystem::name_range(Index::new(3))], b"IO\0\0\0\0\0\0");
        assert_eq!(bytes[FILE_VERSIONS_RANGE.start + 3], 1);

        let read = Filesystem::from_reader(Cursor::new(&bytes)).unwrap();
        assert!(read == filesystem);

        let mut corrupt = bytes.clone();
        corrupt[CHECK_RANGE.start] = 0;
        assert!(matches!(
            Filesystem::from_reader(Cursor::new(&corrupt)),
            Err(FromReaderError::InitializationCheckIncorrect)
        ));

        assert!(matches!(
            Filesystem::from_reader(Cursor::new(&bytes[1..])),
            Err(FromReaderError::Io(_))
        ));
    }

    #[test]
    fn insert() {
        let mut filesystem = Filesystem::new();
        let source = project("EMPTY", 0, SongBuffer::new());

        let old = filesystem.insert_file(Index::new(0), &source).unwrap();
        assert!(old.is_none());
        assert!(filesystem.is_file_in_use(Index::new(0)));
        assert!(!filesystem.is_file_in_use(Index::new(1)));

        let file = filesystem.file(Index::new(0)).unwrap();
        assert_eq!(file.index(), Index::new(0));
        assert_eq!(file.name(), Name::from_str("EMPTY").unwrap());
        assert_eq!(file.version(), 0);
        assert_eq!(file.project().unwrap(), source);

        let blocks = file.blocks();
        assert_eq!(blocks.first(), Some(&1));
        assert_eq!(filesystem.blocks_used_count(), blocks.len());
    }

    #[test]
    fn replace() {
        let mut filesystem = Filesystem::new();
        let first = project("FIRST", 1, SongBuffer::new());
        let second = project("SECOND", 2, noise(7));

        filesystem.insert_file(Index::new(5), &first).unwrap();
        let used = filesystem.blocks_used_count();

        let old = filesystem.insert_file(Index::new(5), &second).unwrap();
        assert_eq!(old, Some(first.clone()));
        assert!(filesystem.blocks_used_count() > used);
        assert_eq!(filesystem.file(Index::new(5)).unwrap().project().unwrap(), second);

        // Shrinking again frees the blocks it no longer needs
        filesystem.insert_file(Index::new(5), &first).unwrap();
        assert_eq!(filesystem.blocks_used_count(), used);
    }

    #[test]
    fn interleaved() {
        let mut filesystem = Filesystem::new();
        let mut half = noise(1);
        half.as_mut_slice()[0x4000..].fill(0);
        let a = project("A", 0, half);
        let b = project("B", 0, SongBuffer::new());
        let c = project("C", 0, noise(2));

        filesystem.insert_file(Index::new(0), &a).unwrap();
        filesystem.insert_file(Index::new(1), &b).unwrap();
        filesystem.remove_file(Index::new(0)).unwrap().unwrap();

        // C fills the hole A left behind, and continues after B
        filesystem.insert_file(Index::new(2), &c).unwrap();
        let blocks = filesystem.file_blocks(Index::new(2));
        assert!(blocks.windows(2).any(|pair| pair[1] != pair[0] + 1));

        assert_eq!(filesystem.file(Index::new(1)).unwrap().project().unwrap(), b);
        assert_eq!(filesystem.file(Index::new(2)).unwrap().project().unwrap(), c);
    }

    #[test]
    fn remove() {
        let mut filesystem = Filesystem::new();
        let source = project("GONE", 9, SongBuffer::new());
        filesystem.insert_file(Index::new(31), &source).unwrap();

        let removed = filesystem.remove_file(Index::new(31)).unwrap().unwrap();
        assert_eq!(removed, source);

        assert!(filesystem.file(Index::new(31)).is_none());
        assert!(filesystem.remove_file(Index::new(31)).is_none());
        assert!(snapshot(&filesystem) == snapshot(&Filesystem::new()));
    }

    #[test]
    fn capacity() {
        let mut filesystem = Filesystem::new();
        filesystem.insert_file(Index::new(0), &project("A", 0, noise(1))).unwrap();
        filesystem.insert_file(Index::new(1), &project("B", 0, noise(2))).unwrap();

        let before = snapshot(&filesystem);
        assert!(matches!(
            filesystem.insert_file(Index::new(2), &project("C", 0, noise(3))),
            Err(InsertError::Compress(CompressError::NoBlockLeft))
        ));
        assert!(snapshot(&filesystem) == before);

        // Replacing a file may reuse its own blocks
        filesystem.insert_file(Index::new(1), &project("D", 0, noise(4))).unwrap();
        assert_eq!(filesystem.file(Index::new(1)).unwrap().name().to_string_lossy(), "D");
    }

    #[test]
    fn no_song() {
        let mut filesystem = Filesystem::new();
        assert!(matches!(
            filesystem.insert_file(Index::new(0), &Project::new()),
            Err(InsertError::NoSong)
        ));
        assert_eq!(filesystem.blocks_used_count(), 0);
    }

    #[test]
    fn damaged_chain() {
        let mut filesystem = Filesystem::new();
        filesystem
            .insert_file(Index::new(0), &project("BAD", 0, SongBuffer::new()))
            .unwrap();

        // Point the first block back at itself
        filesystem.block_mut(1)[..2].copy_from_slice(&[0xE0, 0x01]);

        assert!(matches!(
            filesystem.file(Index::new(0)).unwrap().decompress(),
            Err(DecompressError::BlockRevisited { block: 1 })
        ));

        assert!(matches!(
            filesystem.insert_file(Index::new(0), &project("NEW", 0, SongBuffer::new())),
            Err(InsertError::Replaced(_))
        ));

        assert!(matches!(
            filesystem.remove_file(Index::new(0)),
            Some(Err(FileToProjectError::Decompress(_)))
        ));
        assert_eq!(filesystem.blocks_used_count(), 0);
    }

    #[test]
    fn odd_name() {
        let mut filesystem = Filesystem::new();
        let source = project("ODD", 3, SongBuffer::new());
        filesystem.insert_file(Index::new(6), &source).unwrap();

        // Other tools happily write lowercase and symbols into the name field
        filesystem
            .file_name_mut(Index::new(6))
            .copy_from_slice(b"od\xFFd\0\0\0\0");

        let file = filesystem.file(Index::new(6)).unwrap();
        assert_eq!(file.name().bytes(), b"od\xFFd\0\0\0\0");
        assert!(!file.name().is_valid());

        let old = filesystem
            .insert_file(Index::new(6), &project("NEW", 4, SongBuffer::new()))
            .unwrap()
            .unwrap();
        assert_eq!(old.name().bytes(), b"od\xFFd\0\0\0\0");
        assert_eq!(old.version(), 3);
        assert_eq!(old.song(), source.song());

        // The raw name survives being moved to another slot
        filesystem.insert_file(Index::new(7), &old).unwrap();
        assert_eq!(
            &snapshot(&filesystem)[Filesystem::name_range(Index::new(7))],
            b"od\xFFd\0\0\0\0"
        );
    }

    #[test]
    fn active_file() {
        let mut filesystem = Filesystem::new();
        filesystem.set_active_file(Some(Index::new(4)));
        assert_eq!(filesystem.active_file(), Some(Index::new(4)));

        filesystem.set_active_file(None);
        assert_eq!(filesystem.active_file(), None);
        assert_eq!(filesystem.bytes[ACTIVE_FILE_INDEX], NO_ACTIVE_FILE);
    }
}
