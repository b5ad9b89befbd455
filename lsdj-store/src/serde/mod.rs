//! Implementation of the [LSDJ compression algorithm](https://littlesounddj.fandom.com/wiki/File_Management_Structure)
//!
//! Songs are stored compressed in blocks of [`BLOCK_LEN`] bytes. A compressed song rarely fits a
//! single block, so the end of every block holds a command that either names the block the stream
//! continues in, or marks the end of the song. Blocks of one song don't have to be contiguous.

mod compress;
mod decompress;
mod token;

pub use compress::{CompressError, compress, compress_block, compress_with};
pub use decompress::{DecompressError, decompress, decompress_block, decompress_sequential};

/// The length in bytes of a compression block
pub const BLOCK_LEN: usize = 0x200;

/// The number of blocks available for song data
///
/// Block 0 of the save filesystem holds the file table, so data blocks are numbered
/// `1..=BLOCK_COUNT`.
pub const BLOCK_COUNT: usize = 191;

/// The block every single-song file starts at
pub const FIRST_BLOCK: u8 = 1;

/// The byte used for the part of a song that the stream ended before reaching
pub const DEFAULT_FILL: u8 = 0x00;

/// Is this a block index song data can live in?
pub fn is_data_block(block: u8) -> bool {
    (1..=BLOCK_COUNT).contains(&(block as usize))
}

/// The result of block compression/decompression
///
/// See [`compress_block`] and [`decompress_block`] for more information on when this is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    /// A block-jump command has been written/read
    JumpToBlock(u8),

    /// An EOF command has been written/read
    EndOfFile,
}
