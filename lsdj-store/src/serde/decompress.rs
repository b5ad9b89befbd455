use super::{BLOCK_LEN, DEFAULT_FILL, End, FIRST_BLOCK, is_data_block, token::Token};
use crate::song::SongBuffer;
use log::{debug, trace};
use std::{
    collections::HashSet,
    io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write},
};
use thiserror::Error;

/// Decompress data from an LSDJ block reader to an arbitrary I/O writer
///
/// This function reads bytes and decompresses them as described [here](https://littlesounddj.fandom.com/wiki/File_Management_Structure). The call
/// returns when either:
///
///  * An EOF command has been read, ending the decompression algorithm. This returns [`End::EndOfFile`]
///  * A block jump command has been read, returning [`End::JumpToBlock`]
pub fn decompress_block<R, W>(mut reader: R, mut writer: W) -> Result<End, DecompressError>
where
    R: Read,
    W: Write,
{
    loop {
        match Token::read(&mut reader)? {
            Token::JumpToBlock(block) => return Ok(End::JumpToBlock(block)),
            Token::EndOfFile => return Ok(End::EndOfFile),
            token => token
                .expand(&mut writer)
                .map_err(DecompressError::from_write)?,
        }
    }
}

/// Decompress a chain of blocks into a [`SongBuffer`]
///
/// The reader should be positioned at the first byte of `start_block`. Every block jump is
/// followed by seeking relative to that position, so this works on an entire
/// [`Filesystem`](crate::fs::Filesystem) as well as on any stream that starts at `start_block`.
///
/// Should the stream end before the song is complete, the rest of the song is filled with
/// [`DEFAULT_FILL`](super::DEFAULT_FILL).
pub fn decompress<R>(mut reader: R, start_block: u8) -> Result<SongBuffer, DecompressError>
where
    R: Read + Seek,
{
    if !is_data_block(start_block) {
        return Err(DecompressError::InvalidBlock { block: start_block });
    }

    let start = reader.stream_position()?;

    let (song, _) = decompress_chain(
        &mut reader,
        start_block,
        HashSet::from([start_block]),
        |reader, block, next, _| {
            let offset = (next as i64 - start_block as i64) * BLOCK_LEN as i64;
            let position = start
                .checked_add_signed(offset)
                .ok_or(DecompressError::InvalidBlock { block: next })?;

            trace!("Jumping from block {block} to block {next} (offset {position:#X})");
            reader.seek(SeekFrom::Start(position))?;

            Ok(next)
        },
    )?;

    Ok(song)
}

/// Decompress blocks stored back-to-back into a [`SongBuffer`], ignoring where they jump to
///
/// `.lsdsng` files store the blocks of a song one after the other, but keep the jump values
/// they had in the save they were exported from. Those values are still checked: they have to
/// be valid data blocks, and no block may be jumped to twice. The reader only has to be
/// [`Read`], and is left at the end of the last block.
pub fn decompress_sequential<R>(mut reader: R) -> Result<SongBuffer, DecompressError>
where
    R: Read,
{
    let (song, rest) = decompress_chain(
        &mut reader,
        FIRST_BLOCK,
        HashSet::new(),
        |reader, block, next, rest| {
            skip(reader, rest)?;

            trace!("Block {block} jumps to block {next}, continuing with the next stored block");
            block
                .checked_add(1)
                .ok_or(DecompressError::InvalidBlock { block: next })
        },
    )?;

    skip(&mut reader, rest)?;
    Ok(song)
}

/// Read past the padding that follows a control token
fn skip<R>(reader: &mut R, len: u64) -> Result<(), DecompressError>
where
    R: Read,
{
    let skipped = io::copy(&mut reader.take(len), &mut io::sink())?;
    if skipped < len {
        return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
    }

    Ok(())
}

/// Decompress blocks until an EOF command, letting `advance` move the reader after every jump
///
/// `advance` receives the block just read, the block it jumps to and the number of bytes left
/// in it. It returns the block the reader now points at. Next to the song, this returns the
/// number of bytes left in the block holding the EOF command.
fn decompress_chain<R, F>(
    reader: &mut R,
    start_block: u8,
    mut visited: HashSet<u8>,
    mut advance: F,
) -> Result<(SongBuffer, u64), DecompressError>
where
    R: Read,
    F: FnMut(&mut R, u8, u8, u64) -> Result<u8, DecompressError>,
{
    let mut song = SongBuffer::zeroed();
    let mut writer = Cursor::new(song.as_mut_slice());

    let mut block = start_block;
    let mut count = 1;

    let rest = loop {
        let mut limited = (&mut *reader).take(BLOCK_LEN as u64);

        let end = match decompress_block(&mut limited, &mut writer) {
            Err(DecompressError::Io(error))
                if error.kind() == ErrorKind::UnexpectedEof && limited.limit() == 0 =>
            {
                return Err(DecompressError::UnterminatedBlock { block });
            }
            result => result?,
        };
        let rest = limited.limit();

        let next = match end {
            End::EndOfFile => break rest,
            End::JumpToBlock(next) => next,
        };

        if !visited.insert(next) {
            return Err(DecompressError::BlockRevisited { block: next });
        }

        block = advance(reader, block, next, rest)?;
        count += 1;
    };

    let written = writer.position() as usize;
    song.as_mut_slice()[written..].fill(DEFAULT_FILL);

    debug!(
        "Decompressed {count} block(s) starting at block {start_block} into {written:#X} bytes"
    );

    Ok((song, rest))
}

/// Errors that might be returned from [`decompress()`], [`decompress_sequential()`] and
/// [`decompress_block()`]
#[derive(Debug, Error)]
pub enum DecompressError {
    /// Reading the compressed stream (or writing the decompressed one) failed
    #[error("Decompression failed on I/O")]
    Io(#[from] io::Error),

    /// A block jump pointed at a block that can't hold song data
    #[error("Block {block} is not a valid data block")]
    InvalidBlock { block: u8 },

    /// A command byte was found that isn't part of the format
    #[error("Unknown command byte {byte:#04X} in the compressed stream")]
    UnknownCommand { byte: u8 },

    /// A block jump pointed at a block that was already decompressed, which would loop forever
    #[error("Block {block} was visited twice, the block chain is circular")]
    BlockRevisited { block: u8 },

    /// A block was read in its entirety without finding a jump or EOF command
    #[error("Block {block} does not end in a block jump or EOF command")]
    UnterminatedBlock { block: u8 },

    /// The compressed stream decompresses to more bytes than fit in a song
    #[error("The decompressed data does not fit in a song")]
    ImageOverflow,
}

impl DecompressError {
    fn from_write(error: io::Error) -> Self {
        if error.kind() == ErrorKind::WriteZero {
            Self::ImageOverflow
        } else {
            Self::Io(error)
        }
    }
}
