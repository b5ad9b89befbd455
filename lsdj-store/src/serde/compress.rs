use super::{
    BLOCK_COUNT, BLOCK_LEN, End, is_data_block,
    token::{CONTROL_LEN, MAX_DATA_LEN, RLE_BYTE, Token},
};
use crate::song::{SongBuffer, instrument::DEFAULT_INSTRUMENT, wave::DEFAULT_WAVE};
use log::{debug, trace};
use std::{
    io::{self, Cursor, Write},
    slice,
};
use thiserror::Error;

/// Compress song data from a reader into a single LSDJ block
///
/// This function reads bytes and compresses them as described [here](https://littlesounddj.fandom.com/wiki/File_Management_Structure).
/// Exactly [`BLOCK_LEN`] bytes are written, the last ones being zero padding. The call returns
/// when either:
///
///  * The end of the reader has been reached, which returns [`End::EndOfFile`]
///  * The block is full. `next_block()` is called to retrieve the index of the next block, and [`End::JumpToBlock`] is returned.
pub fn compress_block<W, F>(
    reader: &mut Cursor<&[u8]>,
    mut writer: W,
    next_block: F,
) -> Result<End, CompressError>
where
    W: Write,
    F: FnOnce() -> Option<u8>,
{
    let data: &[u8] = *reader.get_ref();
    let mut written = 0;

    let end = loop {
        let position = reader.position() as usize;
        if position >= data.len() {
            break Token::EndOfFile;
        }

        // Always leave room for a jump command after the next token
        if BLOCK_LEN - written < MAX_DATA_LEN + CONTROL_LEN {
            let next = next_block().ok_or(CompressError::NoBlockLeft)?;
            if !is_data_block(next) {
                return Err(CompressError::InvalidBlock { block: next });
            }

            break Token::JumpToBlock(next);
        }

        let (token, consumed) = next_token(&data[position..]);
        token.write(&mut writer)?;
        written += token.encoded_len();
        reader.set_position((position + consumed) as u64);
    };

    end.write(&mut writer)?;
    written += end.encoded_len();
    writer.write_all(&[0; BLOCK_LEN][written..])?;

    match end {
        Token::JumpToBlock(block) => Ok(End::JumpToBlock(block)),
        _ => Ok(End::EndOfFile),
    }
}

/// Compress a song into a chain of blocks, handing out block indices with a callback
///
/// The first block is `start_block`, each subsequent one is whatever `next_block()` returns.
/// When it returns [`None`], compression fails with [`CompressError::NoBlockLeft`]. The blocks
/// are written to `writer` in chain order.
///
/// Returns the number of blocks written.
pub fn compress_with<W, F>(
    song: &SongBuffer,
    mut writer: W,
    start_block: u8,
    mut next_block: F,
) -> Result<usize, CompressError>
where
    W: Write,
    F: FnMut() -> Option<u8>,
{
    if !is_data_block(start_block) {
        return Err(CompressError::InvalidBlock { block: start_block });
    }

    let mut reader = Cursor::new(song.as_slice());
    let mut block = start_block;
    let mut count = 1;

    while let End::JumpToBlock(next) = compress_block(&mut reader, &mut writer, &mut next_block)? {
        trace!("Block {block} is full, continuing in block {next}");
        block = next;
        count += 1;
    }

    debug!("Compressed song into {count} block(s) starting at block {start_block}");

    Ok(count)
}

/// Compress a song into consecutive blocks
///
/// Blocks are numbered from `start_block` upward, and at most `block_budget` of them are used
/// (never going past [`BLOCK_COUNT`]). A song that does not fit results in
/// [`CompressError::NoBlockLeft`]. Bytes that were written before that happened are not undone.
///
/// Returns the number of blocks written.
pub fn compress<W>(
    song: &SongBuffer,
    writer: W,
    start_block: u8,
    block_budget: usize,
) -> Result<usize, CompressError>
where
    W: Write,
{
    if block_budget == 0 {
        return Err(CompressError::NoBlockLeft);
    }

    let last = (start_block as usize)
        .saturating_add(block_budget - 1)
        .min(BLOCK_COUNT);
    let mut blocks = (start_block as usize + 1..=last).map(|block| block as u8);

    compress_with(song, writer, start_block, || blocks.next())
}

/// Errors that might be returned from [`compress()`], [`compress_with()`] and [`compress_block()`]
#[derive(Debug, Error)]
pub enum CompressError {
    /// Something went wrong writing to I/O
    #[error("Compression failed writing to I/O")]
    Io(#[from] io::Error),

    /// There are no more empty blocks left to continue to
    #[error("Compression ran out of blocks")]
    NoBlockLeft,

    /// Compression was asked to use a block that can't hold song data
    #[error("Block {block} is not a valid data block")]
    InvalidBlock { block: u8 },
}

/// Find the cheapest token for the start of `data`, along with the amount of bytes it covers
fn next_token(data: &[u8]) -> (Token, usize) {
    if let count @ 1.. = count_repeats(data, &DEFAULT_INSTRUMENT) {
        return (
            Token::DefaultInstrument { count },
            count as usize * DEFAULT_INSTRUMENT.len(),
        );
    }

    if let count @ 1.. = count_repeats(data, &DEFAULT_WAVE) {
        return (
            Token::DefaultWave { count },
            count as usize * DEFAULT_WAVE.len(),
        );
    }

    let value = data[0];
    let literal = Token::Literal(value);

    // The RLE byte reads back as an escaped literal, so it can't be run-length encoded
    if value != RLE_BYTE {
        let count = count_repeats(data, slice::from_ref(&value));
        let run = Token::RunLength { value, count };

        if count as usize * literal.encoded_len() > run.encoded_len() {
            return (run, count as usize);
        }
    }

    (literal, 1)
}

/// Count how many times `pattern` is repeated at the start of `data`, up to 255
fn count_repeats(data: &[u8], pattern: &[u8]) -> u8 {
    data.chunks_exact(pattern.len())
        .take_while(|chunk| *chunk == pattern)
        .take(u8::MAX as usize)
        .count() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument_then(tail: &[u8]) -> Vec<u8> {
        let mut bytes = DEFAULT_INSTRUMENT.repeat(2);
        bytes.extend_from_slice(tail);
        bytes
    }

    #[test]
    fn repeats() {
        assert_eq!(count_repeats(&[5, 5, 5, 5, 6], &[5, 5]), 2);
        assert_eq!(count_repeats(&[5, 5, 5, 5, 6], &[5]), 4);
        assert_eq!(count_repeats(&[6, 5], &[5]), 0);
        assert_eq!(count_repeats(&[0; 300], &[0]), 255);
    }

    #[test]
    fn cmd_literal() {
        assert_eq!(next_token(&[0xE0, 0x01]), (Token::Literal(0xE0), 1));
    }

    #[test]
    fn cmd_run() {
        // Two escaped literals (4 bytes) are more expensive than one run (3 bytes)
        assert_eq!(
            next_token(&[0xE0, 0xE0, 0x01]),
            (Token::RunLength { value: 0xE0, count: 2 }, 2)
        );
    }

    #[test]
    fn rle_literal() {
        assert_eq!(next_token(&[0xC0, 0xC0, 0xC0, 0xC0]), (Token::Literal(0xC0), 1));
    }

    #[test]
    fn rle() {
        assert_eq!(
            next_token(&[4, 4, 4, 4, 4, 4, 4]),
            (Token::RunLength { value: 4, count: 7 }, 7)
        );
    }

    #[test]
    fn short_run() {
        // Three literals cost as much as a run, so the literal wins
        assert_eq!(next_token(&[4, 4, 4, 9]), (Token::Literal(4), 1));
    }

    #[test]
    fn value() {
        assert_eq!(next_token(&[4, 9]), (Token::Literal(4), 1));
    }

    #[test]
    fn default_instrument() {
        assert_eq!(
            next_token(&instrument_then(&[0xA8, 0x00])),
            (Token::DefaultInstrument { count: 2 }, 32)
        );
    }

    #[test]
    fn default_wave() {
        let mut bytes = DEFAULT_WAVE.repeat(2);
        bytes.extend_from_slice(&DEFAULT_WAVE[..15]);

        assert_eq!(next_token(&bytes), (Token::DefaultWave { count: 2 }, 32));
    }

    #[test]
    fn block_eof() {
        let source = [4, 4, 4, 4, 9];
        let mut reader = Cursor::new(source.as_slice());

        let mut dest = Vec::new();
        let end = compress_block(&mut reader, &mut dest, || Some(2)).unwrap();

        assert_eq!(end, End::EndOfFile);
        assert_eq!(dest.len(), BLOCK_LEN);
        assert_eq!(dest[..6], [0xC0, 4, 4, 9, 0xE0, 0xFF]);
        assert!(dest[6..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn block_jump() {
        let source: Vec<u8> = (0..600).map(|index| (index % 0xBF) as u8 + 1).collect();
        let mut reader = Cursor::new(source.as_slice());

        let mut dest = Vec::new();
        let end = compress_block(&mut reader, &mut dest, || Some(9)).unwrap();

        assert_eq!(end, End::JumpToBlock(9));
        assert_eq!(reader.position(), 508);
        assert_eq!(dest[..508], source[..508]);
        assert_eq!(dest[508..], [0xE0, 9, 0, 0]);

        let end = compress_block(&mut reader, &mut dest, || None).unwrap();
        assert_eq!(end, End::EndOfFile);
        assert_eq!(dest.len(), 2 * BLOCK_LEN);
    }

    #[test]
    fn no_block_left() {
        let source: Vec<u8> = (0..600).map(|index| (index % 0xBF) as u8 + 1).collect();

        let mut reader = Cursor::new(source.as_slice());
        assert!(matches!(
            compress_block(&mut reader, Vec::new(), || None),
            Err(CompressError::NoBlockLeft)
        ));
    }

    #[test]
    fn invalid_blocks() {
        let song = SongBuffer::new();

        assert!(matches!(
            compress(&song, Vec::new(), 0, BLOCK_COUNT),
            Err(CompressError::InvalidBlock { block: 0 })
        ));

        assert!(matches!(
            compress(&song, Vec::new(), 1, 0),
            Err(CompressError::NoBlockLeft)
        ));
    }

    #[test]
    fn budget_is_capped_at_block_count() {
        let mut song = SongBuffer::zeroed();
        for (index, byte) in song.as_mut_slice()[..0x1000].iter_mut().enumerate() {
            *byte = (index % 0xBF) as u8 + 1;
        }

        // Starting at the very last block leaves no room to continue
        assert!(matches!(
            compress(&song, Vec::new(), BLOCK_COUNT as u8, usize::MAX),
            Err(CompressError::NoBlockLeft)
        ));
    }
}
