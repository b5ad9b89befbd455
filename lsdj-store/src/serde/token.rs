use super::{BLOCK_COUNT, DecompressError};
use crate::song::{instrument::DEFAULT_INSTRUMENT, wave::DEFAULT_WAVE};
use std::{
    io::{self, Read, Write},
    slice,
};

pub const RLE_BYTE: u8 = 0xC0;
pub const CMD_BYTE: u8 = 0xE0;
pub const DEFAULT_WAVE_BYTE: u8 = 0xF0;
pub const DEFAULT_INSTRUMENT_BYTE: u8 = 0xF1;
pub const EOF_BYTE: u8 = 0xFF;

/// The longest a data token can get when encoded
pub const MAX_DATA_LEN: usize = 3;

/// The length of a jump or end-of-file command
pub const CONTROL_LEN: usize = 2;

/// A single unit of the compressed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A single byte, escaped if it collides with [`RLE_BYTE`] or [`CMD_BYTE`]
    Literal(u8),

    /// `count` repetitions of `value`
    ///
    /// [`RLE_BYTE`] itself can't be run-length encoded, it reads back as an escaped literal.
    RunLength { value: u8, count: u8 },

    /// `count` repetitions of the default instrument
    DefaultInstrument { count: u8 },

    /// `count` repetitions of the default wave
    DefaultWave { count: u8 },

    /// Continue reading at another block
    JumpToBlock(u8),

    /// The end of the stream
    EndOfFile,
}

impl Token {
    /// Parse the next token from the compressed stream
    pub fn read<R>(mut reader: R) -> Result<Self, DecompressError>
    where
        R: Read,
    {
        match read_byte(&mut reader)? {
            RLE_BYTE => match read_byte(&mut reader)? {
                RLE_BYTE => Ok(Self::Literal(RLE_BYTE)),
                value => Ok(Self::RunLength {
                    value,
                    count: read_byte(reader)?,
                }),
            },
            CMD_BYTE => match read_byte(&mut reader)? {
                CMD_BYTE => Ok(Self::Literal(CMD_BYTE)),
                DEFAULT_WAVE_BYTE => Ok(Self::DefaultWave {
                    count: read_byte(reader)?,
                }),
                DEFAULT_INSTRUMENT_BYTE => Ok(Self::DefaultInstrument {
                    count: read_byte(reader)?,
                }),
                EOF_BYTE => Ok(Self::EndOfFile),
                0 => Err(DecompressError::InvalidBlock { block: 0 }),
                block if block as usize <= BLOCK_COUNT => Ok(Self::JumpToBlock(block)),
                byte => Err(DecompressError::UnknownCommand { byte }),
            },
            value => Ok(Self::Literal(value)),
        }
    }

    /// Serialize the token to its compressed form
    pub fn write<W>(self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        match self {
            Self::Literal(RLE_BYTE) => writer.write_all(&[RLE_BYTE, RLE_BYTE]),
            Self::Literal(CMD_BYTE) => writer.write_all(&[CMD_BYTE, CMD_BYTE]),
            Self::Literal(value) => writer.write_all(&[value]),
            Self::RunLength { value, count } => {
                debug_assert_ne!(value, RLE_BYTE);
                writer.write_all(&[RLE_BYTE, value, count])
            }
            Self::DefaultInstrument { count } => {
                writer.write_all(&[CMD_BYTE, DEFAULT_INSTRUMENT_BYTE, count])
            }
            Self::DefaultWave { count } => writer.write_all(&[CMD_BYTE, DEFAULT_WAVE_BYTE, count]),
            Self::JumpToBlock(block) => writer.write_all(&[CMD_BYTE, block]),
            Self::EndOfFile => writer.write_all(&[CMD_BYTE, EOF_BYTE]),
        }
    }

    /// Write the decompressed bytes this token stands for
    ///
    /// Control tokens don't represent any data, and write nothing.
    pub fn expand<W>(self, writer: W) -> io::Result<()>
    where
        W: Write,
    {
        match self {
            Self::Literal(value) => write_repeated(slice::from_ref(&value), 1, writer),
            Self::RunLength { value, count } => {
                write_repeated(slice::from_ref(&value), count as usize, writer)
            }
            Self::DefaultInstrument { count } => {
                write_repeated(&DEFAULT_INSTRUMENT, count as usize, writer)
            }
            Self::DefaultWave { count } => write_repeated(&DEFAULT_WAVE, count as usize, writer),
            Self::JumpToBlock(_) | Self::EndOfFile => Ok(()),
        }
    }

    /// The number of bytes the token takes up in the compressed stream
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Literal(RLE_BYTE | CMD_BYTE) => 2,
            Self::Literal(_) => 1,
            Self::RunLength { .. } | Self::DefaultInstrument { .. } | Self::DefaultWave { .. } => 3,
            Self::JumpToBlock(_) | Self::EndOfFile => CONTROL_LEN,
        }
    }
}

fn read_byte<R>(mut reader: R) -> io::Result<u8>
where
    R: Read,
{
    let mut byte = 0;
    reader.read_exact(slice::from_mut(&mut byte))?;
    Ok(byte)
}

fn write_repeated<W>(bytes: &[u8], count: usize, mut writer: W) -> io::Result<()>
where
    W: Write,
{
    for _ in 0..count {
        writer.write_all(bytes)?
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn expand<const N: usize>(token: Token) -> [u8; N] {
        let mut plain = [0_u8; N];
        token.expand(Cursor::new(plain.as_mut_slice())).unwrap();
        plain
    }

    #[test]
    fn rle() {
        let token = Token::read(Cursor::new([RLE_BYTE, 0x11, 4])).unwrap();
        assert_eq!(token, Token::RunLength { value: 0x11, count: 4 });
        assert_eq!(expand(token), [0x11, 0x11, 0x11, 0x11]);
    }

    #[test]
    fn rle_literal() {
        let token = Token::read(Cursor::new([RLE_BYTE, RLE_BYTE])).unwrap();
        assert_eq!(token, Token::Literal(0xC0));
        assert_eq!(expand(token), [0xC0]);
    }

    #[test]
    fn cmd_literal() {
        let token = Token::read(Cursor::new([CMD_BYTE, CMD_BYTE])).unwrap();
        assert_eq!(token, Token::Literal(0xE0));
        assert_eq!(expand(token), [0xE0]);
    }

    #[test]
    fn default_wave() {
        let token = Token::read(Cursor::new([CMD_BYTE, DEFAULT_WAVE_BYTE, 2])).unwrap();
        assert_eq!(token, Token::DefaultWave { count: 2 });
        assert_eq!(
            expand(token),
            [
                0x8E, 0xCD, 0xCC, 0xBB, 0xAA, 0xA9, 0x99, 0x88, 0x87, 0x76, 0x66, 0x55, 0x54, 0x43,
                0x32, 0x31, 0x8E, 0xCD, 0xCC, 0xBB, 0xAA, 0xA9, 0x99, 0x88, 0x87, 0x76, 0x66, 0x55,
                0x54, 0x43, 0x32, 0x31
            ]
        );
    }

    #[test]
    fn default_instrument() {
        let token = Token::read(Cursor::new([CMD_BYTE, DEFAULT_INSTRUMENT_BYTE, 2])).unwrap();
        assert_eq!(token, Token::DefaultInstrument { count: 2 });
        assert_eq!(
            expand(token),
            [
                0xA8, 0x0, 0x0, 0xFF, 0x0, 0x0, 0x3, 0x0, 0x0, 0xD0, 0x0, 0x0, 0x0, 0xF3, 0x0, 0x0,
                0xA8, 0x0, 0x0, 0xFF, 0x0, 0x0, 0x3, 0x0, 0x0, 0xD0, 0x0, 0x0, 0x0, 0xF3, 0x0, 0x0,
            ]
        );
    }

    #[test]
    fn block_jump() {
        assert_eq!(
            Token::read(Cursor::new([CMD_BYTE, 4])).unwrap(),
            Token::JumpToBlock(4)
        );
        assert_eq!(
            Token::read(Cursor::new([CMD_BYTE, 191])).unwrap(),
            Token::JumpToBlock(191)
        );
    }

    #[test]
    fn eof() {
        assert_eq!(
            Token::read(Cursor::new([CMD_BYTE, EOF_BYTE])).unwrap(),
            Token::EndOfFile
        );
    }

    #[test]
    fn invalid_commands() {
        assert!(matches!(
            Token::read(Cursor::new([CMD_BYTE, 0])),
            Err(DecompressError::InvalidBlock { block: 0 })
        ));

        assert!(matches!(
            Token::read(Cursor::new([CMD_BYTE, 0xC0])),
            Err(DecompressError::UnknownCommand { byte: 0xC0 })
        ));

        assert!(matches!(
            Token::read(Cursor::new([CMD_BYTE, 0xF2])),
            Err(DecompressError::UnknownCommand { byte: 0xF2 })
        ));
    }

    #[test]
    fn short_read() {
        assert!(matches!(
            Token::read(Cursor::new([RLE_BYTE, 0x11])),
            Err(DecompressError::Io(_))
        ));
    }

    #[test]
    fn write() {
        let tokens = [
            (Token::Literal(0x04), vec![0x04]),
            (Token::Literal(RLE_BYTE), vec![0xC0, 0xC0]),
            (Token::Literal(CMD_BYTE), vec![0xE0, 0xE0]),
            (Token::RunLength { value: 4, count: 7 }, vec![0xC0, 0x04, 0x07]),
            (Token::DefaultInstrument { count: 2 }, vec![0xE0, 0xF1, 0x02]),
            (Token::DefaultWave { count: 2 }, vec![0xE0, 0xF0, 0x02]),
            (Token::JumpToBlock(9), vec![0xE0, 0x09]),
            (Token::EndOfFile, vec![0xE0, 0xFF]),
        ];

        for (token, expected) in tokens {
            let mut dest = Vec::new();
            token.write(&mut dest).unwrap();
            assert_eq!(dest, expected);
            assert_eq!(token.encoded_len(), expected.len());
        }
    }
}
