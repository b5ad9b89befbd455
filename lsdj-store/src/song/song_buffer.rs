use std::io::{self, Read, Write};
use thiserror::Error;

const CHECK_VALUE: [u8; 2] = [0x72, 0x62]; // "rb"
const CHECK_OFFSETS: [usize; 3] = [0x1E78, 0x3E80, 0x7FF0];
const FORMAT_VERSION_OFFSET: usize = 0x7FFF;

/// A contiguous block of memory that represents unparsed song data
///
/// This is the decompressed form of a song, the way LSDJ keeps it in working memory. The
/// compression algorithm in [`serde`](crate::serde) turns it into blocks and back, and
/// doesn't care about what the bytes mean. Interpreting them (phrases, instruments, etc.)
/// is left to other code.
///
/// A [`SongBuffer`] is a plain value: whoever holds it owns it, and passing it along moves it.
#[derive(Clone, PartialEq, Eq)]
pub struct SongBuffer {
    /// The bytes that make up the song
    bytes: [u8; Self::LEN],
}

impl SongBuffer {
    /// The number of bytes taken up by a single LSDJ song
    pub const LEN: usize = 0x8000;

    /// Initialize a new song, creating a buffer containing necessary verification bytes.
    pub fn new() -> Self {
        let bytes = Self::make_empty_song();
        Self { bytes }
    }

    /// A song where every byte is zero
    ///
    /// This is _not_ a song LSDJ will accept, but useful as a scratch buffer.
    pub fn zeroed() -> Self {
        Self {
            bytes: [0; Self::LEN],
        }
    }

    /// Construct the bytes of a new, empty song, ready for use
    ///
    /// This sets all the necessary verification bytes that LSDJ uses to check for memory corruption.
    pub fn make_empty_song() -> [u8; Self::LEN] {
        let mut bytes = [0; Self::LEN];
        bytes[0x0ff0..0x1000].fill(0xFF);
        for i in (0x1090..0x1290).step_by(16) {
            bytes[i..i + 2].fill(0x06);
        }
        bytes[0x1290..0x1690].fill(0xFF);
        let mut loops = 0;
        for i in (0x1dd0..0x1df9).step_by(6) {
            bytes[i..i + 6].copy_from_slice(&[0x57, 0x2d, 0x30 + loops, 0x57, 0x2d, 0x31 + loops]);
            loops += 2;
            if loops == 10 {
                loops += 7;
            }
        }
        bytes[0x1e78..0x1e7a].copy_from_slice(&CHECK_VALUE);
        bytes[0x2080..0x2880].fill(0xFF);
        bytes[0x3e80..0x3e82].copy_from_slice(&CHECK_VALUE);
        for i in (0x3eb0..0x3fb0).step_by(16) {
            bytes[i + 7] = 0x10;
            bytes[i + 8] = 0xff;
            bytes[i + 11] = 0x10;
            bytes[i + 12] = 0xff;
        }
        bytes[0x3fb4] = 0x80;
        bytes[0x3fba..0x3fbc].copy_from_slice(&[0x07, 0x02]);
        bytes[0x3fc0..0x3fc4].copy_from_slice(&[0x00, 0x20, 0x00, 0x01]);
        bytes[0x3fc6..0x3fca].fill(0xFF);
        for i in (0x6000..0x7000).step_by(16) {
            bytes[i..i + 16].copy_from_slice(&[
                0x71, 0x32, 0x33, 0x44, 0x45, 0x55, 0x66, 0x77, 0x78, 0x89, 0x99, 0xaa, 0xab, 0xbc,
                0xcd, 0xce,
            ]);
        }
        bytes[0x7000..0x7ff0].fill(0xFF);
        bytes[0x7ff0..0x7ff2].copy_from_slice(&CHECK_VALUE);
        bytes[FORMAT_VERSION_OFFSET] = 0x16;
        bytes
    }

    /// Deserialize [`SongBuffer`] from an arbitrary I/O reader
    ///
    /// Exactly [`SongBuffer::LEN`] bytes are read. No verification is done on their contents.
    pub fn from_reader<R>(mut reader: R) -> Result<Self, io::Error>
    where
        R: Read,
    {
        let mut bytes = [0; Self::LEN];
        reader.read_exact(bytes.as_mut_slice())?;

        Ok(Self { bytes })
    }

    /// Serialize [`SongBuffer`] to an arbitrary I/O writer
    pub fn to_writer<W>(&self, mut writer: W) -> Result<(), io::Error>
    where
        W: Write,
    {
        writer.write_all(&self.bytes)
    }

    /// The version of the format the song is encoded in
    pub fn format_version(&self) -> u8 {
        self.bytes[FORMAT_VERSION_OFFSET]
    }

    /// Does the song contain the bytes LSDJ uses to check for memory corruption?
    pub fn has_verification_bytes(&self) -> bool {
        CHECK_OFFSETS
            .iter()
            .all(|offset| self.bytes[*offset..*offset + 2] == CHECK_VALUE)
    }

    /// Access the bytes that make up the song
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Access the bytes that make up the song
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Deserialize [`SongBuffer`] from bytes
impl TryFrom<&[u8]> for SongBuffer {
    type Error = FromBytesError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Self::LEN] = value
            .try_into()
            .map_err(|_| FromBytesError::IncorrectSize { len: value.len() })?;

        Ok(Self { bytes })
    }
}

impl Default for SongBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SongBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SongBuffer")
            .field("format_version", &self.format_version())
            .finish_non_exhaustive()
    }
}

/// Errors that might be returned from [`SongBuffer::try_from()`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FromBytesError {
    /// The passed in number of bytes isn't correct
    #[error("A song takes up {} bytes, not {len}", SongBuffer::LEN)]
    IncorrectSize { len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_song() {
        let song = SongBuffer::new();
        assert_eq!(song.format_version(), 0x16);
        assert!(song.has_verification_bytes());
        assert!(!SongBuffer::zeroed().has_verification_bytes());
    }

    #[test]
    fn io() {
        let song = SongBuffer::new();

        let mut bytes = Vec::new();
        song.to_writer(&mut bytes).unwrap();
        assert_eq!(bytes.len(), SongBuffer::LEN);

        assert_eq!(SongBuffer::from_reader(Cursor::new(&bytes)).unwrap(), song);
        assert!(SongBuffer::from_reader(Cursor::new(&bytes[1..])).is_err());
    }

    #[test]
    fn try_from() {
        let bytes = SongBuffer::make_empty_song();
        assert_eq!(SongBuffer::try_from(bytes.as_slice()), Ok(SongBuffer::new()));

        assert_eq!(
            SongBuffer::try_from(&bytes[..10]),
            Err(FromBytesError::IncorrectSize { len: 10 })
        );
    }
}
