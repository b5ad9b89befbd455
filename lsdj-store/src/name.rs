//! Fixed-width project names
use std::{borrow::Cow, fmt, str::FromStr};
use thiserror::Error;

/// A fixed-width, zero padded string
///
/// Projects (and other LSDJ structures) carry a name in a field of `N` bytes. Shorter names are
/// padded with zeroes, a name that fills the whole field has no terminator at all. When reading,
/// everything from the first zero byte onward is ignored.
///
/// LSDJ itself only lets you type (ASCII) `A-Z`, `0-9`, space and `x`, which it draws as a
/// lightning bolt. Names built from text ([`Name::from_bytes()`], [`FromStr`]) are held to that
/// set. Name fields read from disk go through [`Name::from_raw_bytes()`] instead, which keeps
/// whatever bytes other tools put there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Name<N> {
    const LIGHTNING_BOLT: u8 = b'x';

    /// Parse a name from the contents of a name field
    ///
    /// Reading stops at the first zero byte. Spaces are kept as-is, also at the end, so that a
    /// space padded field reads back the way it was written.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FromBytesError> {
        let len = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
        if len > N {
            return Err(FromBytesError::TooLong { len });
        }

        if let Some(index) = bytes[..len]
            .iter()
            .position(|byte| !Self::is_byte_allowed(*byte))
        {
            return Err(FromBytesError::InvalidByte {
                byte: bytes[index],
                index,
            });
        }

        let mut padded = [0; N];
        padded[..len].copy_from_slice(&bytes[..len]);

        Ok(Self { bytes: padded })
    }

    /// Take a name field as it is stored, without checking its characters
    ///
    /// Everything from the first zero byte onward is cleared, so the padding is always zeroes.
    pub fn from_raw_bytes(mut bytes: [u8; N]) -> Self {
        if let Some(len) = bytes.iter().position(|byte| *byte == 0) {
            bytes[len..].fill(0);
        }

        Self { bytes }
    }

    /// The entire name field, including its zero padding
    pub fn bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// The width of the name field
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The number of characters before the padding starts
    pub fn len(&self) -> usize {
        self.bytes.iter().position(|c| *c == 0).unwrap_or(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The characters of the name, without padding
    ///
    /// Bytes that aren't valid UTF-8 are replaced with `U+FFFD`.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes[..self.len()])
    }

    /// Does the name only contain characters LSDJ can display?
    pub fn is_valid(&self) -> bool {
        self.bytes[..self.len()]
            .iter()
            .all(|byte| Self::is_byte_allowed(*byte))
    }

    /// Can this byte be part of a name?
    pub fn is_byte_allowed(byte: u8) -> bool {
        byte.is_ascii_uppercase()
            || byte.is_ascii_digit()
            || byte == b' '
            || byte == Self::LIGHTNING_BOLT
    }
}

impl<const N: usize> Default for Name<N> {
    fn default() -> Self {
        Self { bytes: [0; N] }
    }
}

impl<const N: usize> fmt::Display for Name<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl<'a, const N: usize> TryFrom<&'a [u8]> for Name<N> {
    type Error = FromBytesError;

    #[inline]
    fn try_from(bytes: &'a [u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl<'a, const N: usize> TryFrom<&'a str> for Name<N> {
    type Error = FromBytesError;

    #[inline]
    fn try_from(str: &'a str) -> Result<Self, Self::Error> {
        Self::from_bytes(str.as_bytes())
    }
}

impl<const N: usize> FromStr for Name<N> {
    type Err = FromBytesError;

    #[inline]
    fn from_str(str: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(str.as_bytes())
    }
}

/// Errors that might be returned from [`Name::from_bytes()`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FromBytesError {
    /// There are more characters than fit in the name field
    #[error("A name of {len} characters does not fit the name field")]
    TooLong { len: usize },

    /// A character was found that LSDJ can't display in names
    #[error("Byte {byte:#04X} at position {index} is not allowed in a name")]
    InvalidByte { byte: u8, index: usize },
}
