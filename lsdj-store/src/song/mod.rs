//! Uncompressed LSDJ song data

pub(crate) mod instrument;
pub(crate) mod wave;

mod song_buffer;

pub use song_buffer::{FromBytesError, SongBuffer};
