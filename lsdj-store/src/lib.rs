//! Storage of LittleSoundDJ songs
//!
//! LSDJ keeps the song you're working on uncompressed, and every other project compressed in a
//! pool of blocks that lives in the same save (see [`sram`] and [`fs`]). Single projects travel
//! between saves as `.lsdsng` files (see [`lsdsng`]). This crate reads and writes all of those,
//! on top of the block compression algorithm in [`serde`].
//!
//! It doesn't interpret the contents of songs. A [`SongBuffer`](song::SongBuffer) is just bytes.

pub mod fs;
pub mod lsdsng;
pub mod name;
pub mod project;
pub mod serde;
pub mod song;
pub mod sram;

pub use ux::u5;
