//! # LSDJ Store Tools
//!
//! [LittleSoundDj](https://www.littlesounddj.com/lsd/index.php), or _LSDJ_ for short, is music tracker software for the original [Nintendo Game Boy](https://en.wikipedia.org/wiki/Game_Boy).
//!
//! LSDJ keeps its projects in a filesystem inside the save. You need tools to get individual projects out for back-ups, or to build new saves from exported ones. This crate provides a command-line utility that does exactly that. Set `RUST_LOG=debug` for a look at what happens under the hood.
//!
//! ## Inspect
//!
//! ```console
//! USAGE:
//!     lsdj-store inspect [OPTIONS] <PATH>...
//!
//! ARGS:
//!     <PATH>...    The path(s) to inspect
//!
//! OPTIONS:
//!     -b, --blocks     List the blocks every song occupies
//!     -h, --help       Print help information
//!     -V, --version    Print version information
//! ```
//!
//! ### Example
//!
//! ```console
//! > lsdj-store inspect bangers.sav
//! bangers.sav                     Mem 31/191    [===                     ]
//!   0*| YOKAI    | v027 | f022 |  11 blocks
//!   1 | ASPHALT  | v019 | f022 |  10 blocks
//!   2 | NEWSHOES | v014 | f022 |  10 blocks
//! ```
//!
//! ## Export
//!
//! ```console
//! USAGE:
//!     lsdj-store export [OPTIONS] <PATH> [INDEX]...
//!
//! ARGS:
//!     <PATH>        The path to the save file to export from
//!     <INDEX>...    Indices of the songs that should be exported. No indices means all songs
//!
//! OPTIONS:
//!     -d, --decimal            Use decimal version numbers, instead of hexadecimal
//!     -h, --help               Print help information
//!     -o, --output <OUTPUT>    The destination folder to place the songs
//!     -p, --output-pos         Prepend the song position to the start of the filename
//!     -v, --output-version     Append the song version to the end of the filename
//!     -V, --version            Print version information
//! ```
//!
//! ### Example
//!
//! ```console
//! > lsdj-store export -pv bangers.sav
//! 00. YOKAI    => 00_YOKAI_v1B.lsdsng
//! 01. ASPHALT  => 01_ASPHALT_v13.lsdsng
//! 02. NEWSHOES => 02_NEWSHOES_v0E.lsdsng
//! ```
//!
//! ## Import
//!
//! ```console
//! USAGE:
//!     lsdj-store import --output <OUTPUT> <SONG>...
//!
//! ARGS:
//!     <SONG>...    Paths to the songs that should be imported into a save
//!
//! OPTIONS:
//!     -h, --help               Print help information
//!     -o, --output <OUTPUT>    The output path
//!     -V, --version            Print version information
//! ```
//!
//! ### Example
//!
//! ```console
//! > lsdj-store import banger1.lsdsng banger2.lsdsng -o ./test.sav
//! 00 => banger1.lsdsng
//! 01 => banger2.lsdsng
//! Wrote ./test.sav
//! ```

pub mod export;
pub mod import;
pub mod inspect;
pub(crate) mod utils;
