//! A named, versioned song

use crate::{name::Name, song::SongBuffer};
use std::mem::replace;

/// A [`Name`], version and (optionally) the [`SongBuffer`] belonging to them
///
/// Projects are what LSDJ artists think of as "songs". Every slot in a save's
/// [`Filesystem`](crate::fs::Filesystem) holds one, and the `.lsdsng` format (see
/// [`lsdsng`](crate::lsdsng)) stores exactly one on disk.
///
/// A project either has a song or is an empty slot. The song is owned, so cloning a project
/// clones its song, and dropping it releases the song as well.
///
/// ```
/// # use lsdj_store::{project::Project, song::SongBuffer};
/// let mut project = Project::new();
/// assert!(!project.has_song());
///
/// project.set_name("BANGER".parse()?);
/// project.set_song(SongBuffer::new());
/// assert!(project.has_song());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    name: Name<8>,
    version: u8,
    song: Option<Box<SongBuffer>>,
}

impl Project {
    /// An empty project, without a name or song
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a project from its parts
    pub fn with_song(name: Name<8>, version: u8, song: SongBuffer) -> Self {
        Self {
            name,
            version,
            song: Some(Box::new(song)),
        }
    }

    pub fn name(&self) -> &Name<8> {
        &self.name
    }

    pub fn set_name(&mut self, name: Name<8>) {
        self.name = name;
    }

    /// The version of the project
    ///
    /// LSDJ increments this every time the project is saved. It has nothing to do with the
    /// format version of the song (see [`SongBuffer::format_version()`]).
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    /// The song, or [`None`] for an empty slot
    pub fn song(&self) -> Option<&SongBuffer> {
        self.song.as_deref()
    }

    pub fn song_mut(&mut self) -> Option<&mut SongBuffer> {
        self.song.as_deref_mut()
    }

    /// Give the project a song, returning the one it had before
    pub fn set_song(&mut self, song: SongBuffer) -> Option<SongBuffer> {
        replace(&mut self.song, Some(Box::new(song))).map(|song| *song)
    }

    /// Remove the song, turning the project into an empty slot
    pub fn take_song(&mut self) -> Option<SongBuffer> {
        self.song.take().map(|song| *song)
    }

    pub fn has_song(&self) -> bool {
        self.song.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty() {
        let project = Project::new();
        assert!(project.name().is_empty());
        assert_eq!(project.version(), 0);
        assert!(project.song().is_none());
        assert!(!project.has_song());
    }

    #[test]
    fn song_ownership() {
        let mut project = Project::with_song(
            Name::from_str("TEST").unwrap(),
            3,
            SongBuffer::zeroed(),
        );
        assert!(project.has_song());

        let old = project.set_song(SongBuffer::new());
        assert_eq!(old, Some(SongBuffer::zeroed()));
        assert_eq!(project.song(), Some(&SongBuffer::new()));

        project.song_mut().unwrap().as_mut_slice()[0] = 0x42;
        assert_eq!(project.song().unwrap().as_slice()[0], 0x42);

        let taken = project.take_song().unwrap();
        assert_eq!(taken.as_slice()[0], 0x42);
        assert!(!project.has_song());
        assert!(project.take_song().is_none());
    }

    #[test]
    fn clone() {
        let mut project = Project::with_song(
            Name::from_str("ORIGINAL").unwrap(),
            0xFF,
            SongBuffer::new(),
        );

        let copy = project.clone();
        project.set_name(Name::from_str("CHANGED").unwrap());
        project.set_version(1);
        project.song_mut().unwrap().as_mut_slice().fill(0);

        assert_eq!(copy.name().to_string_lossy(), "ORIGINAL");
        assert_eq!(copy.version(), 0xFF);
        assert_eq!(copy.song(), Some(&SongBuffer::new()));
    }
}
