//! Track, album and playlist references

use std::fmt;
use std::str::FromStr;

use crate::domain::error::ReferenceParseError;

use super::uri::{is_valid_id, split_reference};
use super::TrackUri;

/// A group of tracks recorded one after another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Album,
    Playlist,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Album => "album",
            CollectionKind::Playlist => "playlist",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    kind: CollectionKind,
    id: String,
}

impl CollectionRef {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spotify:{}:{}", self.kind, self.id)
    }
}

/// Anything that can be handed to the recorder on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyRef {
    Track(TrackUri),
    Collection(CollectionRef),
}

impl FromStr for SpotifyRef {
    type Err = ReferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ReferenceParseError {
            input: s.to_string(),
        };

        let (kind, id) = split_reference(s.trim()).ok_or_else(err)?;
        let kind = match kind {
            "track" => return s.parse().map(SpotifyRef::Track).map_err(|_| err()),
            "album" => CollectionKind::Album,
            "playlist" => CollectionKind::Playlist,
            _ => return Err(err()),
        };

        if !is_valid_id(id) {
            return Err(err());
        }

        Ok(SpotifyRef::Collection(CollectionRef {
            kind,
            id: id.to_string(),
        }))
    }
}
