//! Remote playback state values

use crate::domain::track::TrackUri;

/// One polled read of the remote player's current state.
///
/// Only built for a playing item; "nothing playing" is the absence of a
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track_uri: String,
    pub track_id: String,
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
}

impl PlaybackSnapshot {
    /// Time left in the current item.
    ///
    /// The remote source occasionally reports a cursor at or past the end;
    /// that clamps to zero instead of underflowing.
    pub fn remaining_ms(&self) -> u64 {
        self.duration_ms.saturating_sub(self.progress_ms)
    }

    /// True if the reported cursor is not strictly inside the item
    pub fn is_progress_suspect(&self) -> bool {
        self.progress_ms >= self.duration_ms
    }
}

/// A playback endpoint visible to the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    pub kind: String,
    pub is_active: bool,
}

/// Catalog metadata for a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub name: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
}

impl TrackInfo {
    /// "Artist A, Artist B - Title", safe to use as a file stem
    pub fn file_stem(&self) -> String {
        let label = if self.artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.artists.join(", "), self.name)
        };

        let cleaned: String = label
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        cleaned.trim().trim_matches('.').to_string()
    }
}

/// A playable catalog entry, as listed by an album, playlist or search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTrack {
    pub uri: TrackUri,
    pub info: TrackInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(progress_ms: u64, duration_ms: u64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track_uri: "spotify:track:a".to_string(),
            track_id: "a".to_string(),
            is_playing: true,
            progress_ms,
            duration_ms,
        }
    }

    #[test]
    fn remaining_is_duration_minus_progress() {
        assert_eq!(snapshot(60_000, 180_000).remaining_ms(), 120_000);
    }

    #[test]
    fn remaining_clamps_when_progress_overruns() {
        let s = snapshot(181_000, 180_000);
        assert!(s.is_progress_suspect());
        assert_eq!(s.remaining_ms(), 0);
        assert!(snapshot(180_000, 180_000).is_progress_suspect());
    }

    #[test]
    fn file_stem_joins_artists_and_strips_separators() {
        let info = TrackInfo {
            name: "Song: Live/Remastered?".to_string(),
            artists: vec!["A".to_string(), "B".to_string()],
            duration_ms: 1,
        };
        assert_eq!(info.file_stem(), "A, B - Song_ Live_Remastered_");
    }

    #[test]
    fn file_stem_without_artists() {
        let info = TrackInfo {
            name: "Untitled".to_string(),
            artists: vec![],
            duration_ms: 1,
        };
        assert_eq!(info.file_stem(), "Untitled");
    }
}
