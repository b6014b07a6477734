//! Remote playback API port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::{CatalogTrack, Device, PlaybackSnapshot, TrackInfo};
use crate::domain::track::{CollectionKind, CollectionRef, TrackUri};

/// Remote API errors
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Access token rejected. Set SPOTIFY_ACCESS_TOKEN or run 'spotify-recorder config set access_token <token>'")]
    Unauthorized,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Port for the remote player's read/write operations.
///
/// Authentication is the implementation's concern. One instance is shared
/// by every core component; calls are independent and stateless.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    /// Current playback state, `None` when nothing is playing
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, RemoteError>;

    /// Devices able to accept playback commands
    async fn devices(&self) -> Result<Vec<Device>, RemoteError>;

    /// Play `uri` on the active device starting at `position_ms`
    async fn start_playback(&self, uri: &TrackUri, position_ms: u64) -> Result<(), RemoteError>;

    /// Catalog metadata for a track
    async fn track(&self, uri: &TrackUri) -> Result<TrackInfo, RemoteError>;

    /// Tracks of an album in disc order
    async fn album_tracks(&self, album_id: &str) -> Result<Vec<CatalogTrack>, RemoteError>;

    /// Tracks of a playlist in playlist order. Entries that are not
    /// catalog tracks (episodes, local files) are left out.
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<CatalogTrack>, RemoteError>;

    /// Best catalog matches for a free-text query, best first
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<CatalogTrack>, RemoteError>;

    async fn collection_tracks(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<CatalogTrack>, RemoteError> {
        match collection.kind() {
            CollectionKind::Album => self.album_tracks(collection.id()).await,
            CollectionKind::Playlist => self.playlist_tracks(collection.id()).await,
        }
    }
}
