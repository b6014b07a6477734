//! Playback state source
//!
//! Wraps the single "current playback" call and folds every failure into
//! [`Observation::Unavailable`]. No retries happen here; each caller decides
//! what absence means for its own loop.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::{timeout, timeout_at, Instant};

use crate::domain::playback::PlaybackSnapshot;

use super::ports::PlaybackApi;

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Something is playing (or paused with an item loaded)
    Snapshot(PlaybackSnapshot),
    /// The API answered: nothing is loaded
    Idle,
    /// The API call failed
    Unavailable,
}

impl Observation {
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        match self {
            Self::Snapshot(s) => Some(s),
            Self::Idle | Self::Unavailable => None,
        }
    }

    pub fn into_snapshot(self) -> Option<PlaybackSnapshot> {
        match self {
            Self::Snapshot(s) => Some(s),
            Self::Idle | Self::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Longest a single playback read may take before it counts as unavailable
pub const DEFAULT_FETCH_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Single-call playback state reader
#[derive(Clone)]
pub struct PlaybackStateSource {
    api: Arc<dyn PlaybackApi>,
    fetch_timeout: StdDuration,
}

impl PlaybackStateSource {
    pub fn new(api: Arc<dyn PlaybackApi>) -> Self {
        Self {
            api,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the per-read timeout
    pub fn with_fetch_timeout(mut self, fetch_timeout: StdDuration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Fetch one snapshot. Never fails; errors and slow reads become
    /// `Unavailable`.
    pub async fn fetch(&self) -> Observation {
        match timeout(self.fetch_timeout, self.read()).await {
            Ok(observation) => observation,
            Err(_) => {
                tracing::debug!(
                    "Playback state read timed out after {}ms",
                    self.fetch_timeout.as_millis()
                );
                Observation::Unavailable
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but gives up at `deadline`. `None` means
    /// the deadline passed before the read finished.
    pub async fn fetch_until(&self, deadline: Instant) -> Option<Observation> {
        timeout_at(deadline, self.fetch()).await.ok()
    }

    async fn read(&self) -> Observation {
        match self.api.current_playback().await {
            Ok(Some(snapshot)) => {
                if snapshot.is_progress_suspect() {
                    tracing::debug!(
                        "Suspect progress for {}: {}ms of {}ms",
                        snapshot.track_uri,
                        snapshot.progress_ms,
                        snapshot.duration_ms
                    );
                }
                Observation::Snapshot(snapshot)
            }
            Ok(None) => Observation::Idle,
            Err(e) => {
                tracing::debug!("Playback state unavailable: {}", e);
                Observation::Unavailable
            }
        }
    }
}
