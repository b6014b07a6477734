//! Domain layer - Core business logic
//!
//! Contains value objects, the start-detection state machine, and domain
//! errors. This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod playback;
pub mod recording;
pub mod track;

// Re-export common types
pub use config::{AppConfig, PlaybackControl};
pub use error::*;
pub use playback::{CatalogTrack, Device, PlaybackSnapshot, SyncState, SyncTarget, TrackInfo};
pub use recording::{Duration, RecordingErrorKind, RecordingOutcome};
pub use track::{CollectionRef, SpotifyRef, TrackUri};
