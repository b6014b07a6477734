//! Playback domain module

mod snapshot;
mod sync;

pub use snapshot::{CatalogTrack, Device, PlaybackSnapshot, TrackInfo};
pub use sync::{
    StartCondition, StartDetector, SyncState, SyncTarget, POSITION_RESET_WINDOW_MS,
    START_DETECTION_WINDOW_MS,
};
