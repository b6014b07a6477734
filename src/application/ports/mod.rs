//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod playback_api;
pub mod player;

// Re-export common types
pub use capture::{CaptureError, CaptureHandle, CaptureLauncher, CaptureRequest};
pub use config::ConfigStore;
pub use playback_api::{PlaybackApi, RemoteError};
pub use player::{LaunchError, PlayerLauncher};
