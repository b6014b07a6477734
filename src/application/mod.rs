//! Application layer - Use cases and port interfaces
//!
//! Contains the recording engine (state source, monitor, device activation,
//! playback starter, orchestrator, cleanup) and the trait definitions for
//! external system interactions.

pub mod cleanup;
pub mod device;
pub mod monitor;
pub mod ports;
pub mod recorder;
pub mod source;
pub mod starter;

#[cfg(test)]
pub(crate) mod testing;

// Re-export use cases
pub use cleanup::CaptureGuard;
pub use device::{DeviceActivator, DeviceError};
pub use monitor::{ChangeCallback, Confirmation, MonitorConfig, MonitorSession, PlaybackMonitor};
pub use recorder::{
    verify_artifact, ArtifactError, RecordCallbacks, RecorderConfig, RecordingOrchestrator,
};
pub use source::{Observation, PlaybackStateSource};
pub use starter::{PlaybackStarter, StartError, StartPolicy};
