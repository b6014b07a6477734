//! Capture process port interfaces

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::track::TrackUri;

/// Capture process errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Capture command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Capture failed: {0}")]
    WaitFailed(String),

    #[error("Failed to signal capture process: {0}")]
    SignalFailed(String),
}

/// Arguments handed to the capture process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub track: TrackUri,
    pub destination: PathBuf,
    pub expected_duration_secs: u64,
    pub verbose: bool,
}

/// A running capture process, exclusively owned by the recording request
#[async_trait]
pub trait CaptureHandle: Send {
    /// Wait for the process to exit and return its exit code.
    ///
    /// Must be cancel-safe: dropping the future leaves the process running
    /// and the handle usable.
    async fn wait(&mut self) -> Result<i32, CaptureError>;

    /// Ask the process to stop (SIGTERM)
    fn terminate(&mut self) -> Result<(), CaptureError>;

    /// Stop the process unconditionally (SIGKILL)
    fn kill(&mut self) -> Result<(), CaptureError>;

    /// True until the process has been observed to exit
    fn is_alive(&mut self) -> bool;
}

/// Port for starting capture processes
#[async_trait]
pub trait CaptureLauncher: Send + Sync {
    /// Spawn the capture process for one track
    async fn launch(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureHandle>, CaptureError>;

    /// Best-effort termination of every same-named capture helper on the
    /// system, including orphans from an earlier aborted run
    async fn sweep_strays(&self);
}
