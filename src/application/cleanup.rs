//! Capture process ownership and cleanup
//!
//! [`CaptureGuard`] is the scoped owner of the capture process for one
//! recording request. Every non-success exit path runs
//! [`CaptureGuard::cleanup`]; if the guard is dropped while still holding a
//! live process, the process is killed.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::timeout;

use super::ports::{CaptureError, CaptureHandle, CaptureLauncher, CaptureRequest};

/// Time a terminated capture gets to exit before it is killed
pub const DEFAULT_TERMINATE_GRACE: StdDuration = StdDuration::from_millis(500);

/// Exclusive owner of a running capture process
pub struct CaptureGuard {
    handle: Option<Box<dyn CaptureHandle>>,
    launcher: Arc<dyn CaptureLauncher>,
    grace: StdDuration,
}

impl CaptureGuard {
    /// Spawn the capture process and take ownership of it
    pub async fn launch(
        launcher: Arc<dyn CaptureLauncher>,
        request: &CaptureRequest,
        grace: StdDuration,
    ) -> Result<Self, CaptureError> {
        let handle = launcher.launch(request).await?;
        Ok(Self {
            handle: Some(handle),
            launcher,
            grace,
        })
    }

    /// A guard holding no process; cleanup only sweeps
    pub fn empty(launcher: Arc<dyn CaptureLauncher>, grace: StdDuration) -> Self {
        Self {
            handle: None,
            launcher,
            grace,
        }
    }

    pub fn is_held(&self) -> bool {
        self.handle.is_some()
    }

    /// Wait for the held process to exit. The handle is released once the
    /// exit has been observed. Cancel-safe.
    pub async fn wait(&mut self) -> Result<i32, CaptureError> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| CaptureError::WaitFailed("No capture process held".to_string()))?;

        let code = handle.wait().await?;
        self.handle = None;
        Ok(code)
    }

    /// Terminate the held process, escalating to a kill if it outlives the
    /// grace period. No-op when nothing is held or it already exited.
    pub async fn stop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        if !handle.is_alive() {
            return;
        }

        if let Err(e) = handle.terminate() {
            tracing::debug!("Terminate failed: {}", e);
        }
        let _ = timeout(self.grace, handle.wait()).await;

        if handle.is_alive() {
            tracing::debug!("Capture still running after {}ms, killing", self.grace.as_millis());
            if let Err(e) = handle.kill() {
                tracing::error!("Error cleaning up recording process: {}", e);
            }
            let _ = timeout(self.grace, handle.wait()).await;
        }
    }

    /// Stop the held process, then sweep stray capture helpers system-wide.
    /// Idempotent.
    pub async fn cleanup(&mut self) {
        self.stop().await;
        self.launcher.sweep_strays().await;
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if handle.is_alive() {
                let _ = handle.kill();
            }
        }
    }
}
