//! Device activation
//!
//! Makes sure some remote-controllable playback endpoint exists before any
//! playback command is sent. Playback commands target the active device
//! implicitly, so the presence of any device is enough.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::domain::playback::Device;

use super::ports::{LaunchError, PlaybackApi, PlayerLauncher, RemoteError};

/// Device enumeration cadence while waiting
pub const DEVICE_POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Device activation errors
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("Cannot start playback device: {0}")]
    LaunchFailed(#[from] LaunchError),

    #[error("No playback device found after waiting {0}s")]
    NotFound(u64),

    #[error("Playback API unreachable while waiting for a device: {0}")]
    Unreachable(RemoteError),
}

/// Ensures a playback device is available, launching the player if needed
pub struct DeviceActivator {
    api: Arc<dyn PlaybackApi>,
    launcher: Arc<dyn PlayerLauncher>,
    poll_interval: StdDuration,
}

impl DeviceActivator {
    pub fn new(api: Arc<dyn PlaybackApi>, launcher: Arc<dyn PlayerLauncher>) -> Self {
        Self {
            api,
            launcher,
            poll_interval: DEVICE_POLL_INTERVAL,
        }
    }

    /// Return the visible devices, launching the player and waiting up to
    /// `max_wait` for one to appear if none is visible yet.
    pub async fn ensure_active(&self, max_wait: StdDuration) -> Result<Vec<Device>, DeviceError> {
        let started = Instant::now();
        let deadline = started + max_wait;

        let mut answered = false;
        let mut last_error = None;

        match self.list_until(deadline).await {
            Ok(devices) if !devices.is_empty() => {
                tracing::debug!("Found playback devices: {}", device_names(&devices));
                return Ok(devices);
            }
            Ok(_) => {
                tracing::info!("No playback device visible, starting player");
                answered = true;
            }
            Err(e) => {
                tracing::info!("Device listing failed ({}), starting player", e);
                last_error = Some(e);
            }
        }

        self.launcher.launch().map_err(|e| {
            tracing::error!("Failed to start player: {}", e);
            DeviceError::from(e)
        })?;

        while Instant::now() < deadline {
            match self.list_until(deadline).await {
                Ok(devices) if !devices.is_empty() => {
                    tracing::info!("Found playback devices: {}", device_names(&devices));
                    return Ok(devices);
                }
                Ok(_) => answered = true,
                Err(e) => last_error = Some(e),
            }
            tracing::debug!(
                "Waiting for playback device... ({}s)",
                started.elapsed().as_secs()
            );
            sleep_until(deadline.min(Instant::now() + self.poll_interval)).await;
        }

        tracing::error!("No playback device found after waiting");
        match last_error {
            Some(e) if !answered => Err(DeviceError::Unreachable(e)),
            _ => Err(DeviceError::NotFound(max_wait.as_secs())),
        }
    }

    /// List devices, giving up at `deadline`
    async fn list_until(&self, deadline: Instant) -> Result<Vec<Device>, RemoteError> {
        timeout_at(deadline, self.api.devices())
            .await
            .unwrap_or_else(|_| Err(RemoteError::RequestFailed("device listing timed out".to_string())))
    }

    /// Pre-flight check: true if a device is (or becomes) available
    pub async fn is_device_ready(&self, max_wait: StdDuration) -> bool {
        self.ensure_active(max_wait).await.is_ok()
    }
}

fn device_names(devices: &[Device]) -> String {
    devices
        .iter()
        .map(|d| d.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
