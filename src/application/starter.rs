//! Playback starter
//!
//! Issues "play this track from 0" and checks, through the monitor, that the
//! requested track is really the one playing. The remote API cannot tell
//! "command not applied yet" apart from "command applied to the wrong
//! target", so every failed verification takes the same retry path.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::time::sleep;

use crate::domain::playback::SyncTarget;

use super::device::{DeviceActivator, DeviceError};
use super::monitor::{Confirmation, PlaybackMonitor};
use super::ports::PlaybackApi;

/// Pause after a play command before checking the result
pub const DEFAULT_SETTLE_DELAY: StdDuration = StdDuration::from_secs(2);

/// Pause between failed attempts
pub const DEFAULT_RETRY_DELAY: StdDuration = StdDuration::from_secs(1);

/// Default number of play attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Playback start errors
#[derive(Debug, Clone, Error)]
pub enum StartError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Failed to start playback after {0} attempts")]
    VerificationFailed(u32),
}

/// Timing used by the starter
#[derive(Debug, Clone, Copy)]
pub struct StartPolicy {
    pub settle_delay: StdDuration,
    pub retry_delay: StdDuration,
    pub device_wait: StdDuration,
}

impl Default for StartPolicy {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            device_wait: StdDuration::from_secs(15),
        }
    }
}

/// Starts a track remotely and verifies it is playing
pub struct PlaybackStarter {
    api: Arc<dyn PlaybackApi>,
    devices: DeviceActivator,
    monitor: Arc<PlaybackMonitor>,
    policy: StartPolicy,
}

impl PlaybackStarter {
    pub fn new(
        api: Arc<dyn PlaybackApi>,
        devices: DeviceActivator,
        monitor: Arc<PlaybackMonitor>,
        policy: StartPolicy,
    ) -> Self {
        Self {
            api,
            devices,
            monitor,
            policy,
        }
    }

    /// Start `target` from position 0, making up to `max_retries` attempts
    /// (at least one).
    ///
    /// A missing device aborts without retrying the play command.
    pub async fn start(&self, target: &SyncTarget, max_retries: u32) -> Result<(), StartError> {
        if let Err(e) = self.devices.ensure_active(self.policy.device_wait).await {
            tracing::error!("Cannot start playback: {}", e);
            return Err(e.into());
        }

        let uri = target.uri();
        let attempts = max_retries.max(1);

        for attempt in 1..=attempts {
            tracing::info!(
                "Starting playback via Web API (attempt {}/{}): {}",
                attempt,
                attempts,
                uri
            );

            match self.api.start_playback(uri, 0).await {
                Ok(()) => {
                    sleep(self.policy.settle_delay).await;

                    match self.monitor.confirm_playing(uri).await {
                        Confirmation::Playing { progress_ms } => {
                            tracing::info!(
                                "Track verified playing: {} at position {}ms",
                                uri,
                                progress_ms
                            );
                            return Ok(());
                        }
                        Confirmation::WrongTrack { actual } => {
                            tracing::warn!("Wrong track playing: expected {}, got {}", uri, actual)
                        }
                        Confirmation::Paused => {
                            tracing::warn!("Track {} loaded but not playing", uri)
                        }
                        Confirmation::NoPlayback => {
                            tracing::warn!("No playback state available")
                        }
                    }
                }
                Err(e) => tracing::warn!("Error starting playback (attempt {}): {}", attempt, e),
            }

            if attempt < attempts {
                sleep(self.policy.retry_delay).await;
            }
        }

        tracing::error!("Failed to start playback after {} attempts", attempts);
        Err(StartError::VerificationFailed(attempts))
    }
}
