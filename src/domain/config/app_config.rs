//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

use super::playback_control::PlaybackControl;

/// Default Web API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Default capture command
pub const DEFAULT_CAPTURE_COMMAND: &str = "spotdl.sh";

/// Default name of the helper the capture command spawns
pub const DEFAULT_HELPER_PROCESS: &str = "pw-record";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_GRACE_MS: u64 = 500;

/// Desktop player commands tried in order
pub const DEFAULT_PLAYER_COMMANDS: &[&str] = &["spotify", "/snap/bin/spotify"];

/// Capture process configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub command: Option<String>,
    pub helper_process: Option<String>,
    pub grace_ms: Option<u64>,
}

/// Desktop player configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub commands: Option<Vec<String>>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub access_token: Option<String>,
    pub api_base_url: Option<String>,
    pub output_dir: Option<String>,
    pub playback_control: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub start_timeout: Option<String>,
    pub device_wait: Option<String>,
    pub max_retries: Option<u32>,
    pub capture: Option<CaptureConfig>,
    pub player: Option<PlayerConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            access_token: None,
            api_base_url: Some(DEFAULT_API_BASE_URL.to_string()),
            output_dir: Some(".".to_string()),
            playback_control: Some(PlaybackControl::default().to_string()),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            start_timeout: Some(Duration::default_start_timeout().to_string()),
            device_wait: Some(Duration::default_device_wait().to_string()),
            max_retries: Some(DEFAULT_MAX_RETRIES),
            capture: Some(CaptureConfig {
                command: Some(DEFAULT_CAPTURE_COMMAND.to_string()),
                helper_process: Some(DEFAULT_HELPER_PROCESS.to_string()),
                grace_ms: Some(DEFAULT_GRACE_MS),
            }),
            player: Some(PlayerConfig {
                commands: Some(DEFAULT_PLAYER_COMMANDS.iter().map(|s| s.to_string()).collect()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            access_token: other.access_token.or(self.access_token),
            api_base_url: other.api_base_url.or(self.api_base_url),
            output_dir: other.output_dir.or(self.output_dir),
            playback_control: other.playback_control.or(self.playback_control),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            start_timeout: other.start_timeout.or(self.start_timeout),
            device_wait: other.device_wait.or(self.device_wait),
            max_retries: other.max_retries.or(self.max_retries),
            capture: Self::merge_capture_config(self.capture, other.capture),
            player: Self::merge_player_config(self.player, other.player),
        }
    }

    fn merge_capture_config(
        base: Option<CaptureConfig>,
        other: Option<CaptureConfig>,
    ) -> Option<CaptureConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(CaptureConfig {
                command: o.command.or(b.command),
                helper_process: o.helper_process.or(b.helper_process),
                grace_ms: o.grace_ms.or(b.grace_ms),
            }),
        }
    }

    fn merge_player_config(
        base: Option<PlayerConfig>,
        other: Option<PlayerConfig>,
    ) -> Option<PlayerConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(PlayerConfig {
                commands: o.commands.or(b.commands),
            }),
        }
    }

    pub fn api_base_url_or_default(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn output_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.output_dir.as_deref().unwrap_or("."))
    }

    /// Get playback control mode, or `external` if not set/invalid
    pub fn playback_control_or_default(&self) -> PlaybackControl {
        self.playback_control
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Poll interval, never below 50ms
    pub fn poll_interval_or_default(&self) -> std::time::Duration {
        let ms = self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS).max(50);
        std::time::Duration::from_millis(ms)
    }

    pub fn start_timeout_or_default(&self) -> Duration {
        self.start_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_start_timeout)
    }

    pub fn device_wait_or_default(&self) -> Duration {
        self.device_wait
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_device_wait)
    }

    /// Play attempts when starting playback (at least 1)
    pub fn max_retries_or_default(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES).max(1)
    }

    pub fn capture_command_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.command.as_deref())
            .unwrap_or(DEFAULT_CAPTURE_COMMAND)
    }

    pub fn helper_process_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.helper_process.as_deref())
            .unwrap_or(DEFAULT_HELPER_PROCESS)
    }

    pub fn grace_or_default(&self) -> std::time::Duration {
        let ms = self
            .capture
            .as_ref()
            .and_then(|c| c.grace_ms)
            .unwrap_or(DEFAULT_GRACE_MS);
        std::time::Duration::from_millis(ms)
    }

    pub fn player_commands_or_default(&self) -> Vec<String> {
        self.player
            .as_ref()
            .and_then(|p| p.commands.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER_COMMANDS.iter().map(|s| s.to_string()).collect())
    }
}
