//! Configuration domain module

mod app_config;
mod playback_control;

pub use app_config::{
    AppConfig, CaptureConfig, PlayerConfig, DEFAULT_API_BASE_URL, DEFAULT_CAPTURE_COMMAND,
    DEFAULT_HELPER_PROCESS, DEFAULT_PLAYER_COMMANDS,
};
pub use playback_control::PlaybackControl;
