//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration: \"{input}\". Use hours, minutes and seconds in that order (e.g., 30s, 3m25s, 1h2m)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a track reference cannot be understood
#[derive(Debug, Clone, Error)]
#[error("Invalid track: \"{input}\". Expected a Spotify track URI (spotify:track:<id>) or link (https://open.spotify.com/track/<id>)")]
pub struct TrackUriParseError {
    pub input: String,
}

/// Error when a command-line reference is neither a track nor a collection
#[derive(Debug, Clone, Error)]
#[error("Invalid track, album or playlist: \"{input}\". Expected spotify:<track|album|playlist>:<id> or an open.spotify.com link")]
pub struct ReferenceParseError {
    pub input: String,
}

/// Error when a recording target has no expected length
#[derive(Debug, Clone, Error)]
#[error("Expected track duration must be greater than zero")]
pub struct ZeroDurationError;

/// Error when an unknown playback control mode is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid playback control: \"{input}\". Valid modes are: external, web-api")]
pub struct InvalidPlaybackControlError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
