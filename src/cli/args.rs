//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::config::PlaybackControl;
use crate::domain::recording::Duration;
use crate::domain::track::SpotifyRef;

/// Spotify Recorder - record tracks from the desktop player to files
#[derive(Parser, Debug)]
#[command(name = "spotify-recorder")]
#[command(version)]
#[command(about = "Record a Spotify track by synchronizing playback with an audio capture")]
#[command(long_about = None)]
pub struct Cli {
    /// Track, album or playlist to record (spotify:<kind>:<id> or an open.spotify.com link)
    #[arg(value_name = "TRACK")]
    pub track: Option<String>,

    /// Record the best catalog match for a search query instead
    #[arg(short = 's', long, value_name = "QUERY", conflicts_with = "track")]
    pub search: Option<String>,

    /// Output file for a single track (default: <output_dir>/<artists> - <title>.mp3)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Expected track length (e.g., 3m25s); looked up via the Web API if omitted
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Who starts playback
    #[arg(long, value_name = "MODE")]
    pub playback_control: Option<PlaybackControlArg>,

    /// Shorthand for --playback-control web-api
    #[arg(long, conflicts_with = "playback_control")]
    pub web_api: bool,

    /// Web API access token
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Verbose output (debug logs, capture script output)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check that a playback device is available, starting the player if needed
    Devices {
        /// How long to wait for a device (default: device_wait from config)
        #[arg(short = 'w', long, value_name = "TIME")]
        wait: Option<String>,

        /// Only report readiness through the exit code
        #[arg(long)]
        check: bool,

        /// Web API access token
        #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },
    /// Terminate stray capture helper processes
    Cleanup,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Playback control argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlaybackControlArg {
    External,
    WebApi,
}

impl From<PlaybackControlArg> for PlaybackControl {
    fn from(arg: PlaybackControlArg) -> Self {
        match arg {
            PlaybackControlArg::External => PlaybackControl::External,
            PlaybackControlArg::WebApi => PlaybackControl::WebApi,
        }
    }
}

impl Cli {
    /// Playback control requested on the command line, if any
    pub fn playback_control(&self) -> Option<PlaybackControl> {
        if self.web_api {
            Some(PlaybackControl::WebApi)
        } else {
            self.playback_control.map(PlaybackControl::from)
        }
    }
}

/// What a recording run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelection {
    Reference(SpotifyRef),
    Search(String),
}

/// Parsed options for one recording run
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub selection: RecordSelection,
    pub output: Option<PathBuf>,
    pub duration: Option<Duration>,
    pub verbose: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "access_token",
    "api_base_url",
    "output_dir",
    "playback_control",
    "poll_interval_ms",
    "start_timeout",
    "device_wait",
    "max_retries",
    "capture.command",
    "capture.helper_process",
    "capture.grace_ms",
    "player.commands",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
