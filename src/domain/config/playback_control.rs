//! Playback control mode value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidPlaybackControlError;

/// Who starts playback of the requested track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackControl {
    /// The capture process coordinates playback itself
    #[default]
    External,
    /// The recorder starts playback through the Web API before capturing
    WebApi,
}

impl PlaybackControl {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::WebApi => "web-api",
        }
    }
}

impl FromStr for PlaybackControl {
    type Err = InvalidPlaybackControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "external" => Ok(Self::External),
            "web-api" | "webapi" | "web_api" => Ok(Self::WebApi),
            _ => Err(InvalidPlaybackControlError { input: s.to_string() }),
        }
    }
}

impl fmt::Display for PlaybackControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
