//! Start detection state machine
//!
//! The remote API has no "seek then play" acknowledgement, so a start is
//! inferred from polled snapshots: the expected URI must be visible with a
//! play cursor inside a small window. A matching URI with a cursor beyond
//! the window is the previous session's trailing state and is not trusted.
//!
//! ```text
//!   WaitingForMatch ──(uri matches, cursor past window)──> WaitingForAbsence
//!         │  ^                                                   │
//!         │  └──────────(other uri / nothing playing)────────────┘
//!         │
//!         ├──(uri matches, cursor inside window)──> Verified
//!         └──(deadline passes)────────────────────> TimedOut
//! ```

use std::fmt;

use crate::domain::error::ZeroDurationError;
use crate::domain::recording::Duration;
use crate::domain::track::TrackUri;

use super::snapshot::PlaybackSnapshot;

/// Progress window accepted as "just started"
pub const START_DETECTION_WINDOW_MS: u64 = 2000;

/// Tighter window accepted as "cursor is back at the beginning"
pub const POSITION_RESET_WINDOW_MS: u64 = 1000;

/// The track a caller wants recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    uri: TrackUri,
    expected_duration: Duration,
}

impl SyncTarget {
    pub fn new(uri: TrackUri, expected_duration: Duration) -> Result<Self, ZeroDurationError> {
        if expected_duration.as_millis() == 0 {
            return Err(ZeroDurationError);
        }
        Ok(Self {
            uri,
            expected_duration,
        })
    }

    pub fn uri(&self) -> &TrackUri {
        &self.uri
    }

    pub fn expected_duration(&self) -> Duration {
        self.expected_duration
    }

    /// Expected length in whole seconds, partial seconds rounded up
    pub fn expected_duration_secs(&self) -> u64 {
        self.expected_duration.as_secs_ceil()
    }
}

/// What a snapshot must show for the detector to accept it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCondition {
    pub window_ms: u64,
    pub require_playing: bool,
}

impl StartCondition {
    /// Expected track playing, cursor within the start-detection window
    pub const fn track_start() -> Self {
        Self {
            window_ms: START_DETECTION_WINDOW_MS,
            require_playing: true,
        }
    }

    /// Expected track loaded, cursor within the reset window
    pub const fn position_reset() -> Self {
        Self {
            window_ms: POSITION_RESET_WINDOW_MS,
            require_playing: false,
        }
    }
}

/// Detector states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
    /// Nothing playing, another item, or the expected item paused
    #[default]
    WaitingForMatch,
    /// Expected item visible but its cursor is stale
    WaitingForAbsence,
    Verified,
    TimedOut,
}

impl SyncState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForMatch => "waiting for match",
            Self::WaitingForAbsence => "waiting for stale state to clear",
            Self::Verified => "verified",
            Self::TimedOut => "timed out",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::TimedOut)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timed state machine fed one observation per poll.
///
/// Terminal states are sticky: once `Verified` or `TimedOut`, further
/// observations are ignored.
#[derive(Debug, Clone)]
pub struct StartDetector {
    expected: TrackUri,
    condition: StartCondition,
    state: SyncState,
}

impl StartDetector {
    pub fn new(expected: TrackUri, condition: StartCondition) -> Self {
        Self {
            expected,
            condition,
            state: SyncState::WaitingForMatch,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Feed one poll result (`None` when nothing is playing or the source
    /// was unavailable)
    pub fn observe(&mut self, snapshot: Option<&PlaybackSnapshot>) -> SyncState {
        if self.state.is_terminal() {
            return self.state;
        }

        self.state = match snapshot {
            None => SyncState::WaitingForMatch,
            Some(s) if !self.expected.matches(&s.track_uri) => SyncState::WaitingForMatch,
            Some(s) if self.condition.require_playing && !s.is_playing => {
                SyncState::WaitingForMatch
            }
            Some(s) if s.progress_ms < self.condition.window_ms => SyncState::Verified,
            Some(_) => SyncState::WaitingForAbsence,
        };
        self.state
    }

    /// The deadline passed; any non-verified state times out
    pub fn expire(&mut self) -> SyncState {
        if self.state != SyncState::Verified {
            self.state = SyncState::TimedOut;
        }
        self.state
    }
}
