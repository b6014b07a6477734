//! Playback monitor
//!
//! Polls the playback state source on a fixed cadence and exposes the
//! synchronization primitives the recorder is built on: wait for a track to
//! start, wait for its cursor to reset, and watch until the playing item
//! changes. The remote API offers no push channel, so every primitive is a
//! sleep-then-poll loop; dropping the returned future cancels it.

use std::time::Duration as StdDuration;

use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};

use crate::domain::playback::{PlaybackSnapshot, StartCondition, StartDetector, SyncState};
use crate::domain::track::TrackUri;

use super::source::{Observation, PlaybackStateSource};

/// Default poll cadence
pub const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_millis(500);

/// Consecutive empty polls before playback counts as stopped
pub const DEFAULT_ABSENCE_TOLERANCE: u32 = 3;

/// Hook invoked with the new URI and full snapshot when the item changes
pub type ChangeCallback = Box<dyn FnOnce(&str, &PlaybackSnapshot) + Send>;

/// Monitor tuning
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub poll_interval: StdDuration,
    pub absence_tolerance: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            absence_tolerance: DEFAULT_ABSENCE_TOLERANCE,
        }
    }
}

/// What the monitor last believed was playing.
/// One session per recording request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSession {
    pub last_observed_uri: Option<String>,
    pub last_observed_id: Option<String>,
}

/// One-shot check of whether a specific track is playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Playing { progress_ms: u64 },
    WrongTrack { actual: String },
    Paused,
    NoPlayback,
}

/// Polling playback monitor
pub struct PlaybackMonitor {
    source: PlaybackStateSource,
    config: MonitorConfig,
    session: Mutex<MonitorSession>,
}

impl PlaybackMonitor {
    pub fn new(source: PlaybackStateSource, config: MonitorConfig) -> Self {
        Self {
            source,
            config: MonitorConfig {
                absence_tolerance: config.absence_tolerance.max(1),
                ..config
            },
            session: Mutex::new(MonitorSession::default()),
        }
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> MonitorSession {
        self.session.lock().await.clone()
    }

    /// Start a fresh session for a new request
    pub async fn reset_session(&self) {
        *self.session.lock().await = MonitorSession::default();
    }

    async fn record(&self, snapshot: &PlaybackSnapshot) {
        let mut session = self.session.lock().await;
        session.last_observed_uri = Some(snapshot.track_uri.clone());
        session.last_observed_id = Some(snapshot.track_id.clone());
    }

    /// Wait until `expected` is playing with its cursor inside the
    /// start-detection window. Records the track in the session on success.
    pub async fn wait_for_track_start(&self, expected: &TrackUri, timeout: StdDuration) -> bool {
        let started = self
            .wait_for(expected, StartCondition::track_start(), timeout, true)
            .await;
        if !started {
            tracing::error!("Timeout waiting for track {} to start", expected);
        }
        started
    }

    /// Wait until `expected` is loaded with its cursor inside the reset window
    pub async fn wait_for_position_reset(&self, expected: &TrackUri, max_wait: StdDuration) -> bool {
        let reset = self
            .wait_for(expected, StartCondition::position_reset(), max_wait, false)
            .await;
        if !reset {
            tracing::error!(
                "Track did not reset to beginning within {}ms",
                max_wait.as_millis()
            );
        }
        reset
    }

    async fn wait_for(
        &self,
        expected: &TrackUri,
        condition: StartCondition,
        timeout: StdDuration,
        record: bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let mut detector = StartDetector::new(expected.clone(), condition);

        while Instant::now() < deadline {
            let Some(observation) = self.source.fetch_until(deadline).await else {
                tracing::debug!("Playback read still pending at the deadline");
                break;
            };

            match detector.observe(observation.snapshot()) {
                SyncState::Verified => {
                    if let Some(snapshot) = observation.snapshot() {
                        tracing::info!("Track {} at position {}ms", expected, snapshot.progress_ms);
                        if record {
                            self.record(snapshot).await;
                        }
                    }
                    return true;
                }
                SyncState::WaitingForAbsence => {
                    if let Some(snapshot) = observation.snapshot() {
                        tracing::debug!(
                            "Track loaded but at {}ms, waiting for position reset",
                            snapshot.progress_ms
                        );
                    }
                }
                SyncState::WaitingForMatch | SyncState::TimedOut => match &observation {
                    Observation::Unavailable => tracing::debug!("Playback state unavailable, retrying"),
                    Observation::Idle => tracing::debug!("Waiting for playback to start"),
                    Observation::Snapshot(s) => tracing::debug!(
                        "Waiting for {}; current {} (playing: {})",
                        expected,
                        s.track_uri,
                        s.is_playing
                    ),
                },
            }

            sleep_until(deadline.min(Instant::now() + self.config.poll_interval)).await;
        }

        detector.expire() == SyncState::Verified
    }

    /// Poll until the playing item differs from the session's last known
    /// one, or playback disappears.
    ///
    /// Returns the new URI (after invoking `on_change` once), or `None` once
    /// `absence_tolerance` consecutive polls see nothing playing. Never times
    /// out on its own.
    pub async fn monitor_until_change(&self, on_change: Option<ChangeCallback>) -> Option<String> {
        let mut absent_polls: u32 = 0;

        loop {
            match self.source.fetch().await {
                Observation::Snapshot(snapshot) => {
                    absent_polls = 0;
                    let last = self.session.lock().await.last_observed_uri.clone();

                    if last.as_deref() != Some(snapshot.track_uri.as_str()) {
                        tracing::info!(
                            "Track changed: {} -> {}",
                            last.as_deref().unwrap_or("(none)"),
                            snapshot.track_uri
                        );
                        self.record(&snapshot).await;
                        if let Some(callback) = on_change {
                            callback(&snapshot.track_uri, &snapshot);
                        }
                        return Some(snapshot.track_uri);
                    }
                }
                observation => {
                    absent_polls += 1;
                    if observation.is_unavailable() {
                        tracing::debug!("Playback state unavailable ({} in a row)", absent_polls);
                    }
                    if absent_polls >= self.config.absence_tolerance {
                        tracing::info!("Playback stopped");
                        return None;
                    }
                }
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Time left in the current item, `None` if nothing is playing
    pub async fn remaining_time_ms(&self) -> Option<u64> {
        self.source
            .fetch()
            .await
            .snapshot()
            .map(PlaybackSnapshot::remaining_ms)
    }

    /// Fetch once and report whether `expected` is the playing item.
    /// Records the track in the session when it is.
    pub async fn confirm_playing(&self, expected: &TrackUri) -> Confirmation {
        let snapshot = match self.source.fetch().await {
            Observation::Snapshot(s) => s,
            Observation::Idle | Observation::Unavailable => return Confirmation::NoPlayback,
        };

        if !expected.matches(&snapshot.track_uri) {
            return Confirmation::WrongTrack {
                actual: snapshot.track_uri,
            };
        }
        if !snapshot.is_playing {
            return Confirmation::Paused;
        }

        self.record(&snapshot).await;
        Confirmation::Playing {
            progress_ms: snapshot.progress_ms,
        }
    }
}
