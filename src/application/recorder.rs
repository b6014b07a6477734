//! Record track use case

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::time::interval;

use crate::domain::playback::SyncTarget;
use crate::domain::recording::{minimum_output_bytes, RecordingErrorKind, RecordingOutcome};

use super::cleanup::{CaptureGuard, DEFAULT_TERMINATE_GRACE};
use super::device::DeviceError;
use super::monitor::{ChangeCallback, PlaybackMonitor};
use super::ports::{CaptureError, CaptureLauncher, CaptureRequest};
use super::starter::{PlaybackStarter, StartError, DEFAULT_MAX_RETRIES};

/// How often the stop flag is checked while waiting
pub const CANCEL_POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Post-condition violations on the captured file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("Output file not found: {0}")]
    Missing(PathBuf),

    #[error("Output file too small: {size} bytes (expected at least {minimum})")]
    TooSmall { size: u64, minimum: u64 },
}

impl ArtifactError {
    pub fn kind(&self) -> RecordingErrorKind {
        match self {
            Self::Missing(_) => RecordingErrorKind::OutputMissing,
            Self::TooSmall { .. } => RecordingErrorKind::OutputTooSmall,
        }
    }
}

/// Check that `path` exists and is large enough for `expected_duration_secs`
/// of audio. Returns the file size.
pub async fn verify_artifact(path: &Path, expected_duration_secs: u64) -> Result<u64, ArtifactError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        _ => return Err(ArtifactError::Missing(path.to_path_buf())),
    };

    let size = metadata.len();
    let minimum = minimum_output_bytes(expected_duration_secs);
    if size < minimum {
        return Err(ArtifactError::TooSmall { size, minimum });
    }
    Ok(size)
}

/// Orchestrator settings
#[derive(Debug, Clone, Copy)]
pub struct RecorderConfig {
    /// Play attempts in web-api mode
    pub max_retries: u32,
    /// How long to wait for the capture to start the track (external mode)
    pub start_timeout: StdDuration,
    /// Terminate-to-kill grace for the capture process
    pub grace: StdDuration,
    /// Passed through to the capture process
    pub verbose: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            start_timeout: StdDuration::from_secs(30),
            grace: DEFAULT_TERMINATE_GRACE,
            verbose: false,
        }
    }
}

/// Callbacks for status updates
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct RecordCallbacks {
    /// Called once the capture process is running
    pub on_capture_start: Option<Box<dyn Fn() + Send + Sync>>,
    /// Called when the requested track is confirmed playing
    pub on_playback_verified: Option<Box<dyn Fn() + Send + Sync>>,
    /// Called when the remote player moves on to another track
    pub on_track_change: Option<ChangeCallback>,
}

/// How the capture phase ended
#[derive(Debug)]
enum CaptureEnd {
    Exited(i32),
    /// Remote playback changed or stopped and the capture was stopped
    PlaybackEnded,
    Failed(RecordingErrorKind),
}

enum Watch {
    Exited(Result<i32, CaptureError>),
    Changed(Option<String>),
    Cancelled,
}

/// Records one track per request.
///
/// Without a monitor the capture process runs as an opaque black box and
/// only its exit code and output file are checked. With a monitor the
/// remote player is watched while the capture runs, and a track change or
/// stop ends the capture early. With a starter, playback is driven through
/// the Web API instead of by the capture process.
pub struct RecordingOrchestrator {
    capture: Arc<dyn CaptureLauncher>,
    monitor: Option<Arc<PlaybackMonitor>>,
    starter: Option<PlaybackStarter>,
    config: RecorderConfig,
    stop_flag: Arc<AtomicBool>,
}

impl RecordingOrchestrator {
    pub fn new(capture: Arc<dyn CaptureLauncher>, config: RecorderConfig) -> Self {
        Self {
            capture,
            monitor: None,
            starter: None,
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Watch remote playback while the capture process drives it
    pub fn with_observer(mut self, monitor: Arc<PlaybackMonitor>) -> Self {
        self.monitor = Some(monitor);
        self.starter = None;
        self
    }

    /// Drive playback through the Web API and watch it
    pub fn with_web_api(mut self, monitor: Arc<PlaybackMonitor>, starter: PlaybackStarter) -> Self {
        self.monitor = Some(monitor);
        self.starter = Some(starter);
        self
    }

    /// Get the stop flag for external signal handling
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Sweep stray capture helpers without a request in flight
    pub async fn cleanup(&self) {
        CaptureGuard::empty(Arc::clone(&self.capture), self.config.grace)
            .cleanup()
            .await;
    }

    /// Record `target` into `destination`
    pub async fn record_track(
        &self,
        target: &SyncTarget,
        destination: &Path,
        callbacks: RecordCallbacks,
    ) -> RecordingOutcome {
        self.stop_flag.store(false, Ordering::SeqCst);
        if let Some(monitor) = &self.monitor {
            monitor.reset_session().await;
        }

        let request = CaptureRequest {
            track: target.uri().clone(),
            destination: destination.to_path_buf(),
            expected_duration_secs: target.expected_duration_secs(),
            verbose: self.config.verbose,
        };

        tracing::info!(
            "Recording {} ({}s) to {}",
            request.track,
            request.expected_duration_secs,
            destination.display()
        );

        let mut guard =
            match CaptureGuard::launch(Arc::clone(&self.capture), &request, self.config.grace).await
            {
                Ok(guard) => guard,
                Err(e) => {
                    tracing::error!("Recording failed: {}", e);
                    self.cleanup().await;
                    return RecordingOutcome::failure(
                        destination,
                        RecordingErrorKind::CaptureProcessFailed,
                    );
                }
            };

        if let Some(cb) = &callbacks.on_capture_start {
            cb();
        }

        let end = self.supervise(target, &mut guard, callbacks).await;
        match end {
            CaptureEnd::Exited(0) | CaptureEnd::PlaybackEnded => {}
            CaptureEnd::Exited(code) => {
                tracing::error!("Recording failed with exit code {}", code);
                guard.cleanup().await;
                return RecordingOutcome::failure(
                    destination,
                    RecordingErrorKind::CaptureProcessFailed,
                );
            }
            CaptureEnd::Failed(kind) => {
                tracing::warn!("Recording aborted: {}", kind);
                guard.cleanup().await;
                return RecordingOutcome::failure(destination, kind);
            }
        }

        match verify_artifact(destination, request.expected_duration_secs).await {
            Ok(size) => {
                tracing::info!("Recorded {} bytes to {}", size, destination.display());
                RecordingOutcome::success(destination, size)
            }
            Err(e) => {
                tracing::error!("{}", e);
                guard.cleanup().await;
                let size = match e {
                    ArtifactError::TooSmall { size, .. } => size,
                    ArtifactError::Missing(_) => 0,
                };
                RecordingOutcome::failure_with_size(destination, e.kind(), size)
            }
        }
    }

    async fn supervise(
        &self,
        target: &SyncTarget,
        guard: &mut CaptureGuard,
        callbacks: RecordCallbacks,
    ) -> CaptureEnd {
        let RecordCallbacks {
            on_playback_verified,
            on_track_change,
            ..
        } = callbacks;

        let watching = if let Some(starter) = &self.starter {
            let started = tokio::select! {
                result = starter.start(target, self.config.max_retries) => result,
                exit = guard.wait() => return exited(exit),
                _ = self.cancelled() => return CaptureEnd::Failed(RecordingErrorKind::Interrupted),
            };
            if let Err(e) = started {
                return CaptureEnd::Failed(start_error_kind(&e));
            }
            true
        } else if let Some(monitor) = &self.monitor {
            let started = tokio::select! {
                started = monitor.wait_for_track_start(target.uri(), self.config.start_timeout) => started,
                exit = guard.wait() => return exited(exit),
                _ = self.cancelled() => return CaptureEnd::Failed(RecordingErrorKind::Interrupted),
            };
            if !started {
                tracing::warn!("Track start not observed, recording without change detection");
            }
            started
        } else {
            false
        };

        if watching {
            if let Some(cb) = &on_playback_verified {
                cb();
            }
        }

        let watch = async {
            match (&self.monitor, watching) {
                (Some(monitor), true) => monitor.monitor_until_change(on_track_change).await,
                _ => std::future::pending().await,
            }
        };

        let outcome = tokio::select! {
            exit = guard.wait() => Watch::Exited(exit),
            change = watch => Watch::Changed(change),
            _ = self.cancelled() => Watch::Cancelled,
        };

        match outcome {
            Watch::Exited(exit) => exited(exit),
            Watch::Changed(change) => {
                match change {
                    Some(uri) => tracing::info!("Playback moved on to {}, stopping capture", uri),
                    None => tracing::info!("Playback stopped, stopping capture"),
                }
                guard.cleanup().await;
                if self.stop_flag.load(Ordering::SeqCst) {
                    return CaptureEnd::Failed(RecordingErrorKind::Interrupted);
                }
                CaptureEnd::PlaybackEnded
            }
            Watch::Cancelled => CaptureEnd::Failed(RecordingErrorKind::Interrupted),
        }
    }

    /// Resolves once the stop flag is set
    async fn cancelled(&self) {
        let mut tick = interval(CANCEL_POLL_INTERVAL);
        loop {
            tick.tick().await;
            if self.stop_flag.load(Ordering::SeqCst) {
                tracing::info!("Stop requested");
                return;
            }
        }
    }
}

fn exited(exit: Result<i32, CaptureError>) -> CaptureEnd {
    match exit {
        Ok(code) => CaptureEnd::Exited(code),
        Err(e) => {
            tracing::error!("{}", e);
            CaptureEnd::Failed(RecordingErrorKind::CaptureProcessFailed)
        }
    }
}

fn start_error_kind(error: &StartError) -> RecordingErrorKind {
    match error {
        StartError::Device(DeviceError::Unreachable(_)) => RecordingErrorKind::RemoteUnavailable,
        StartError::Device(_) => RecordingErrorKind::DeviceNotFound,
        StartError::VerificationFailed(_) => RecordingErrorKind::StartVerificationFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use tempfile::TempDir;

    use crate::application::device::DeviceActivator;
    use crate::application::monitor::MonitorConfig;
    use crate::application::ports::RemoteError;
    use crate::application::source::PlaybackStateSource;
    use crate::application::starter::StartPolicy;
    use crate::application::testing::{playing, CaptureScript, FakeCapture, FakeLauncher, ScriptedApi};
    use crate::domain::recording::Duration;

    const X: &str = "spotify:track:xxxxxxxx";

    fn target(secs: u64) -> SyncTarget {
        SyncTarget::new(X.parse().unwrap(), Duration::from_secs(secs)).unwrap()
    }

    fn destination(dir: &TempDir) -> PathBuf {
        dir.path().join("song.mp3")
    }

    fn monitor(api: &Arc<ScriptedApi>) -> Arc<PlaybackMonitor> {
        Arc::new(PlaybackMonitor::new(
            PlaybackStateSource::new(api.clone()),
            MonitorConfig::default(),
        ))
    }

    fn web_api(
        capture: Arc<FakeCapture>,
        api: &Arc<ScriptedApi>,
        launcher: Arc<FakeLauncher>,
        config: RecorderConfig,
    ) -> RecordingOrchestrator {
        let monitor = monitor(api);
        let starter = PlaybackStarter::new(
            api.clone(),
            DeviceActivator::new(api.clone(), launcher),
            Arc::clone(&monitor),
            StartPolicy::default(),
        );
        RecordingOrchestrator::new(capture, config).with_web_api(monitor, starter)
    }

    #[tokio::test(start_paused = true)]
    async fn large_enough_output_succeeds() {
        let dir = TempDir::new().unwrap();
        let capture = FakeCapture::new(CaptureScript::finishing(4_000_000));
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.file_size_bytes, 4_000_000);
        assert_eq!(outcome.error_kind, None);
        assert_eq!(capture.events(), vec!["launch"]);

        let request = &capture.requests()[0];
        assert_eq!(request.expected_duration_secs, 180);
        assert_eq!(request.track.as_uri(), X);
    }

    #[tokio::test(start_paused = true)]
    async fn undersized_output_is_rejected() {
        let dir = TempDir::new().unwrap();
        let capture = FakeCapture::new(CaptureScript::finishing(3_000_000));
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_kind, Some(RecordingErrorKind::OutputTooSmall));
        assert_eq!(outcome.file_size_bytes, 3_000_000);
        assert_eq!(capture.sweeps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_output_is_reported() {
        let dir = TempDir::new().unwrap();
        let script = CaptureScript {
            output_bytes: None,
            ..CaptureScript::finishing(0)
        };
        let capture = FakeCapture::new(script);
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(10), &destination(&dir), RecordCallbacks::default())
            .await;

        assert_eq!(outcome.error_kind, Some(RecordingErrorKind::OutputMissing));
        assert_eq!(capture.sweeps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_zero_exit_fails_even_with_output() {
        let dir = TempDir::new().unwrap();
        let capture = FakeCapture::new(CaptureScript::finishing(4_000_000).with_exit_code(1));
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert_eq!(outcome.error_kind, Some(RecordingErrorKind::CaptureProcessFailed));
        assert_eq!(capture.events(), vec!["launch", "sweep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn launch_failure_still_sweeps() {
        let dir = TempDir::new().unwrap();
        let capture = FakeCapture::failing_launch();
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert_eq!(outcome.error_kind, Some(RecordingErrorKind::CaptureProcessFailed));
        assert_eq!(capture.sweeps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_flag_interrupts_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let capture = FakeCapture::new(CaptureScript::endless());
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        let flag = recorder.stop_flag();
        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_secs(5)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert!(outcome.was_interrupted());
        assert_eq!(capture.events(), vec!["launch", "terminate", "sweep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn observed_track_change_stops_capture_gracefully() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        api.push_playback(Ok(Some(playing(X, 500))));
        api.push_playback(Ok(Some(playing(X, 60_000))));
        api.push_playback(Ok(Some(playing("spotify:track:next", 0))));

        let capture = FakeCapture::new(CaptureScript::endless().with_output(4_000_000));
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default())
            .with_observer(monitor(&api));

        let changes = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&changes);
        let callbacks = RecordCallbacks {
            on_track_change: Some(Box::new(move |uri: &str, _: &crate::domain::playback::PlaybackSnapshot| {
                assert_eq!(uri, "spotify:track:next");
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), callbacks)
            .await;

        assert!(outcome.succeeded);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(capture.events(), vec!["launch", "terminate", "sweep"]);
        assert_eq!(capture.sweeps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unobserved_start_lets_capture_run_to_completion() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        api.push_playback(Ok(Some(playing("spotify:track:other", 100))));

        let script = CaptureScript {
            run_for: Some(StdDuration::from_secs(60)),
            ..CaptureScript::finishing(4_000_000)
        };
        let capture = FakeCapture::new(script);
        let config = RecorderConfig {
            start_timeout: StdDuration::from_secs(5),
            ..RecorderConfig::default()
        };
        let recorder = RecordingOrchestrator::new(capture.clone(), config).with_observer(monitor(&api));

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert!(outcome.succeeded);
        assert_eq!(capture.events(), vec!["launch"]);
    }

    #[tokio::test(start_paused = true)]
    async fn web_api_records_until_playback_stops() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        api.push_playback(Ok(Some(playing(X, 1900))));
        api.push_playback(Ok(None));

        let capture = FakeCapture::new(CaptureScript::endless().with_output(4_000_000));
        let recorder = web_api(capture.clone(), &api, FakeLauncher::ok(), RecorderConfig::default());

        let verified = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&verified);
        let callbacks = RecordCallbacks {
            on_playback_verified: Some(Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), callbacks)
            .await;

        assert!(outcome.succeeded);
        assert_eq!(verified.load(Ordering::SeqCst), 1);
        assert_eq!(api.start_calls(), vec![(X.to_string(), 0)]);
        assert_eq!(capture.events(), vec!["launch", "terminate", "sweep"]);
        assert_eq!(capture.sweeps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn web_api_verification_failure_cleans_up() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        let capture = FakeCapture::new(CaptureScript::endless());
        let config = RecorderConfig {
            max_retries: 2,
            ..RecorderConfig::default()
        };
        let recorder = web_api(capture.clone(), &api, FakeLauncher::ok(), config);

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert_eq!(
            outcome.error_kind,
            Some(RecordingErrorKind::StartVerificationFailed)
        );
        assert_eq!(api.start_calls().len(), 2);
        assert_eq!(capture.events(), vec!["launch", "terminate", "sweep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn web_api_without_device_fails_request() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        api.push_devices(Ok(vec![]));
        let capture = FakeCapture::new(CaptureScript::endless());
        let recorder = web_api(capture.clone(), &api, FakeLauncher::failing(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert_eq!(outcome.error_kind, Some(RecordingErrorKind::DeviceNotFound));
        assert!(api.start_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn web_api_silent_remote_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new();
        api.push_devices(Err(RemoteError::RequestFailed("connection refused".to_string())));
        let capture = FakeCapture::new(CaptureScript::endless());
        let recorder = web_api(capture.clone(), &api, FakeLauncher::ok(), RecorderConfig::default());

        let outcome = recorder
            .record_track(&target(180), &destination(&dir), RecordCallbacks::default())
            .await;

        assert_eq!(outcome.error_kind, Some(RecordingErrorKind::RemoteUnavailable));
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let capture = FakeCapture::new(CaptureScript::endless());
        let recorder = RecordingOrchestrator::new(capture.clone(), RecorderConfig::default());

        recorder.cleanup().await;
        recorder.cleanup().await;
        assert_eq!(capture.sweeps(), 2);
    }

    #[tokio::test]
    async fn verify_artifact_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = destination(&dir);

        assert_eq!(
            verify_artifact(&path, 180).await,
            Err(ArtifactError::Missing(path.clone()))
        );

        std::fs::write(&path, vec![0u8; 3_600_000]).unwrap();
        assert_eq!(verify_artifact(&path, 180).await, Ok(3_600_000));
        assert_eq!(
            verify_artifact(&path, 181).await,
            Err(ArtifactError::TooSmall {
                size: 3_600_000,
                minimum: 3_620_000
            })
        );
    }
}
