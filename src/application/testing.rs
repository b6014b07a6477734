//! Scripted fakes of the ports for unit tests

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;

use crate::domain::playback::{CatalogTrack, Device, PlaybackSnapshot, TrackInfo};
use crate::domain::track::TrackUri;

use super::ports::{
    CaptureError, CaptureHandle, CaptureLauncher, CaptureRequest, LaunchError, PlaybackApi,
    PlayerLauncher, RemoteError,
};

pub fn playing(uri: &str, progress_ms: u64) -> PlaybackSnapshot {
    PlaybackSnapshot {
        track_uri: uri.to_string(),
        track_id: uri.rsplit(':').next().unwrap_or_default().to_string(),
        is_playing: true,
        progress_ms,
        duration_ms: 180_000,
    }
}

pub fn device(name: &str) -> Device {
    Device {
        id: Some(format!("{name}-id")),
        name: name.to_string(),
        kind: "Computer".to_string(),
        is_active: true,
    }
}

/// Queue of scripted responses; the last one repeats once the queue drains
struct Script<T: Clone> {
    queue: VecDeque<T>,
    last: T,
}

impl<T: Clone> Script<T> {
    fn new(initial: T) -> Self {
        Self {
            queue: VecDeque::new(),
            last: initial,
        }
    }

    fn push(&mut self, value: T) {
        self.queue.push_back(value);
    }

    fn next(&mut self) -> T {
        if let Some(value) = self.queue.pop_front() {
            self.last = value;
        }
        self.last.clone()
    }
}

type PlaybackResult = Result<Option<PlaybackSnapshot>, RemoteError>;
type DevicesResult = Result<Vec<Device>, RemoteError>;

pub struct ScriptedApi {
    playback: Mutex<Script<PlaybackResult>>,
    devices: Mutex<Script<DevicesResult>>,
    start_result: Mutex<Result<(), RemoteError>>,
    playback_calls: AtomicUsize,
    device_calls: AtomicUsize,
    start_calls: Mutex<Vec<(String, u64)>>,
    latency: Mutex<StdDuration>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            playback: Mutex::new(Script::new(Ok(None))),
            devices: Mutex::new(Script::new(Ok(vec![device("desktop")]))),
            start_result: Mutex::new(Ok(())),
            playback_calls: AtomicUsize::new(0),
            device_calls: AtomicUsize::new(0),
            start_calls: Mutex::new(Vec::new()),
            latency: Mutex::new(StdDuration::ZERO),
        })
    }

    /// Delay every playback and device read by `latency`
    pub fn set_latency(&self, latency: StdDuration) {
        *self.latency.lock().unwrap() = latency;
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    pub fn push_playback(&self, result: PlaybackResult) {
        self.playback.lock().unwrap().push(result);
    }

    pub fn push_devices(&self, result: DevicesResult) {
        self.devices.lock().unwrap().push(result);
    }

    pub fn fail_start(&self, error: RemoteError) {
        *self.start_result.lock().unwrap() = Err(error);
    }

    pub fn playback_calls(&self) -> usize {
        self.playback_calls.load(Ordering::SeqCst)
    }

    pub fn device_calls(&self) -> usize {
        self.device_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> Vec<(String, u64)> {
        self.start_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaybackApi for ScriptedApi {
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, RemoteError> {
        self.playback_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.playback.lock().unwrap().next()
    }

    async fn devices(&self) -> Result<Vec<Device>, RemoteError> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.devices.lock().unwrap().next()
    }

    async fn start_playback(&self, uri: &TrackUri, position_ms: u64) -> Result<(), RemoteError> {
        self.start_calls
            .lock()
            .unwrap()
            .push((uri.to_string(), position_ms));
        self.start_result.lock().unwrap().clone()
    }

    async fn track(&self, _uri: &TrackUri) -> Result<TrackInfo, RemoteError> {
        Ok(TrackInfo {
            name: "Song".to_string(),
            artists: vec!["Artist".to_string()],
            duration_ms: 180_000,
        })
    }

    async fn album_tracks(&self, _album_id: &str) -> Result<Vec<CatalogTrack>, RemoteError> {
        Ok(Vec::new())
    }

    async fn playlist_tracks(&self, _playlist_id: &str) -> Result<Vec<CatalogTrack>, RemoteError> {
        Ok(Vec::new())
    }

    async fn search_tracks(&self, _query: &str, _limit: u32) -> Result<Vec<CatalogTrack>, RemoteError> {
        Ok(Vec::new())
    }
}

pub struct FakeLauncher {
    fail: bool,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            launches: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            launches: AtomicUsize::new(0),
        })
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl PlayerLauncher for FakeLauncher {
    fn launch(&self) -> Result<(), LaunchError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(LaunchError::NotFound("spotify".to_string()))
        } else {
            Ok(())
        }
    }
}

/// How a fake capture behaves once launched
#[derive(Debug, Clone)]
pub struct CaptureScript {
    /// Bytes written to the destination when the capture finishes
    pub output_bytes: Option<usize>,
    pub exit_code: i32,
    /// Run time before exiting; `None` runs until signalled
    pub run_for: Option<StdDuration>,
    /// Whether SIGTERM stops it (otherwise only SIGKILL does)
    pub honors_terminate: bool,
}

impl CaptureScript {
    pub fn finishing(output_bytes: usize) -> Self {
        Self {
            output_bytes: Some(output_bytes),
            exit_code: 0,
            run_for: Some(StdDuration::from_secs(1)),
            honors_terminate: true,
        }
    }

    pub fn endless() -> Self {
        Self {
            output_bytes: None,
            exit_code: 0,
            run_for: None,
            honors_terminate: true,
        }
    }

    pub fn with_output(mut self, output_bytes: usize) -> Self {
        self.output_bytes = Some(output_bytes);
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn ignoring_terminate(mut self) -> Self {
        self.honors_terminate = false;
        self
    }
}

/// Shared log of what happened to fake captures
#[derive(Default)]
pub struct CaptureLog {
    pub requests: Vec<CaptureRequest>,
    pub events: Vec<&'static str>,
    pub sweeps: usize,
}

pub struct FakeCapture {
    script: CaptureScript,
    fail_launch: bool,
    log: Arc<Mutex<CaptureLog>>,
}

impl FakeCapture {
    pub fn new(script: CaptureScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail_launch: false,
            log: Arc::new(Mutex::new(CaptureLog::default())),
        })
    }

    pub fn failing_launch() -> Arc<Self> {
        Arc::new(Self {
            script: CaptureScript::endless(),
            fail_launch: true,
            log: Arc::new(Mutex::new(CaptureLog::default())),
        })
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().events.clone()
    }

    pub fn sweeps(&self) -> usize {
        self.log.lock().unwrap().sweeps
    }

    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.log.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl CaptureLauncher for FakeCapture {
    async fn launch(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let mut log = self.log.lock().unwrap();
        log.requests.push(request.clone());
        if self.fail_launch {
            return Err(CaptureError::CommandNotFound("spotdl.sh".to_string()));
        }
        log.events.push("launch");
        Ok(Box::new(FakeHandle {
            script: self.script.clone(),
            destination: request.destination.clone(),
            alive: true,
            stopped: false,
            log: Arc::clone(&self.log),
        }))
    }

    async fn sweep_strays(&self) {
        let mut log = self.log.lock().unwrap();
        log.sweeps += 1;
        log.events.push("sweep");
    }
}

struct FakeHandle {
    script: CaptureScript,
    destination: PathBuf,
    alive: bool,
    stopped: bool,
    log: Arc<Mutex<CaptureLog>>,
}

impl FakeHandle {
    fn finish(&mut self) {
        self.alive = false;
        if let Some(bytes) = self.script.output_bytes {
            let _ = std::fs::write(&self.destination, vec![0u8; bytes]);
        }
    }
}

#[async_trait]
impl CaptureHandle for FakeHandle {
    async fn wait(&mut self) -> Result<i32, CaptureError> {
        if self.stopped {
            self.alive = false;
            return Ok(143);
        }
        match self.script.run_for {
            Some(run_for) => {
                tokio::time::sleep(run_for).await;
                self.finish();
                Ok(self.script.exit_code)
            }
            None => std::future::pending().await,
        }
    }

    fn terminate(&mut self) -> Result<(), CaptureError> {
        self.log.lock().unwrap().events.push("terminate");
        if self.script.honors_terminate && self.alive {
            // A graceful stop finalizes whatever was captured so far
            self.finish();
            self.stopped = true;
        }
        Ok(())
    }

    fn kill(&mut self) -> Result<(), CaptureError> {
        self.log.lock().unwrap().events.push("kill");
        self.stopped = true;
        self.alive = false;
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        self.alive
    }
}
