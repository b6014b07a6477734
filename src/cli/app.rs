//! App runners for recording, device checks and cleanup

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::{interval, Instant};
use tracing_subscriber::EnvFilter;

use crate::application::ports::{ConfigStore, PlaybackApi};
use crate::application::{
    DeviceActivator, MonitorConfig, PlaybackMonitor, PlaybackStarter, PlaybackStateSource,
    RecordCallbacks, RecorderConfig, RecordingOrchestrator, StartPolicy,
};
use crate::domain::config::{AppConfig, PlaybackControl};
use crate::domain::playback::{CatalogTrack, PlaybackSnapshot, SyncTarget, TrackInfo};
use crate::domain::recording::{Duration, RecordingOutcome};
use crate::domain::track::{CollectionKind, SpotifyRef, TrackUri};
use crate::infrastructure::{DesktopPlayerLauncher, ScriptCapture, WebApiClient, XdgConfigStore};

use super::args::{RecordOptions, RecordSelection};
use super::presenter::{format_progress, Presenter};
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_INTERRUPTED: u8 = 130;

const MISSING_TOKEN: &str = "Set SPOTIFY_ACCESS_TOKEN or run 'spotify-recorder config set access_token <token>'";

/// Install the tracing subscriber. Logs go to stderr; `RUST_LOG` wins over
/// the verbosity flag.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,spotify_recorder=debug"
    } else {
        "warn"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Build env config
    let env_config = AppConfig {
        access_token: env::var("SPOTIFY_ACCESS_TOKEN").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

fn web_api_client(config: &AppConfig) -> Option<Arc<WebApiClient>> {
    config
        .access_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|token| Arc::new(WebApiClient::with_base_url(token, config.api_base_url_or_default())))
}

fn player_launcher(config: &AppConfig) -> Arc<DesktopPlayerLauncher> {
    Arc::new(DesktopPlayerLauncher::new(config.player_commands_or_default()))
}

fn capture(config: &AppConfig) -> Arc<ScriptCapture> {
    Arc::new(ScriptCapture::new(
        config.capture_command_or_default(),
        config.helper_process_or_default(),
    ))
}

/// Default destination: `<output_dir>/<artists> - <title>.mp3`, or the
/// track id when no metadata is available
pub fn default_destination(output_dir: PathBuf, track: &TrackUri, info: Option<&TrackInfo>) -> PathBuf {
    let stem = info
        .map(TrackInfo::file_stem)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| track.id().to_string());
    output_dir.join(format!("{}.mp3", stem))
}

/// One track queued for recording
#[derive(Debug, Clone)]
struct PlannedTrack {
    track: TrackUri,
    info: Option<TrackInfo>,
}

impl PlannedTrack {
    fn label(&self) -> String {
        self.info
            .as_ref()
            .map(TrackInfo::file_stem)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.track.to_string())
    }
}

impl From<CatalogTrack> for PlannedTrack {
    fn from(entry: CatalogTrack) -> Self {
        Self {
            track: entry.uri,
            info: Some(entry.info),
        }
    }
}

/// Turn the selection into the tracks to record, or the exit code to stop with
async fn plan_tracks(
    options: &RecordOptions,
    api: Option<&WebApiClient>,
    presenter: &Presenter,
) -> Result<Vec<PlannedTrack>, ExitCode> {
    let needs_api = |what: &str| {
        presenter.error(&format!("{} needs an access token. {}", what, MISSING_TOKEN));
        ExitCode::from(EXIT_USAGE_ERROR)
    };

    match &options.selection {
        RecordSelection::Reference(SpotifyRef::Track(track)) => {
            // Metadata is needed for the duration and for a default file name
            if options.duration.is_some() && options.output.is_some() {
                return Ok(vec![PlannedTrack {
                    track: track.clone(),
                    info: None,
                }]);
            }
            let info = match api {
                Some(api) => match api.track(track).await {
                    Ok(info) => Some(info),
                    Err(e) if options.duration.is_none() => {
                        presenter.error(&format!("Cannot look up track {}: {}", track, e));
                        return Err(ExitCode::from(EXIT_ERROR));
                    }
                    Err(e) => {
                        tracing::warn!("Track lookup failed: {}", e);
                        None
                    }
                },
                None => None,
            };
            Ok(vec![PlannedTrack {
                track: track.clone(),
                info,
            }])
        }
        RecordSelection::Reference(SpotifyRef::Collection(collection)) => {
            let Some(api) = api else {
                let what = match collection.kind() {
                    CollectionKind::Album => "Recording an album",
                    CollectionKind::Playlist => "Recording a playlist",
                };
                return Err(needs_api(what));
            };
            let tracks = api.collection_tracks(collection).await.map_err(|e| {
                presenter.error(&format!("Cannot list {}: {}", collection, e));
                ExitCode::from(EXIT_ERROR)
            })?;
            if tracks.is_empty() {
                presenter.error(&format!("No playable tracks in {}", collection));
                return Err(ExitCode::from(EXIT_ERROR));
            }
            presenter.info(&format!(
                "{} tracks in {} {}",
                tracks.len(),
                collection.kind(),
                collection.id()
            ));
            Ok(tracks.into_iter().map(PlannedTrack::from).collect())
        }
        RecordSelection::Search(query) => {
            let Some(api) = api else {
                return Err(needs_api("Searching"));
            };
            let found = api.search_tracks(query, 1).await.map_err(|e| {
                presenter.error(&format!("Search failed: {}", e));
                ExitCode::from(EXIT_ERROR)
            })?;
            let Some(best) = found.into_iter().next() else {
                presenter.error(&format!("No track matches \"{}\"", query));
                return Err(ExitCode::from(EXIT_ERROR));
            };
            presenter.info(&format!("Found {} ({})", best.info.file_stem(), best.uri));
            Ok(vec![best.into()])
        }
    }
}

fn build_orchestrator(
    api: Option<Arc<WebApiClient>>,
    mode: PlaybackControl,
    config: &AppConfig,
    verbose: bool,
) -> RecordingOrchestrator {
    let recorder_config = RecorderConfig {
        max_retries: config.max_retries_or_default(),
        start_timeout: config.start_timeout_or_default().as_std(),
        grace: config.grace_or_default(),
        verbose,
    };

    let orchestrator = RecordingOrchestrator::new(capture(config), recorder_config);
    let Some(api) = api else {
        return orchestrator;
    };

    let api: Arc<dyn PlaybackApi> = api;
    let monitor = Arc::new(PlaybackMonitor::new(
        PlaybackStateSource::new(Arc::clone(&api)),
        MonitorConfig {
            poll_interval: config.poll_interval_or_default(),
            ..MonitorConfig::default()
        },
    ));

    match mode {
        PlaybackControl::External => orchestrator.with_observer(monitor),
        PlaybackControl::WebApi => {
            let devices = DeviceActivator::new(Arc::clone(&api), player_launcher(config));
            let policy = StartPolicy {
                device_wait: config.device_wait_or_default().as_std(),
                ..StartPolicy::default()
            };
            let starter = PlaybackStarter::new(api, devices, Arc::clone(&monitor), policy);
            orchestrator.with_web_api(monitor, starter)
        }
    }
}

/// Record one planned track with a progress spinner
async fn record_planned(
    orchestrator: &RecordingOrchestrator,
    presenter: &mut Presenter,
    target: &SyncTarget,
    destination: &Path,
    label: &str,
) -> RecordingOutcome {
    let duration = target.expected_duration();
    presenter.info(&format!(
        "Recording {} ({}) to {}",
        label,
        duration,
        destination.display()
    ));
    presenter.start_spinner("Starting capture...");

    let progress = presenter.spinner_handle().map(|bar| {
        let total_ms = duration.as_millis();
        tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = interval(StdDuration::from_millis(500));
            loop {
                ticker.tick().await;
                let elapsed = started.elapsed().as_millis() as u64;
                bar.set_message(format!("Recording... {}", format_progress(elapsed, total_ms)));
            }
        })
    });

    let callbacks = RecordCallbacks {
        on_playback_verified: Some(Box::new(|| {
            tracing::info!("Playback confirmed");
        })),
        on_track_change: Some(Box::new(|uri: &str, _: &PlaybackSnapshot| {
            tracing::info!("Player moved on to {}", uri);
        })),
        ..Default::default()
    };

    let outcome = orchestrator.record_track(target, destination, callbacks).await;

    if let Some(task) = progress {
        task.abort();
    }

    let summary = presenter.format_outcome(&outcome);
    if outcome.succeeded {
        presenter.spinner_success(&summary);
        presenter.output(&outcome.file_path.to_string_lossy());
    } else if outcome.was_interrupted() {
        presenter.stop_spinner();
    } else {
        presenter.spinner_fail(&summary);
    }
    outcome
}

/// Exit code for a finished run of `attempted` tracks
pub fn batch_exit_code(attempted: usize, failed: usize, interrupted: bool) -> u8 {
    if interrupted {
        EXIT_INTERRUPTED
    } else if failed > 0 || attempted == 0 {
        EXIT_ERROR
    } else {
        EXIT_SUCCESS
    }
}

/// Record a track, every track of an album or playlist, or the best search
/// match. Tracks are recorded one after another; a failed track does not
/// stop the run, an interrupt does.
pub async fn run_record(options: RecordOptions, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let api = web_api_client(&config);
    let mode = config.playback_control_or_default();

    if mode == PlaybackControl::WebApi && api.is_none() {
        presenter.error(&format!(
            "Playback control 'web-api' needs an access token. {}",
            MISSING_TOKEN
        ));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let planned = match plan_tracks(&options, api.as_deref(), &presenter).await {
        Ok(planned) => planned,
        Err(code) => return code,
    };
    let single = planned.len() == 1;

    if single && options.duration.is_none() && planned[0].info.is_none() {
        presenter.error(&format!(
            "--duration is required without Web API access. {}",
            MISSING_TOKEN
        ));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let orchestrator = build_orchestrator(api, mode, &config, options.verbose);

    // Setup signal handler
    let shutdown = ShutdownSignal::with_flag(orchestrator.stop_flag());
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let total = planned.len();
    let mut attempted = 0;
    let mut failed = Vec::new();
    let mut interrupted = false;

    for (index, item) in planned.iter().enumerate() {
        if shutdown.is_shutdown() {
            interrupted = true;
            break;
        }

        let label = item.label();
        if !single {
            presenter.info(&format!("[{}/{}] {}", index + 1, total, label));
        }
        attempted += 1;

        let duration = options
            .duration
            .or_else(|| item.info.as_ref().map(|info| Duration::from_millis(info.duration_ms)))
            .unwrap_or(Duration::from_millis(0));
        let target = match SyncTarget::new(item.track.clone(), duration) {
            Ok(target) => target,
            Err(e) if single => {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
            Err(e) => {
                presenter.error(&format!("Skipping {}: {}", label, e));
                failed.push(label);
                continue;
            }
        };

        let destination = match (&options.output, single) {
            (Some(output), true) => output.clone(),
            _ => default_destination(config.output_dir_or_default(), &item.track, item.info.as_ref()),
        };

        let outcome = record_planned(&orchestrator, &mut presenter, &target, &destination, &label).await;
        if outcome.was_interrupted() {
            interrupted = true;
            break;
        }
        if !outcome.succeeded {
            failed.push(label);
        }
    }

    if interrupted {
        presenter.warn("Recording interrupted");
    } else if !single {
        let recorded = attempted - failed.len();
        if failed.is_empty() {
            presenter.success(&format!("Recorded {} of {} tracks", recorded, total));
        } else {
            presenter.error(&format!(
                "Recorded {} of {} tracks; failed: {}",
                recorded,
                total,
                failed.join(", ")
            ));
        }
    }

    ExitCode::from(batch_exit_code(attempted, failed.len(), interrupted))
}

/// Pre-flight check: make sure a playback device is available.
///
/// With `check_only` nothing is printed on success and the exit code is
/// the answer.
pub async fn run_devices(wait: Option<Duration>, check_only: bool, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let Some(api) = web_api_client(&config) else {
        presenter.error(&format!("Device check needs an access token. {}", MISSING_TOKEN));
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    let max_wait = wait.unwrap_or_else(|| config.device_wait_or_default());
    let activator = DeviceActivator::new(api, player_launcher(&config));

    if check_only {
        return if activator.is_device_ready(max_wait.as_std()).await {
            ExitCode::from(EXIT_SUCCESS)
        } else {
            ExitCode::from(EXIT_ERROR)
        };
    }

    presenter.start_spinner("Looking for playback devices...");
    match activator.ensure_active(max_wait.as_std()).await {
        Ok(devices) => {
            presenter.spinner_success(&format!("{} device(s) available", devices.len()));
            for device in &devices {
                presenter.output(&presenter.format_device(device));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Terminate stray capture helpers
pub async fn run_cleanup(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let recorder_config = RecorderConfig {
        grace: config.grace_or_default(),
        ..RecorderConfig::default()
    };

    RecordingOrchestrator::new(capture(&config), recorder_config)
        .cleanup()
        .await;
    presenter.success(&format!(
        "Stopped any stray {} processes",
        config.helper_process_or_default()
    ));
    ExitCode::from(EXIT_SUCCESS)
}
