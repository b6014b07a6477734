//! Spotify Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use spotify_recorder::cli::{
    app::{init_logging, load_merged_config, run_cleanup, run_devices, run_record},
    args::{Cli, Commands, RecordOptions, RecordSelection},
    config_cmd::handle_config_command,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use spotify_recorder::domain::config::AppConfig;
use spotify_recorder::domain::recording::Duration;
use spotify_recorder::domain::track::SpotifyRef;
use spotify_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let mut cli = Cli::parse();
    let presenter = Presenter::new();
    init_logging(cli.verbose);

    // Handle subcommands
    match cli.command.take() {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices {
            wait,
            check,
            access_token,
        }) => {
            let wait = match wait.as_deref().map(str::parse::<Duration>).transpose() {
                Ok(wait) => wait,
                Err(e) => {
                    presenter.error(&format!("Invalid wait: {}", e));
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            };
            let config = load_merged_config(AppConfig {
                access_token,
                ..Default::default()
            })
            .await;
            return run_devices(wait, check, config).await;
        }
        Some(Commands::Cleanup) => {
            let config = load_merged_config(AppConfig::empty()).await;
            return run_cleanup(config).await;
        }
        None => {}
    }

    let selection = match (cli.track.as_deref(), cli.search.take()) {
        (_, Some(query)) if query.trim().is_empty() => {
            presenter.error("Search query is empty");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        (_, Some(query)) => RecordSelection::Search(query.trim().to_string()),
        (Some(input), None) => match input.parse::<SpotifyRef>() {
            Ok(reference) => RecordSelection::Reference(reference),
            Err(e) => {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        (None, None) => {
            presenter.error(
                "Missing TRACK. Usage: spotify-recorder <TRACK|ALBUM|PLAYLIST> [-o FILE] [-d TIME], or --search <QUERY>",
            );
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    if matches!(selection, RecordSelection::Reference(SpotifyRef::Collection(_)))
        && (cli.output.is_some() || cli.duration.is_some())
    {
        presenter.error("--output and --duration apply to single tracks; album and playlist tracks are saved under output_dir");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let duration = match cli.duration.as_deref().map(str::parse::<Duration>).transpose() {
        Ok(duration) => duration,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        access_token: cli.access_token.clone(),
        playback_control: cli.playback_control().map(|mode| mode.to_string()),
        ..Default::default()
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    let options = RecordOptions {
        selection,
        output: cli.output.clone(),
        duration,
        verbose: cli.verbose,
    };

    run_record(options, config).await
}
