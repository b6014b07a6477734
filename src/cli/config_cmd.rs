//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, CaptureConfig, PlaybackControl, PlayerConfig};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    validate_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    let shown = if key == "access_token" {
        mask_token(value)
    } else {
        value.to_string()
    };
    presenter.success(&format!("{} = {}", key, shown));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    validate_key(key)?;

    let config = store.load().await?;
    presenter.output(&display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(
            key,
            &display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()),
        );
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn validate_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "access_token" => config.access_token = Some(value.to_string()),
        "api_base_url" => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(invalid(key, "Value must be an http(s) URL"));
            }
            config.api_base_url = Some(value.trim_end_matches('/').to_string());
        }
        "output_dir" => config.output_dir = Some(value.to_string()),
        "playback_control" => {
            let mode = value
                .parse::<PlaybackControl>()
                .map_err(|e| invalid(key, e.to_string()))?;
            config.playback_control = Some(mode.to_string());
        }
        "poll_interval_ms" => config.poll_interval_ms = Some(parse_number(key, value)?),
        "start_timeout" => config.start_timeout = Some(parse_duration(key, value)?),
        "device_wait" => config.device_wait = Some(parse_duration(key, value)?),
        "max_retries" => {
            let retries: u32 = parse_number(key, value)?;
            if retries == 0 {
                return Err(invalid(key, "Value must be at least 1"));
            }
            config.max_retries = Some(retries);
        }
        "capture.command" => capture_mut(config).command = Some(value.to_string()),
        "capture.helper_process" => capture_mut(config).helper_process = Some(value.to_string()),
        "capture.grace_ms" => capture_mut(config).grace_ms = Some(parse_number(key, value)?),
        "player.commands" => {
            let commands: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            if commands.is_empty() {
                return Err(invalid(key, "Value must list at least one command"));
            }
            config
                .player
                .get_or_insert_with(PlayerConfig::default)
                .commands = Some(commands);
        }
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn capture_mut(config: &mut AppConfig) -> &mut CaptureConfig {
    config.capture.get_or_insert_with(CaptureConfig::default)
}

/// Value of `key` as shown to the user; the access token is masked
fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    let capture = config.capture.as_ref();
    match key {
        "access_token" => config.access_token.as_deref().map(mask_token),
        "api_base_url" => config.api_base_url.clone(),
        "output_dir" => config.output_dir.clone(),
        "playback_control" => config.playback_control.clone(),
        "poll_interval_ms" => config.poll_interval_ms.map(|v| v.to_string()),
        "start_timeout" => config.start_timeout.clone(),
        "device_wait" => config.device_wait.clone(),
        "max_retries" => config.max_retries.map(|v| v.to_string()),
        "capture.command" => capture.and_then(|c| c.command.clone()),
        "capture.helper_process" => capture.and_then(|c| c.helper_process.clone()),
        "capture.grace_ms" => capture.and_then(|c| c.grace_ms).map(|v| v.to_string()),
        "player.commands" => config
            .player
            .as_ref()
            .and_then(|p| p.commands.as_ref())
            .map(|c| c.join(", ")),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, "Value must be a non-negative integer"))
}

fn parse_duration(key: &str, value: &str) -> Result<String, ConfigError> {
    value
        .parse::<Duration>()
        .map(|d| d.to_string())
        .map_err(|e| invalid(key, e.to_string()))
}

/// Mask a token for display (show first 4 and last 4 chars)
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
