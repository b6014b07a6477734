//! Desktop player launcher adapter

use std::process::Stdio;

use tokio::process::Command;

use crate::application::ports::{LaunchError, PlayerLauncher};
use crate::domain::config::DEFAULT_PLAYER_COMMANDS;

/// Spawns the desktop player, trying each candidate command in order.
///
/// The player is detached: it keeps running after the recorder exits.
/// While the recorder runs, a background task waits on it so an early exit
/// is reaped. Must be called inside a tokio runtime.
pub struct DesktopPlayerLauncher {
    commands: Vec<String>,
}

impl DesktopPlayerLauncher {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl Default for DesktopPlayerLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER_COMMANDS.iter().map(|c| c.to_string()).collect())
    }
}

impl PlayerLauncher for DesktopPlayerLauncher {
    fn launch(&self) -> Result<(), LaunchError> {
        for command in &self.commands {
            let spawned = Command::new(command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(mut child) => {
                    tracing::info!("Started player: {}", command);
                    let name = command.clone();
                    tokio::spawn(async move {
                        match child.wait().await {
                            Ok(status) => tracing::debug!("Player {} exited: {}", name, status),
                            Err(e) => tracing::debug!("Lost track of player {}: {}", name, e),
                        }
                    });
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!("Player command not found: {}", command);
                }
                Err(e) => return Err(LaunchError::SpawnFailed(format!("{}: {}", command, e))),
            }
        }

        Err(LaunchError::NotFound(self.commands.join(", ")))
    }
}
