//! Desktop player launcher port interface

use thiserror::Error;

/// Launch errors
#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    #[error("Player not found (tried: {0})")]
    NotFound(String),

    #[error("Failed to start player: {0}")]
    SpawnFailed(String),
}

/// Port for starting the desktop player application.
///
/// Only spawn success matters; the player is left running on its own.
pub trait PlayerLauncher: Send + Sync {
    fn launch(&self) -> Result<(), LaunchError>;
}
