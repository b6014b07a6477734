//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like the Spotify Web API,
//! the desktop player and the capture script.

pub mod capture;
pub mod config;
pub mod player;
pub mod spotify;

// Re-export adapters
pub use capture::ScriptCapture;
pub use config::XdgConfigStore;
pub use player::DesktopPlayerLauncher;
pub use spotify::WebApiClient;
