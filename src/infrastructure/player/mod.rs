//! Desktop player infrastructure module

mod desktop;

pub use desktop::DesktopPlayerLauncher;
