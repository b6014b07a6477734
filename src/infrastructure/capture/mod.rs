//! Capture process infrastructure module

mod script;

pub use script::ScriptCapture;
