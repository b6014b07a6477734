//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::playback::Device;
use crate::domain::recording::RecordingOutcome;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Handle to the active spinner, for updates from other tasks
    pub fn spinner_handle(&self) -> Option<ProgressBar> {
        self.spinner.clone()
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) if !spinner.is_hidden() => {
                spinner.finish_with_message(format!("{} {}", "✓".green(), message));
            }
            // Not a terminal: the spinner never draws
            _ => self.success(message),
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) if !spinner.is_hidden() => {
                spinner.finish_with_message(format!("{} {}", "✗".red(), message));
            }
            _ => self.error(message),
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (the recorded file path, device names)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Format recording progress bar
    pub fn format_progress(&self, elapsed_ms: u64, total_ms: u64) -> String {
        format_progress(elapsed_ms, total_ms)
    }

    /// One line describing a playback device
    pub fn format_device(&self, device: &Device) -> String {
        let marker = if device.is_active {
            "●".green()
        } else {
            "○".normal()
        };
        format!("{} {} ({})", marker, device.name, device.kind)
    }

    /// Summary line for a finished recording
    pub fn format_outcome(&self, outcome: &RecordingOutcome) -> String {
        match outcome.error_kind {
            None => format!(
                "Recorded {} ({})",
                outcome.file_path.display(),
                outcome.human_readable_size()
            ),
            Some(kind) if outcome.file_size_bytes > 0 => format!(
                "Recording failed: {} ({}, {})",
                kind,
                outcome.file_path.display(),
                outcome.human_readable_size()
            ),
            Some(kind) => format!(
                "Recording failed: {} ({})",
                kind,
                outcome.file_path.display()
            ),
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

/// Progress bar text such as `[████░░░░]  42s / 180s`
pub fn format_progress(elapsed_ms: u64, total_ms: u64) -> String {
    let elapsed_secs = elapsed_ms / 1000;
    let total_secs = total_ms / 1000;
    let percent = if total_ms > 0 {
        (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    // Build progress bar
    let bar_width = 20;
    let filled = ((percent / 100.0) * bar_width as f64) as usize;
    let empty = bar_width - filled;

    format!(
        "[{}{}] {:>3}s / {}s",
        "█".repeat(filled).cyan(),
        "░".repeat(empty),
        elapsed_secs,
        total_secs
    )
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
