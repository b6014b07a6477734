//! Recording outcome value object

use std::fmt;
use std::path::PathBuf;

/// Minimum plausible output per second of expected audio.
///
/// Any real encode lands well above this; a capture that falls short was
/// truncated or recorded silence.
pub const MIN_BYTES_PER_SECOND: u64 = 20_000;

/// Smallest artifact accepted for a track of the given expected length.
/// Saturates for absurd lengths, which no file can satisfy.
pub const fn minimum_output_bytes(expected_duration_secs: u64) -> u64 {
    expected_duration_secs.saturating_mul(MIN_BYTES_PER_SECOND)
}

/// Terminal failure kinds of a recording request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingErrorKind {
    /// The playback API never answered
    RemoteUnavailable,
    /// No controllable playback device appeared
    DeviceNotFound,
    /// Retries exhausted without confirming the requested track is playing
    StartVerificationFailed,
    /// The capture process could not run or exited non-zero
    CaptureProcessFailed,
    /// The capture exited cleanly but produced no file
    OutputMissing,
    /// The produced file is smaller than any real capture would be
    OutputTooSmall,
    /// Cancelled while in flight
    Interrupted,
}

impl RecordingErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable => "remote unavailable",
            Self::DeviceNotFound => "device not found",
            Self::StartVerificationFailed => "start verification failed",
            Self::CaptureProcessFailed => "capture process failed",
            Self::OutputMissing => "output missing",
            Self::OutputTooSmall => "output too small",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for RecordingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one recording request. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingOutcome {
    pub succeeded: bool,
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
    pub error_kind: Option<RecordingErrorKind>,
}

impl RecordingOutcome {
    pub fn success(file_path: impl Into<PathBuf>, file_size_bytes: u64) -> Self {
        Self {
            succeeded: true,
            file_path: file_path.into(),
            file_size_bytes,
            error_kind: None,
        }
    }

    pub fn failure(file_path: impl Into<PathBuf>, kind: RecordingErrorKind) -> Self {
        Self::failure_with_size(file_path, kind, 0)
    }

    pub fn failure_with_size(
        file_path: impl Into<PathBuf>,
        kind: RecordingErrorKind,
        file_size_bytes: u64,
    ) -> Self {
        Self {
            succeeded: false,
            file_path: file_path.into(),
            file_size_bytes,
            error_kind: Some(kind),
        }
    }

    /// True if the request ended because it was cancelled
    pub fn was_interrupted(&self) -> bool {
        self.error_kind == Some(RecordingErrorKind::Interrupted)
    }

    /// File size in human-readable format
    pub fn human_readable_size(&self) -> String {
        let bytes = self.file_size_bytes as f64;
        if bytes < 1024.0 {
            format!("{} B", self.file_size_bytes)
        } else if bytes < 1024.0 * 1024.0 {
            format!("{:.1} KB", bytes / 1024.0)
        } else {
            format!("{:.1} MB", bytes / (1024.0 * 1024.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_for_three_minutes() {
        assert_eq!(minimum_output_bytes(180), 3_600_000);
    }

    #[test]
    fn minimum_saturates_for_huge_lengths() {
        assert_eq!(minimum_output_bytes(999_999_999_999_999), u64::MAX);
        assert_eq!(minimum_output_bytes(u64::MAX), u64::MAX);
    }

    #[test]
    fn success_has_no_error_kind() {
        let outcome = RecordingOutcome::success("/tmp/a.mp3", 4_000_000);
        assert!(outcome.succeeded);
        assert_eq!(outcome.error_kind, None);
        assert!(!outcome.was_interrupted());
    }

    #[test]
    fn failure_carries_kind() {
        let outcome = RecordingOutcome::failure("/tmp/a.mp3", RecordingErrorKind::Interrupted);
        assert!(!outcome.succeeded);
        assert!(outcome.was_interrupted());
        assert_eq!(outcome.file_size_bytes, 0);
    }

    #[test]
    fn human_readable_sizes() {
        assert_eq!(RecordingOutcome::success("a", 512).human_readable_size(), "512 B");
        assert_eq!(RecordingOutcome::success("a", 2048).human_readable_size(), "2.0 KB");
        assert_eq!(
            RecordingOutcome::success("a", 4_194_304).human_readable_size(),
            "4.0 MB"
        );
    }
}
