//! Recording domain module

mod duration;
mod outcome;

pub use duration::Duration;
pub use outcome::{
    minimum_output_bytes, RecordingErrorKind, RecordingOutcome, MIN_BYTES_PER_SECOND,
};
