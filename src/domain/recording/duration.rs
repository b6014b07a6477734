//! Human-readable durations for track lengths, waits and timeouts

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default timeout for a requested track to start playing (30 seconds)
pub const DEFAULT_START_TIMEOUT_SECS: u64 = 30;

/// Default wait for a playback device to appear (15 seconds)
pub const DEFAULT_DEVICE_WAIT_SECS: u64 = 15;

const SECS_PER_UNIT: [(char, u64); 3] = [('h', 3600), ('m', 60), ('s', 1)];

/// A non-negative length of time with millisecond resolution.
///
/// Written and parsed as `1h2m3s`, `3m25s`, `90s` and the like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Saturates at `u64::MAX` milliseconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs.saturating_mul(1000),
        }
    }

    pub const fn default_start_timeout() -> Self {
        Self::from_secs(DEFAULT_START_TIMEOUT_SECS)
    }

    pub const fn default_device_wait() -> Self {
        Self::from_secs(DEFAULT_DEVICE_WAIT_SECS)
    }

    /// Whole seconds, a partial second counting as one
    pub const fn as_secs_ceil(&self) -> u64 {
        self.milliseconds.div_ceil(1000)
    }

    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// One or more `<number><unit>` parts, units `h`, `m` and `s` in that
    /// order, each at most once. Zero is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };

        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut units = SECS_PER_UNIT.iter();
        let mut total_secs: u64 = 0;

        while !rest.is_empty() {
            let split = rest
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(invalid)?;
            let (number, tail) = rest.split_at(split);
            if number.is_empty() {
                return Err(invalid());
            }

            let mut chars = tail.chars();
            let unit = chars.next().map(|c| c.to_ascii_lowercase());
            // Units only move towards smaller ones
            let &(_, unit_secs) = units
                .by_ref()
                .find(|(name, _)| Some(*name) == unit)
                .ok_or_else(invalid)?;

            let value: u64 = number.parse().map_err(|_| invalid())?;
            total_secs = value
                .checked_mul(unit_secs)
                .and_then(|secs| total_secs.checked_add(secs))
                .ok_or_else(invalid)?;
            rest = chars.as_str();
        }

        match total_secs.checked_mul(1000) {
            Some(0) | None => Err(invalid()),
            Some(milliseconds) => Ok(Self { milliseconds }),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.as_secs();
        if remaining == 0 {
            return write!(f, "0s");
        }

        for (name, unit_secs) in SECS_PER_UNIT {
            let count = remaining / unit_secs;
            if count > 0 {
                write!(f, "{}{}", count, name)?;
                remaining %= unit_secs;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(input: &str) -> u64 {
        input.parse::<Duration>().unwrap().as_secs()
    }

    #[test]
    fn parses_each_unit() {
        assert_eq!(secs("30s"), 30);
        assert_eq!(secs("3m"), 180);
        assert_eq!(secs("1h"), 3600);
        assert_eq!(secs("205s"), 205);
        assert_eq!("30s".parse::<Duration>().unwrap().as_millis(), 30_000);
    }

    #[test]
    fn parses_combined_units() {
        assert_eq!(secs("3m25s"), 205);
        assert_eq!(secs("1h2m3s"), 3723);
        assert_eq!(secs("1h30s"), 3630);
    }

    #[test]
    fn unit_case_and_surrounding_space_are_ignored() {
        assert_eq!(secs("  1M30S "), 90);
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "0s", "0m0s", "180", "3x", "m", "3m3m", "25s3m", "3 m", "-5s"] {
            assert!(input.parse::<Duration>().is_err(), "{:?} should not parse", input);
        }
    }

    #[test]
    fn rejects_values_that_overflow() {
        assert!("99999999999999999s".parse::<Duration>().is_err());
        assert!("99999999999999999999s".parse::<Duration>().is_err());
        assert!("5124095576030431h".parse::<Duration>().is_err());
        assert!("18446744073709551615s".parse::<Duration>().is_err());
    }

    #[test]
    fn display_uses_largest_units() {
        assert_eq!(Duration::from_secs(30).to_string(), "30s");
        assert_eq!(Duration::from_secs(180).to_string(), "3m");
        assert_eq!(Duration::from_secs(205).to_string(), "3m25s");
        assert_eq!(Duration::from_secs(3723).to_string(), "1h2m3s");
        assert_eq!(Duration::from_millis(400).to_string(), "0s");
    }

    #[test]
    fn display_parses_back() {
        for total in [1, 59, 61, 3600, 3661, 86_399] {
            let shown = Duration::from_secs(total).to_string();
            assert_eq!(secs(&shown), total, "{}", shown);
        }
    }

    #[test]
    fn secs_ceil_rounds_partial_seconds_up() {
        assert_eq!(Duration::from_millis(212_400).as_secs_ceil(), 213);
        assert_eq!(Duration::from_millis(180_000).as_secs_ceil(), 180);
    }

    #[test]
    fn from_secs_saturates() {
        assert_eq!(Duration::from_secs(u64::MAX).as_millis(), u64::MAX);
    }

    #[test]
    fn default_values() {
        assert_eq!(Duration::default_start_timeout().as_secs(), 30);
        assert_eq!(Duration::default_device_wait().as_secs(), 15);
        assert_eq!(Duration::from_secs(2).as_std(), StdDuration::from_secs(2));
    }
}
