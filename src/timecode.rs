//! Clock formats for cue timing.
//!
//! Offsets are held as whole milliseconds since track start. SRT and WebVTT
//! differ only in the decimal separator (and WebVTT allows dropping the hour
//! field), so both render through the same decomposition.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d{2,}):)?(\d{2}):(\d{2})[.,](\d{3})$").expect("valid clock regex"));

/// Whether a WebVTT clock keeps a zero hour field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStyle {
    /// `HH:MM:SS.mmm`, used for file export.
    Full,
    /// `MM:SS.mmm` when the hour is zero, for display.
    Short,
}

/// A non-negative offset from the start of a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOffset(u64);

struct Parts {
    hours: u64,
    minutes: u64,
    seconds: u64,
    millis: u64,
}

impl TimeOffset {
    pub const ZERO: TimeOffset = TimeOffset(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Fractional seconds; milliseconds are `floor(frac * 1000)`.
    /// Negative or non-finite input clamps to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Self::ZERO;
        }
        let whole = seconds.trunc();
        let millis = ((seconds - whole) * 1000.0).floor() as u64;
        // float-to-int casts saturate, so only the scaling can overflow
        Self((whole as u64).saturating_mul(1000).saturating_add(millis.min(999)))
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn saturating_add(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    fn parts(self) -> Parts {
        let total_seconds = self.0 / 1000;
        Parts {
            hours: total_seconds / 3600,
            minutes: (total_seconds % 3600) / 60,
            seconds: total_seconds % 60,
            millis: self.0 % 1000,
        }
    }

    fn render(self, separator: char, style: ClockStyle) -> String {
        let Parts {
            hours,
            minutes,
            seconds,
            millis,
        } = self.parts();
        if style == ClockStyle::Short && hours == 0 {
            format!("{minutes:02}:{seconds:02}{separator}{millis:03}")
        } else {
            format!("{hours:02}:{minutes:02}:{seconds:02}{separator}{millis:03}")
        }
    }

    /// `HH:MM:SS,mmm`
    pub fn to_srt(self) -> String {
        self.render(',', ClockStyle::Full)
    }

    /// `HH:MM:SS.mmm`
    pub fn to_vtt(self) -> String {
        self.render('.', ClockStyle::Full)
    }

    pub fn to_vtt_styled(self, style: ClockStyle) -> String {
        self.render('.', style)
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_vtt())
    }
}

pub fn seconds_to_srt(seconds: f64) -> String {
    TimeOffset::from_seconds(seconds).to_srt()
}

pub fn seconds_to_vtt(seconds: f64, style: ClockStyle) -> String {
    TimeOffset::from_seconds(seconds).to_vtt_styled(style)
}

/// Parse `HH:MM:SS.mmm`, `HH:MM:SS,mmm` or the hour-less `MM:SS.mmm`.
pub fn parse_clock(text: &str) -> Result<TimeOffset> {
    let text = text.trim();
    let caps = CLOCK_RE
        .captures(text)
        .ok_or_else(|| Error::parse(format!("unrecognized timestamp: '{text}'")))?;

    let field = |i: usize| -> Result<u64> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<u64>())
            .map_err(|_| Error::parse(format!("timestamp out of range: '{text}'")))
    };
    let (hours, minutes, seconds, millis) = (field(1)?, field(2)?, field(3)?, field(4)?);

    if minutes >= 60 || seconds >= 60 {
        return Err(Error::parse(format!("timestamp out of range: '{text}'")));
    }

    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .map(TimeOffset)
        .ok_or_else(|| Error::parse(format!("timestamp out of range: '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_srt() {
        assert_eq!(seconds_to_srt(3661.5), "01:01:01,500");
        assert_eq!(seconds_to_srt(0.0), "00:00:00,000");
    }

    #[test]
    fn test_seconds_to_vtt_full_and_short() {
        assert_eq!(seconds_to_vtt(3661.5, ClockStyle::Full), "01:01:01.500");
        assert_eq!(seconds_to_vtt(75.25, ClockStyle::Full), "00:01:15.250");
        assert_eq!(seconds_to_vtt(75.25, ClockStyle::Short), "01:15.250");
        assert_eq!(seconds_to_vtt(3661.5, ClockStyle::Short), "01:01:01.500");
    }

    #[test]
    fn test_negative_and_nan_clamp_to_zero() {
        assert_eq!(TimeOffset::from_seconds(-4.0), TimeOffset::ZERO);
        assert_eq!(TimeOffset::from_seconds(f64::NAN), TimeOffset::ZERO);
    }

    #[test]
    fn test_hours_past_99() {
        assert_eq!(TimeOffset::from_millis(360_000_000).to_srt(), "100:00:00,000");
        assert_eq!(parse_clock("100:00:00.000").unwrap().as_millis(), 360_000_000);
    }

    #[test]
    fn test_parse_clock_both_separators() {
        assert_eq!(parse_clock("01:01:01,500").unwrap().as_millis(), 3_661_500);
        assert_eq!(parse_clock("01:01:01.500").unwrap().as_millis(), 3_661_500);
        assert_eq!(parse_clock("01:15.250").unwrap().as_millis(), 75_250);
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert!(matches!(parse_clock("1:2:3"), Err(Error::Parse(_))));
        assert!(matches!(parse_clock("00:00:00"), Err(Error::Parse(_))));
        assert!(matches!(parse_clock("00:61:00.000"), Err(Error::Parse(_))));
        assert!(matches!(parse_clock(""), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_clock_huge_hours_is_error() {
        assert!(matches!(parse_clock("99999999999999999:00:00.000"), Err(Error::Parse(_))));
        assert!(matches!(parse_clock("999999999999999999999:00:00.000"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_from_seconds_saturates() {
        assert_eq!(TimeOffset::from_seconds(1e17).as_millis(), u64::MAX);
        assert_eq!(TimeOffset::from_seconds(f64::MAX).as_millis(), u64::MAX);
        // renders without panicking
        assert!(seconds_to_srt(1e17).ends_with(",615"));
    }

    #[test]
    fn test_srt_round_trip() {
        for secs in [0.0, 0.25, 12.125, 59.5, 3661.5, 86399.75] {
            let clock = seconds_to_srt(secs);
            let back = parse_clock(&clock).unwrap().as_seconds();
            assert!((back - secs).abs() < 1e-9, "{secs} -> {clock} -> {back}");
        }
    }
}
