//! Elapsed-time display strings
//!
//! The leading field is never padded: `0:05`, `12:00`, `1:01:01`. Inputs are
//! unsigned milliseconds, so negative durations cannot reach these functions.

use crate::error::{CompanionError, Result};

fn split_hms(milliseconds: u64) -> (u64, u64, u64) {
    let total_seconds = milliseconds / 1000;
    (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
}

/// Render as `H:MM:SS` when there is at least one hour, `M:SS` otherwise
pub fn format_time(milliseconds: u64) -> String {
    let (hours, minutes, seconds) = split_hms(milliseconds);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Same as [`format_time`] with a trailing two-digit centisecond field
pub fn format_time_with_milliseconds(milliseconds: u64) -> String {
    let centis = (milliseconds % 1000) / 10;
    format!("{}.{:02}", format_time(milliseconds), centis)
}

/// Strict parse of `MM:SS` or `HH:MM:SS` into milliseconds
pub fn try_parse_time_string(input: &str) -> Result<u64> {
    let malformed = || CompanionError::MalformedTimeString(input.to_string());

    let fields = input
        .split(':')
        .map(|part| part.trim().parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    let (hours, minutes, seconds) = match fields.as_slice() {
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        [minutes, seconds] => (0, *minutes, *seconds),
        _ => return Err(malformed()),
    };

    hours
        .checked_mul(3600)
        .and_then(|total| minutes.checked_mul(60).and_then(|m| total.checked_add(m)))
        .and_then(|total| total.checked_add(seconds))
        .and_then(|total| total.checked_mul(1000))
        .ok_or_else(malformed)
}

/// Lenient parse: anything malformed yields 0
pub fn parse_time_string(input: &str) -> u64 {
    try_parse_time_string(input).unwrap_or(0)
}

/// Compact `1h 2m 3s` rendering used in status output
pub fn format_uptime(seconds: u64) -> String {
    let (hours, minutes, seconds) = split_hms(seconds.saturating_mul(1000));
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
