// Human-readable rotation and retention directives

use crate::error::{LoggerError, Result};
use crate::sink::FileSinkOptions;
use std::time::Duration;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

const HOUR_SECS: u64 = 3600;
const DAY_SECS: u64 = 24 * HOUR_SECS;
const WEEK_SECS: u64 = 7 * DAY_SECS;

/// Days in a retention "month"; a fixed 30, not a calendar month
pub const DAYS_PER_MONTH: u32 = 30;

/// Parsed rotation trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Rotate when the active file reaches this many bytes
    Size(u64),
    /// Rotate when the active file is this old
    Interval(Duration),
}

impl Rotation {
    /// Set the matching trigger on `options`, leaving the other untouched
    pub fn apply_to(self, options: FileSinkOptions) -> FileSinkOptions {
        match self {
            Rotation::Size(bytes) => options.rotation_size(bytes),
            Rotation::Interval(interval) => options.rotation_interval(interval),
        }
    }
}

/// Parse `"10MB"`, `"1.5 GB"`, `"500kb"`, `"12 hours"`, `"1 day"`, `"2 weeks"`
pub fn parse_rotation(input: &str) -> Result<Rotation> {
    let text = input.trim().to_lowercase();
    let invalid = || LoggerError::InvalidRotation(input.to_string());

    for (suffix, unit) in [("kb", KB), ("mb", MB), ("gb", GB)] {
        if let Some(number) = text.strip_suffix(suffix) {
            let value: f64 = number.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            return Ok(Rotation::Size((value * unit as f64) as u64));
        }
    }

    let (value, unit) = split_quantity(&text).ok_or_else(invalid)?;
    let seconds = if unit.starts_with("hour") {
        HOUR_SECS
    } else if unit.starts_with("day") {
        DAY_SECS
    } else if unit.starts_with("week") {
        WEEK_SECS
    } else {
        return Err(invalid());
    };

    let total = value.checked_mul(seconds).ok_or_else(invalid)?;
    Ok(Rotation::Interval(Duration::from_secs(total)))
}

/// Parse `"7 days"`, `"2 weeks"`, `"1 month"` or a bare day count into days
pub fn parse_retention(input: &str) -> Result<u32> {
    let text = input.trim().to_lowercase();
    let invalid = || LoggerError::InvalidRetention(input.to_string());

    let (value, unit) = split_quantity(&text).ok_or_else(invalid)?;
    let value = u32::try_from(value).map_err(|_| invalid())?;

    let multiplier = if unit.is_empty() || unit.starts_with("day") {
        1
    } else if unit.starts_with("week") {
        7
    } else if unit.starts_with("month") {
        DAYS_PER_MONTH
    } else {
        return Err(invalid());
    };

    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Split a leading integer from the unit that follows it
fn split_quantity(text: &str) -> Option<(u64, &str)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = text[..digits].parse().ok()?;
    Some((value, text[digits..].trim()))
}
