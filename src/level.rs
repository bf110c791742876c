// Log levels and their ranks

use crate::error::LoggerError;
use colored::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of an event.
///
/// Filtering compares [`Level::rank`], not the variant: TRACE and DEBUG share
/// rank 10, SUCCESS and WARNING share rank 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Success,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Numeric severity used for threshold comparisons
    pub fn rank(&self) -> u8 {
        match self {
            Level::Trace | Level::Debug => 10,
            Level::Info => 20,
            Level::Success | Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }

    /// Upper-case label as written to log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Default console color for this level
    pub fn color(&self) -> Color {
        let (r, g, b) = match self {
            Level::Trace => (0x00, 0xbc, 0xd4),
            Level::Debug => (0x3b, 0x82, 0xf6),
            Level::Info => (0xff, 0xff, 0xff),
            Level::Success => (0x4c, 0xaf, 0x50),
            Level::Warning => (0xff, 0x98, 0x00),
            Level::Error | Level::Critical => (0xf4, 0x43, 0x36),
        };
        Color::TrueColor { r, g, b }
    }

    /// Whether `self` passes a threshold of `minimum`
    pub fn passes(&self, minimum: Level) -> bool {
        self.rank() >= minimum.rank()
    }

    /// Lowest-ranked level carrying the given rank, if any
    pub fn from_rank(rank: u8) -> Option<Level> {
        Self::ALL.iter().copied().find(|level| level.rank() == rank)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Honour width/alignment so `{:<8}` pads the label
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == upper)
            .ok_or_else(|| LoggerError::UnknownLevel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_ranks() {
        assert_eq!(Level::Trace.rank(), Level::Debug.rank());
        assert_eq!(Level::Success.rank(), Level::Warning.rank());
        assert!(Level::Critical.rank() > Level::Error.rank());
    }

    #[test]
    fn test_passes_uses_rank() {
        assert!(Level::Trace.passes(Level::Debug));
        assert!(Level::Success.passes(Level::Warning));
        assert!(!Level::Info.passes(Level::Success));
        assert!(Level::Critical.passes(Level::Trace));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!(" Warning ".parse::<Level>().unwrap(), Level::Warning);
        assert!(matches!(
            "loud".parse::<Level>(),
            Err(LoggerError::UnknownLevel(_))
        ));
    }

    #[test]
    fn test_display_padding() {
        assert_eq!(format!("{:<8}|", Level::Info), "INFO    |");
        assert_eq!(format!("{:<8}|", Level::Critical), "CRITICAL|");
    }

    #[test]
    fn test_from_rank() {
        assert_eq!(Level::from_rank(10), Some(Level::Trace));
        assert_eq!(Level::from_rank(30), Some(Level::Success));
        assert_eq!(Level::from_rank(11), None);
    }
}
