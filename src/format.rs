// Formatters - render events into text lines

use crate::event::Event;
use chrono::format::{Item, StrftimeItems};

/// Default strftime pattern for timestamps
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// True if `pattern` is a strftime pattern chrono can render
pub fn is_valid_time_format(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// `pattern` if renderable, the default pattern otherwise
pub(crate) fn checked_time_format(pattern: String) -> String {
    if is_valid_time_format(&pattern) {
        pattern
    } else {
        tracing::warn!(
            target: "dlogger",
            "Invalid time format {:?}, using {:?}",
            pattern,
            DEFAULT_TIME_FORMAT
        );
        DEFAULT_TIME_FORMAT.to_string()
    }
}

/// Turns an event into a single line of text (no trailing newline). Pure.
pub trait Formatter: Send + Sync {
    fn format(&self, event: &Event) -> String;
}

/// Plain text format used by file sinks
///
/// `[<timestamp>] | <LEVEL padded to 8> | <context> <message>`
#[derive(Debug, Clone)]
pub struct SimpleFormatter {
    time_format: String,
}

impl SimpleFormatter {
    /// Unrenderable patterns fall back to [`DEFAULT_TIME_FORMAT`]
    pub fn new(time_format: impl Into<String>) -> Self {
        Self {
            time_format: checked_time_format(time_format.into()),
        }
    }

    pub fn time_format(&self) -> &str {
        &self.time_format
    }
}

impl Default for SimpleFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FORMAT)
    }
}

impl Formatter for SimpleFormatter {
    fn format(&self, event: &Event) -> String {
        format!(
            "[{}] | {:<8} | {} {}",
            event.timestamp().format(&self.time_format),
            event.level(),
            event.context(),
            event.message()
        )
    }
}

impl<F> Formatter for F
where
    F: Fn(&Event) -> String + Send + Sync,
{
    fn format(&self, event: &Event) -> String {
        self(event)
    }
}

/// Render an error and its `source()` chain below a message
///
/// ```text
/// <message>
/// <error>
///   caused by: <source>
///   caused by: <source of source>
/// ```
pub fn format_error_chain(message: &str, error: &dyn std::error::Error) -> String {
    let mut out = format!("{}\n{}", message, error);
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
