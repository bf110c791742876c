use super::{Gate, Sink};
use crate::event::Event;
use crate::format::{checked_time_format, DEFAULT_TIME_FORMAT};
use crate::level::Level;
use colored::*;
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Writes one colorized line per accepted event to stdout (or any writer)
pub struct ConsoleSink<W = Stdout> {
    gate: Gate,
    out: Mutex<W>,
    show_path: AtomicBool,
    colorize: bool,
    time_format: String,
}

impl ConsoleSink<Stdout> {
    /// Console sink on stdout, accepting every level
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleSink<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            gate: Gate::new(Level::Trace),
            out: Mutex::new(out),
            show_path: AtomicBool::new(true),
            colorize: true,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    /// Render plain text without ANSI escapes
    pub fn without_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn with_level(self, level: Level) -> Self {
        self.gate.set_level(level);
        self
    }

    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = checked_time_format(time_format.into());
        self
    }

    pub fn with_show_path(self, show_path: bool) -> Self {
        self.set_show_path(show_path);
        self
    }

    pub fn set_show_path(&self, show_path: bool) {
        self.show_path.store(show_path, Ordering::Relaxed);
    }

    pub fn show_path(&self) -> bool {
        self.show_path.load(Ordering::Relaxed)
    }

    /// Render the console line for an event (no trailing newline)
    pub fn render(&self, event: &Event) -> String {
        let time = event.timestamp().format(&self.time_format).to_string();
        let label = format!("{:<8}", event.level());
        let show_path = self.show_path();

        if !self.colorize {
            let label = if event.level() == Level::Critical {
                format!("**{}**", label.trim_end())
            } else {
                label
            };
            return if show_path {
                format!("{} | {} | {} - {}", time, label, event.context(), event.message())
            } else {
                format!("{} | {} | {}", time, label, event.message())
            };
        }

        let mut level = label.color(event.display_color()).bold();
        if event.level() == Level::Critical {
            level = level.underline();
        }
        let separator = "|".white();

        if show_path {
            format!(
                "{} {} {} {} {} {} {}",
                time.green(),
                separator,
                level,
                separator,
                event.context().cyan(),
                "-".white(),
                event.message()
            )
        } else {
            format!(
                "{} {} {} {} {}",
                time.green(),
                separator,
                level,
                separator,
                event.message()
            )
        }
    }
}

impl ConsoleSink<Vec<u8>> {
    /// Drain what has been written so far
    pub fn take_output(&self) -> String {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&std::mem::take(&mut *out)).into_owned()
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn gate(&self) -> &Gate {
        &self.gate
    }

    fn write(&self, event: &Event) {
        let mut line = self.render(event);
        line.push('\n');

        // One write_all per line keeps concurrent lines whole
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(line.as_bytes());
    }

    fn flush(&self) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.flush();
    }

    fn name(&self) -> &str {
        "console"
    }
}
