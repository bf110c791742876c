// Log event record

use crate::level::Level;
use chrono::{DateTime, Local};
use colored::Color;

/// One log occurrence, built once by the dispatcher and shared with every sink
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    level: Level,
    message: String,
    context: String,
    timestamp: DateTime<Local>,
    display_color: Color,
}

impl Event {
    /// Create an event stamped with the current local time
    pub fn new(level: Level, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::at(level, message, context, Local::now())
    }

    /// Create an event with an explicit timestamp
    pub fn at(
        level: Level,
        message: impl Into<String>,
        context: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            context: context.into(),
            timestamp,
            display_color: level.color(),
        }
    }

    /// Override the console color hint
    pub fn with_color(mut self, color: Color) -> Self {
        self.display_color = color;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn rank(&self) -> u8 {
        self.level.rank()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn display_color(&self) -> Color {
        self.display_color
    }
}
