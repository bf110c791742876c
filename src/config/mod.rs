mod directives;

pub use directives::{parse_retention, parse_rotation, Rotation, DAYS_PER_MONTH};

use crate::error::{ErrorReporter, LoggerError, Result};
use crate::format::{is_valid_time_format, DEFAULT_TIME_FORMAT};
use crate::level::Level;
use crate::sink::{FileSinkOptions, DEFAULT_BUFFER_SIZE, DEFAULT_CHECK_ROTATION_EVERY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logger configuration with every recognized option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Threshold level name (TRACE, DEBUG, INFO, SUCCESS, WARNING, ERROR, CRITICAL)
    #[serde(default = "default_level")]
    pub level: String,

    /// Log file path; no file sink is created when absent
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Show the context label on the console
    #[serde(default = "default_show_path")]
    pub show_path: bool,

    /// Rotation directive, e.g. "10MB" or "1 day"
    #[serde(default)]
    pub rotation: Option<String>,

    /// Retention directive, e.g. "7 days" or "1 month"
    #[serde(default)]
    pub retention: Option<String>,

    /// Gzip rotated files
    #[serde(default)]
    pub compression: bool,

    /// strftime pattern for file timestamps
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// Buffered lines before the file sink flushes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Emitted events between rotation checks
    #[serde(default = "default_check_rotation_every")]
    pub check_rotation_every: u64,
}

// Default value functions for serde
fn default_level() -> String {
    "DEBUG".to_string()
}

fn default_show_path() -> bool {
    true
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_check_rotation_every() -> u64 {
    DEFAULT_CHECK_ROTATION_EVERY
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_file: None,
            show_path: default_show_path(),
            rotation: None,
            retention: None,
            compression: false,
            time_format: default_time_format(),
            buffer_size: default_buffer_size(),
            check_rotation_every: default_check_rotation_every(),
        }
    }
}

impl LoggerConfig {
    /// Load a configuration file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<LoggerConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LoggerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(LoggerError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Parse TOML configuration
    pub fn parse_toml(contents: &str) -> Result<LoggerConfig> {
        toml::from_str(contents)
            .map_err(|e| LoggerError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    /// Parse JSON configuration
    pub fn parse_json(contents: &str) -> Result<LoggerConfig> {
        serde_json::from_str(contents)
            .map_err(|e| LoggerError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the configuration.
    ///
    /// Rotation and retention directives are not checked here; a malformed
    /// directive only disables that feature (see [`LoggerConfig::file_options`]).
    pub fn validate(&self) -> Result<()> {
        self.level()?;

        if self.buffer_size == 0 {
            return Err(LoggerError::ConfigValidationError(
                "buffer_size must be at least 1".to_string(),
            ));
        }

        if self.check_rotation_every == 0 {
            return Err(LoggerError::ConfigValidationError(
                "check_rotation_every must be at least 1".to_string(),
            ));
        }

        if !is_valid_time_format(&self.time_format) {
            return Err(LoggerError::ConfigValidationError(format!(
                "Invalid time_format: {:?}",
                self.time_format
            )));
        }

        if let Some(ref log_file) = self.log_file {
            if log_file.file_name().is_none() {
                return Err(LoggerError::ConfigValidationError(format!(
                    "log_file must name a file: {}",
                    log_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Parsed threshold level
    pub fn level(&self) -> Result<Level> {
        self.level.parse()
    }

    /// Build file sink options, reporting and skipping malformed directives
    pub fn file_options(&self, reporter: &dyn ErrorReporter) -> FileSinkOptions {
        let mut options = FileSinkOptions::default()
            .level(self.level().unwrap_or(Level::Debug))
            .compression(self.compression)
            .buffer_size(self.buffer_size)
            .check_rotation_every(self.check_rotation_every)
            .time_format(self.time_format.clone());

        if let Some(ref rotation) = self.rotation {
            match parse_rotation(rotation) {
                Ok(rotation) => options = rotation.apply_to(options),
                Err(e) => reporter.report(&e),
            }
        }

        if let Some(ref retention) = self.retention {
            match parse_retention(retention) {
                Ok(days) => options = options.retention_days(days),
                Err(e) => reporter.report(&e),
            }
        }

        options
    }

    /// Expand environment variables in the log file path
    fn expand_env_vars(&mut self) {
        if let Some(ref log_file) = self.log_file {
            let expanded = expand_env_in_string(&log_file.to_string_lossy());
            self.log_file = Some(PathBuf::from(expanded));
        }
    }
}

/// Expand `$VAR` and `${VAR}` references
fn expand_env_in_string(s: &str) -> String {
    let mut result = s.to_string();

    // Longest names first so $HOMEDIR is not clobbered by $HOME
    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (key, value) in vars {
        result = result.replace(&format!("${{{}}}", key), &value);
        result = result.replace(&format!("${}", key), &value);
    }

    result
}
