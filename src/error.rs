use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Main error type for dlogger
#[derive(Debug, Error)]
pub enum LoggerError {
    // Configuration errors
    #[error("Invalid rotation directive: {0}")]
    InvalidRotation(String),

    #[error("Invalid retention directive: {0}")]
    InvalidRetention(String),

    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Construction errors (fatal for a file sink)
    #[error("Failed to create log directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Degraded-mode I/O errors, reported but never raised to callers
    #[error("Failed to flush {lines} line(s) to {path}: {source}")]
    FlushFailed {
        path: PathBuf,
        lines: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Log rotation failed for {path}: {source}")]
    RotationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compress rotated log {path}: {source}")]
    CompressionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Retention cleanup failed in {path}: {source}")]
    RetentionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Reading errors
    #[error("Failed to read log file: {0}")]
    LogReadError(String),

    #[error("Signal handling error: {0}")]
    SignalError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dlogger operations
pub type Result<T> = std::result::Result<T, LoggerError>;

/// Side channel for failures that must not interrupt the caller.
///
/// Flush, rotation, compression and retention failures end up here instead of
/// being returned, so the sink can keep running in degraded mode.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &LoggerError);
}

impl<F> ErrorReporter for F
where
    F: Fn(&LoggerError) + Send + Sync,
{
    fn report(&self, error: &LoggerError) {
        self(error)
    }
}

/// Forwards reported errors to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &LoggerError) {
        tracing::warn!(target: "dlogger", "{}", error);
    }
}

/// Keeps reported errors in memory, rendered as strings
#[derive(Debug, Default)]
pub struct MemoryReporter {
    errors: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for MemoryReporter {
    fn report(&self, error: &LoggerError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }
}
