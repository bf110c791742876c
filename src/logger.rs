//! Convenience facade over a [`Dispatcher`]
//!
//! [`Logger`] wires a console sink, applies [`LoggerConfig`] and exposes one
//! method per level. A process-wide default instance can be installed once at
//! startup with [`init_global`].

use crate::config::LoggerConfig;
use crate::dispatch::{Dispatcher, SinkId};
use crate::error::{ErrorReporter, LoggerError, Result, TracingReporter};
use crate::format::format_error_chain;
use crate::level::Level;
use crate::sink::{ConsoleSink, FileSink, Sink};
use std::panic::Location;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

static GLOBAL: OnceLock<Arc<Logger>> = OnceLock::new();

/// Exit status used when an interrupt stops the process
const INTERRUPT_EXIT_CODE: i32 = 130;

pub struct Logger {
    dispatcher: Dispatcher,
    consoles: Mutex<Vec<Arc<ConsoleSink>>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Logger {
    /// Logger with a stdout console sink accepting every level
    pub fn new() -> Self {
        let logger = Self::bare();
        logger.add_console(ConsoleSink::new());
        logger
    }

    /// Logger without any sink
    pub fn bare() -> Self {
        Self::with_dispatcher(Dispatcher::new())
    }

    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            consoles: Mutex::new(Vec::new()),
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Route degraded-mode I/O and directive errors to `reporter`
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn reporter(&self) -> Arc<dyn ErrorReporter> {
        Arc::clone(&self.reporter)
    }

    /// Register a console sink that follows `show_path` on reconfiguration
    pub fn add_console(&self, console: ConsoleSink) -> SinkId {
        let console = Arc::new(console);
        self.consoles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&console));
        self.dispatcher.register(console)
    }

    pub fn add_sink(&self, sink: Arc<dyn Sink>) -> SinkId {
        self.dispatcher.register(sink)
    }

    pub fn remove_sink(&self, id: SinkId) -> Option<Arc<dyn Sink>> {
        let removed = self.dispatcher.remove(id)?;
        self.consoles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|console| {
                !std::ptr::addr_eq(Arc::as_ptr(console), Arc::as_ptr(&removed))
            });
        Some(removed)
    }

    /// Apply a configuration.
    ///
    /// Sets the global and per-sink thresholds, updates console `show_path`
    /// and, when `log_file` is set, registers a new [`FileSink`]. A malformed
    /// rotation or retention directive only disables that feature. Fails on
    /// an unknown level or when the log directory cannot be created.
    pub fn configure(&self, config: &LoggerConfig) -> Result<&Self> {
        let level = config.level()?;

        self.dispatcher.set_level(level);
        for sink in self.dispatcher.sinks() {
            sink.gate().set_level(level);
        }

        for console in self
            .consoles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            console.set_show_path(config.show_path);
        }

        if let Some(ref log_file) = config.log_file {
            let options = config.file_options(self.reporter.as_ref());
            let sink = FileSink::open(log_file, options, Arc::clone(&self.reporter))?;
            self.dispatcher.register(Arc::new(sink));
        }

        Ok(self)
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.dispatcher.log_at(level, message, Location::caller());
    }

    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(Level::Trace, message);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn success(&self, message: impl Into<String>) {
        self.log(Level::Success, message);
    }

    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Log at ERROR with the error and its cause chain appended
    #[track_caller]
    pub fn exception(&self, message: &str, error: &dyn std::error::Error) {
        self.log(Level::Error, format_error_chain(message, error));
    }

    pub fn flush(&self) {
        self.dispatcher.flush();
    }

    /// Flush and close every sink
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
    }
}

/// Flushes the global logger when dropped.
///
/// Keep it alive in `main`; dropping it is the clean-exit hook that writes
/// any buffered lines.
#[must_use = "dropping the guard immediately shuts the global logger down"]
pub struct ShutdownGuard {
    logger: Arc<Logger>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.logger.shutdown();
    }
}

/// Install the process-wide logger. Fails if one is already installed.
pub fn init_global(logger: Logger) -> Result<ShutdownGuard> {
    let logger = Arc::new(logger);
    GLOBAL
        .set(Arc::clone(&logger))
        .map_err(|_| LoggerError::ConfigError("Global logger already initialized".to_string()))?;
    Ok(ShutdownGuard { logger })
}

/// The process-wide logger, if installed
pub fn global() -> Option<&'static Arc<Logger>> {
    GLOBAL.get()
}

/// Flush every sink of `logger` and exit when the process is interrupted
pub fn install_interrupt_flush(logger: Arc<Logger>) -> Result<()> {
    ctrlc::set_handler(move || {
        logger.shutdown();
        std::process::exit(INTERRUPT_EXIT_CODE);
    })
    .map_err(|e| LoggerError::SignalError(format!("Failed to install interrupt handler: {}", e)))
}
