// CLI module - pipe, inspect and maintain dlogger output

mod output;

use crate::config::{parse_retention, LoggerConfig};
use crate::context::StaticContext;
use crate::dispatch::Dispatcher;
use crate::error::{LoggerError, Result};
use crate::level::Level;
use crate::logger::{install_interrupt_flush, Logger};
use crate::reader::{read_logs, LogReadOptions};
use crate::sink::retention::cleanup_old_logs;
use crate::sink::rotation::{list_siblings, parent_dir};
use crate::sink::ConsoleSink;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// dlogger - structured logging with rotating file output
#[derive(Parser)]
#[command(name = "dlogger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log every line read from stdin
    Pipe {
        /// Logger configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Level for each piped line
        #[arg(short, long, default_value = "INFO")]
        level: String,
    },

    /// Validate a configuration file
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List the active log file and its rotated siblings
    Files {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show the last lines of the log file
    Tail {
        #[arg(short, long)]
        config: PathBuf,

        /// Number of lines to display
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,

        /// Only show lines containing this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Include rotated files
        #[arg(short, long)]
        all: bool,
    },

    /// Delete rotated files older than the retention period
    Cleanup {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> Result<()> {
        init_diagnostics();
        let cli = Cli::parse();
        cli.execute()
    }

    /// Execute the parsed command
    fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Pipe { config, level } => pipe(config.as_deref(), level),
            Commands::Check { config } => check(config),
            Commands::Files { config } => files(config),
            Commands::Tail {
                config,
                lines,
                filter,
                all,
            } => {
                let options = LogReadOptions {
                    lines: *lines,
                    include_rotated: *all,
                    filter: filter.clone(),
                };
                tail(config, &options)
            }
            Commands::Cleanup { config } => cleanup(config),
        }
    }
}

/// Internal diagnostics go to stderr, `RUST_LOG` overrides the default
fn init_diagnostics() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn pipe(config_path: Option<&Path>, level: &str) -> Result<()> {
    let level: Level = level.parse()?;

    let logger = Logger::with_dispatcher(Dispatcher::with_context(StaticContext::new("stdin")));
    logger.add_console(ConsoleSink::new());
    if let Some(path) = config_path {
        logger.configure(&LoggerConfig::from_file(path)?)?;
    }

    let logger = Arc::new(logger);
    install_interrupt_flush(Arc::clone(&logger))?;

    pipe_lines(&logger, level, std::io::stdin().lock())
}

/// Log each line of `input`, then shut the logger down even if reading fails
fn pipe_lines(logger: &Logger, level: Level, input: impl BufRead) -> Result<()> {
    let result: Result<()> = input.lines().try_for_each(|line| {
        logger.log(level, line?);
        Ok(())
    });

    logger.shutdown();
    result
}

fn check(config_path: &Path) -> Result<()> {
    let config = LoggerConfig::from_file(config_path)?;
    output::print_success(&format!("{} is valid", config_path.display()));
    output::print_config_summary(&config);
    Ok(())
}

fn files(config_path: &Path) -> Result<()> {
    let config = LoggerConfig::from_file(config_path)?;
    let log_file = required_log_file(&config)?;

    if !parent_dir(log_file).is_dir() {
        output::print_info("No log files yet");
        return Ok(());
    }

    output::print_file_table(&list_siblings(log_file)?);
    Ok(())
}

fn tail(config_path: &Path, options: &LogReadOptions) -> Result<()> {
    let config = LoggerConfig::from_file(config_path)?;
    let log_file = required_log_file(&config)?;

    output::print_log_lines(&read_logs(log_file, options)?);
    Ok(())
}

fn cleanup(config_path: &Path) -> Result<()> {
    let config = LoggerConfig::from_file(config_path)?;
    let log_file = required_log_file(&config)?;

    let Some(ref retention) = config.retention else {
        output::print_info("No retention configured, nothing to delete");
        return Ok(());
    };
    let days = parse_retention(retention)?;

    let removed = cleanup_old_logs(log_file, days, &|e: &LoggerError| {
        output::print_warning(&e.to_string())
    })?;
    output::print_success(&format!(
        "Removed {} file(s) older than {} day(s)",
        removed, days
    ));
    Ok(())
}

fn required_log_file(config: &LoggerConfig) -> Result<&Path> {
    config
        .log_file
        .as_deref()
        .ok_or_else(|| LoggerError::ConfigValidationError("log_file is not set".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn file_logger(dir: &TempDir) -> (Logger, PathBuf) {
        let log_file = dir.path().join("a").join("app.log");
        let logger = Logger::with_dispatcher(Dispatcher::with_context(StaticContext::new("stdin")));
        logger
            .configure(&LoggerConfig {
                log_file: Some(log_file.clone()),
                ..LoggerConfig::default()
            })
            .unwrap();
        (logger, log_file)
    }

    #[test]
    fn test_pipe_lines_writes_every_line() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, log_file) = file_logger(&temp_dir);

        pipe_lines(&logger, Level::Warning, Cursor::new("alpha\nbeta\n")).unwrap();

        let content = fs::read_to_string(&log_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("| WARNING  | stdin alpha"));
        assert!(lines[1].ends_with("| WARNING  | stdin beta"));
    }

    #[test]
    fn test_pipe_lines_flushes_before_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, log_file) = file_logger(&temp_dir);

        let input: &[u8] = b"alpha\nbeta\n\xff\xfe\ngamma\n";
        let result = pipe_lines(&logger, Level::Info, input);
        assert!(matches!(result, Err(LoggerError::Io(_))));

        let content = fs::read_to_string(&log_file).unwrap();
        assert!(content.contains("stdin alpha"));
        assert!(content.contains("stdin beta"));
        assert!(!content.contains("gamma"));
    }
}
