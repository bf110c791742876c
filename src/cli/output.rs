// Output formatting and display for CLI

use crate::config::{parse_retention, parse_rotation, LoggerConfig, Rotation};
use crate::level::Level;
use crate::reader::LogLine;
use crate::sink::rotation::LogFileInfo;
use chrono::{DateTime, Local};
use colored::*;
use std::time::Duration;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print the effective settings of a configuration
pub fn print_config_summary(config: &LoggerConfig) {
    let log_file = config
        .log_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());

    let rotation = match config.rotation.as_deref().map(parse_rotation) {
        None => "off".to_string(),
        Some(Ok(Rotation::Size(bytes))) => format!("at {}", format_size(bytes)),
        Some(Ok(Rotation::Interval(every))) => format!("every {}", format_duration(&every)),
        Some(Err(e)) => format!("{} ({})", "disabled".yellow(), e),
    };

    let retention = match config.retention.as_deref().map(parse_retention) {
        None => "keep all".to_string(),
        Some(Ok(days)) => format!("{} day(s)", days),
        Some(Err(e)) => format!("{} ({})", "disabled".yellow(), e),
    };

    println!();
    println!("  {:<15} {}", "Level:".bold(), config.level.to_uppercase());
    println!("  {:<15} {}", "Log file:".bold(), log_file.cyan());
    println!("  {:<15} {}", "Rotation:".bold(), rotation);
    println!("  {:<15} {}", "Retention:".bold(), retention);
    println!("  {:<15} {}", "Compression:".bold(), config.compression);
    println!("  {:<15} {} line(s)", "Buffer:".bold(), config.buffer_size);
    println!("  {:<15} {}", "Time format:".bold(), config.time_format);
    println!();
}

/// Print a table of log files
pub fn print_file_table(files: &[LogFileInfo]) {
    if files.is_empty() {
        println!("{}", "No log files yet".yellow());
        return;
    }

    #[derive(Tabled)]
    struct FileRow {
        #[tabled(rename = "File")]
        name: String,
        #[tabled(rename = "Size")]
        size: String,
        #[tabled(rename = "Modified")]
        modified: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<FileRow> = files
        .iter()
        .map(|f| FileRow {
            name: f.file_name(),
            size: format_size(f.size),
            modified: DateTime::<Local>::from(f.modified)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            status: format_status(f),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    let total: u64 = files.iter().map(|f| f.size).sum();
    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Total: {} file(s), {}", files.len(), format_size(total))
            .dimmed()
            .italic()
    );
}

/// Print parsed log lines, coloring the level label
pub fn print_log_lines(lines: &[LogLine]) {
    if lines.is_empty() {
        println!("{}", "No logs available".yellow());
        return;
    }

    for line in lines {
        match (&line.timestamp, line.level) {
            (Some(ts), Some(level)) => println!(
                "{} {} {}",
                format!("[{}]", ts).dimmed(),
                format_level_colored(level),
                line.message
            ),
            (Some(ts), None) => println!("{} {}", format!("[{}]", ts).dimmed(), line.message),
            _ => println!("{}", line.message),
        }
    }
}

fn format_level_colored(level: Level) -> String {
    let label = format!("{:<8}", level).color(level.color()).bold();
    if level == Level::Critical {
        label.underline().to_string()
    } else {
        label.to_string()
    }
}

fn format_status(file: &LogFileInfo) -> String {
    if file.active {
        "active".green().to_string()
    } else if file.is_compressed() {
        "compressed".bright_black().to_string()
    } else {
        "rotated".yellow().to_string()
    }
}

/// Format a byte count in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2}GB", bytes as f64 / GB as f64)
    }
}

/// Format a rotation interval as hours, days or weeks
fn format_duration(duration: &Duration) -> String {
    let hours = duration.as_secs() / 3600;

    if hours % (24 * 7) == 0 && hours > 0 {
        format!("{}w", hours / (24 * 7))
    } else if hours % 24 == 0 && hours > 0 {
        format!("{}d", hours / 24)
    } else {
        format!("{}h", hours)
    }
}
