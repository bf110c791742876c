use crate::error::{LoggerError, Result};
use crate::level::Level;
use crate::sink::rotation::list_siblings;
use flate2::read::GzDecoder;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Options for reading back a file sink's output
#[derive(Debug, Clone)]
pub struct LogReadOptions {
    /// Number of lines to keep from the end
    pub lines: usize,
    /// Also read rotated (and gzipped) siblings, oldest first
    pub include_rotated: bool,
    /// Optional filter pattern (simple substring match)
    pub filter: Option<String>,
}

impl Default for LogReadOptions {
    fn default() -> Self {
        Self {
            lines: 100,
            include_rotated: false,
            filter: None,
        }
    }
}

/// One line of file sink output, split into its parts when it parses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: Option<String>,
    pub level: Option<Level>,
    /// Context and message, or the whole line when it does not parse
    pub message: String,
}

impl LogLine {
    /// Parse `[<timestamp>] | <LEVEL> | <context> <message>`
    pub fn parse(line: &str) -> Self {
        let unparsed = || Self {
            timestamp: None,
            level: None,
            message: line.to_string(),
        };

        let Some(rest) = line.strip_prefix('[') else {
            return unparsed();
        };
        let Some((timestamp, rest)) = rest.split_once(']') else {
            return unparsed();
        };

        // "| LEVEL    | rest"
        let level_and_message = rest
            .trim_start()
            .strip_prefix('|')
            .and_then(|r| r.split_once('|'))
            .and_then(|(level, message)| {
                let level: Level = level.trim().parse().ok()?;
                Some((level, message.strip_prefix(' ').unwrap_or(message)))
            });

        match level_and_message {
            Some((level, message)) => Self {
                timestamp: Some(timestamp.to_string()),
                level: Some(level),
                message: message.to_string(),
            },
            None => Self {
                timestamp: Some(timestamp.to_string()),
                level: None,
                message: rest.trim_start().to_string(),
            },
        }
    }
}

/// Read the last `lines` lines of one file, plain or gzipped.
///
/// A missing file yields no lines.
pub fn read_last_lines(path: &Path, lines: usize, filter: Option<&str>) -> Result<Vec<LogLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut tail = VecDeque::with_capacity(lines.min(1024));
    collect_lines(path, lines, filter, &mut tail)?;
    Ok(tail.iter().map(|line| LogLine::parse(line)).collect())
}

/// Read the last lines written to a file sink target
pub fn read_logs(target: &Path, options: &LogReadOptions) -> Result<Vec<LogLine>> {
    let filter = options.filter.as_deref();

    if !options.include_rotated {
        return read_last_lines(target, options.lines, filter);
    }

    if !crate::sink::rotation::parent_dir(target).is_dir() {
        return Ok(Vec::new());
    }

    // Oldest rotated file first, active file last
    let mut tail = VecDeque::with_capacity(options.lines.min(1024));
    for file in list_siblings(target)? {
        collect_lines(&file.path, options.lines, filter, &mut tail)?;
    }

    Ok(tail.iter().map(|line| LogLine::parse(line)).collect())
}

/// Push matching lines of `path` into `tail`, keeping only the last `limit`
fn collect_lines(
    path: &Path,
    limit: usize,
    filter: Option<&str>,
    tail: &mut VecDeque<String>,
) -> Result<()> {
    if limit == 0 {
        return Ok(());
    }

    let file = File::open(path).map_err(|e| {
        LoggerError::LogReadError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let input: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    for line in BufReader::new(input).lines() {
        let line = line.map_err(|e| {
            LoggerError::LogReadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        if let Some(pattern) = filter {
            if !line.contains(pattern) {
                continue;
            }
        }

        if tail.len() == limit {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::rotation::compress_file;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_file_line() {
        let line = LogLine::parse("[2024-01-01 10:00:00] | WARNING  | db:4: pool exhausted");
        assert_eq!(line.timestamp.as_deref(), Some("2024-01-01 10:00:00"));
        assert_eq!(line.level, Some(Level::Warning));
        assert_eq!(line.message, "db:4: pool exhausted");
    }

    #[test]
    fn test_parse_unstructured_line() {
        let line = LogLine::parse("  caused by: disk full");
        assert_eq!(line.timestamp, None);
        assert_eq!(line.level, None);
        assert_eq!(line.message, "  caused by: disk full");

        let line = LogLine::parse("[12:00] plain message");
        assert_eq!(line.timestamp.as_deref(), Some("12:00"));
        assert_eq!(line.level, None);
        assert_eq!(line.message, "plain message");
    }

    #[test]
    fn test_read_last_lines_with_filter() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(
            &path,
            "[t] | INFO     | a one\n[t] | ERROR    | a two\n[t] | ERROR    | a three\n",
        )
        .unwrap();

        let lines = read_last_lines(&path, 10, Some("ERROR")).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].message, "a three");

        let lines = read_last_lines(&path, 1, None).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "a three");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let lines = read_last_lines(&temp_dir.path().join("nope.log"), 5, None).unwrap();
        assert!(lines.is_empty());

        let options = LogReadOptions {
            include_rotated: true,
            ..LogReadOptions::default()
        };
        let lines = read_logs(&temp_dir.path().join("gone").join("app.log"), &options).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_read_logs_across_rotated_files() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("app.log");

        let oldest = temp_dir.path().join("app.log.20240101_000000");
        fs::write(&oldest, "[t] | INFO     | one\n").unwrap();
        compress_file(&oldest).unwrap();
        fs::write(temp_dir.path().join("app.log.20240102_000000"), "[t] | INFO     | two\n").unwrap();
        fs::write(&target, "[t] | INFO     | three\n").unwrap();

        let options = LogReadOptions {
            lines: 10,
            include_rotated: true,
            filter: None,
        };
        let messages: Vec<String> = read_logs(&target, &options)
            .unwrap()
            .into_iter()
            .map(|l| l.message)
            .collect();
        assert_eq!(messages, vec!["one", "two", "three"]);

        let active_only = read_logs(&target, &LogReadOptions::default()).unwrap();
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].message, "three");
    }
}
