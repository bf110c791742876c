use super::retention::cleanup_old_logs;
use super::rotation::{compress_file, rotated_path};
use super::{Gate, Sink};
use crate::error::{ErrorReporter, LoggerError, Result, TracingReporter};
use crate::event::Event;
use crate::format::{Formatter, SimpleFormatter, DEFAULT_TIME_FORMAT};
use crate::level::Level;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default number of buffered lines before a flush
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Default number of emitted events between rotation checks
pub const DEFAULT_CHECK_ROTATION_EVERY: u64 = 100;

/// Lifecycle of a file sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Open,
    Rotating,
    Closed,
}

/// Settings for a [`FileSink`]
#[derive(Debug, Clone)]
pub struct FileSinkOptions {
    /// Minimum level accepted by the sink
    pub level: Level,
    /// Rotate once the active file reaches this many bytes
    pub rotation_size: Option<u64>,
    /// Rotate once the active file is this old
    pub rotation_interval: Option<Duration>,
    /// Delete rotated siblings older than this many days
    pub retention_days: Option<u32>,
    /// Gzip rotated files
    pub compression: bool,
    /// Buffered lines that trigger a flush
    pub buffer_size: usize,
    /// Emitted events between rotation checks
    pub check_rotation_every: u64,
    /// strftime pattern for line timestamps
    pub time_format: String,
}

impl Default for FileSinkOptions {
    fn default() -> Self {
        Self {
            level: Level::Trace,
            rotation_size: None,
            rotation_interval: None,
            retention_days: None,
            compression: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            check_rotation_every: DEFAULT_CHECK_ROTATION_EVERY,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl FileSinkOptions {
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn rotation_size(mut self, bytes: u64) -> Self {
        self.rotation_size = Some(bytes);
        self
    }

    pub fn rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = Some(interval);
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn buffer_size(mut self, lines: usize) -> Self {
        self.buffer_size = lines;
        self
    }

    pub fn check_rotation_every(mut self, events: u64) -> Self {
        self.check_rotation_every = events;
        self
    }

    pub fn time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }
}

/// Buffered, rotating, retention-aware file sink.
///
/// A single process must own each target path; two sinks on the same file
/// interleave and rotate each other's data.
pub struct FileSink {
    gate: Gate,
    formatter: Box<dyn Formatter>,
    reporter: Arc<dyn ErrorReporter>,
    state: Mutex<FileState>,
}

/// Everything guarded by the sink lock
struct FileState {
    target: PathBuf,
    pending: Vec<String>,
    buffer_capacity: usize,
    emitted: u64,
    check_every: u64,
    rotation_size: Option<u64>,
    rotation_interval: Option<Duration>,
    started_at: Option<DateTime<Local>>,
    retention_days: Option<u32>,
    compress: bool,
    phase: SinkState,
    flushes: u64,
    rotations: u64,
}

impl FileSink {
    /// Create a file sink with default options
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, FileSinkOptions::default())
    }

    /// Create a file sink reporting degraded I/O through `tracing`
    pub fn with_options(path: impl AsRef<Path>, options: FileSinkOptions) -> Result<Self> {
        Self::open(path, options, Arc::new(TracingReporter))
    }

    /// Create a file sink.
    ///
    /// The parent directory is created if missing; failing to create it is the
    /// only construction error. With retention configured, one cleanup pass
    /// runs immediately.
    pub fn open(
        path: impl AsRef<Path>,
        options: FileSinkOptions,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let target = path.as_ref().to_path_buf();

        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| LoggerError::DirectoryCreation {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let state = FileState {
            target,
            pending: Vec::with_capacity(options.buffer_size.max(1)),
            buffer_capacity: options.buffer_size.max(1),
            emitted: 0,
            check_every: options.check_rotation_every.max(1),
            rotation_size: options.rotation_size,
            rotation_interval: options.rotation_interval,
            started_at: None,
            retention_days: options.retention_days,
            compress: options.compression,
            phase: SinkState::Open,
            flushes: 0,
            rotations: 0,
        };

        if state.retention_days.is_some() {
            state.cleanup(reporter.as_ref());
        }

        Ok(Self {
            gate: Gate::new(options.level),
            formatter: Box::new(SimpleFormatter::new(options.time_format)),
            reporter,
            state: Mutex::new(state),
        })
    }

    /// Replace the line formatter
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    fn lock(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> PathBuf {
        self.lock().target.clone()
    }

    pub fn state(&self) -> SinkState {
        self.lock().phase
    }

    /// Lines formatted but not yet written, oldest first
    pub fn pending_lines(&self) -> Vec<String> {
        self.lock().pending.clone()
    }

    /// Number of successful flushes that wrote at least one line
    pub fn flush_count(&self) -> u64 {
        self.lock().flushes
    }

    /// Number of successful renames of the active file
    pub fn rotation_count(&self) -> u64 {
        self.lock().rotations
    }

    /// Events accepted since creation
    pub fn emitted_count(&self) -> u64 {
        self.lock().emitted
    }

    /// Write pending lines now; returns false if they had to be kept
    pub fn try_flush(&self) -> bool {
        self.lock().flush(self.reporter.as_ref())
    }

    /// Run a rotation check immediately, regardless of the event counter
    pub fn check_rotation(&self) -> bool {
        let mut state = self.lock();
        if state.phase == SinkState::Closed || !state.should_rotate() {
            return false;
        }
        state.flush(self.reporter.as_ref());
        state.rotate(self.reporter.as_ref());
        true
    }

    /// Delete expired rotated siblings now; returns how many were removed
    pub fn cleanup_retention(&self) -> usize {
        self.lock().cleanup(self.reporter.as_ref())
    }
}

impl Sink for FileSink {
    fn gate(&self) -> &Gate {
        &self.gate
    }

    fn write(&self, event: &Event) {
        let mut line = self.formatter.format(event);
        line.push('\n');

        let reporter = self.reporter.as_ref();
        let mut state = self.lock();
        if state.phase == SinkState::Closed {
            return;
        }

        state.pending.push(line);
        if state.pending.len() >= state.buffer_capacity {
            state.flush(reporter);
        }

        state.emitted += 1;
        if state.emitted % state.check_every == 0 && state.should_rotate() {
            // Flush first so buffered lines land in the file being rotated
            state.flush(reporter);
            state.rotate(reporter);
        }
    }

    fn flush(&self) {
        self.try_flush();
    }

    fn close(&self) {
        let mut state = self.lock();
        if state.phase == SinkState::Closed {
            return;
        }
        state.flush(self.reporter.as_ref());
        state.phase = SinkState::Closed;
        tracing::debug!(
            target: "dlogger",
            path = %state.target.display(),
            unflushed = state.pending.len(),
            "File sink closed"
        );
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl FileState {
    /// Swap the buffer out and append it to the target. On failure the batch
    /// goes back in front of anything buffered since.
    fn flush(&mut self, reporter: &dyn ErrorReporter) -> bool {
        if self.pending.is_empty() {
            return true;
        }

        let mut batch = std::mem::take(&mut self.pending);
        match append_lines(&self.target, &batch) {
            Ok(()) => {
                self.flushes += 1;
                true
            }
            Err(source) => {
                let lines = batch.len();
                batch.append(&mut self.pending);
                self.pending = batch;
                reporter.report(&LoggerError::FlushFailed {
                    path: self.target.clone(),
                    lines,
                    source,
                });
                false
            }
        }
    }

    fn should_rotate(&mut self) -> bool {
        let metadata = match fs::metadata(&self.target) {
            Ok(metadata) => metadata,
            Err(_) => return false,
        };

        if let Some(limit) = self.rotation_size {
            if metadata.len() >= limit {
                return true;
            }
        }

        if let Some(interval) = self.rotation_interval {
            let started = *self.started_at.get_or_insert_with(Local::now);
            let elapsed = Local::now()
                .signed_duration_since(started)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if elapsed >= interval {
                return true;
            }
        }

        false
    }

    fn rotate(&mut self, reporter: &dyn ErrorReporter) {
        if !self.target.exists() {
            return;
        }

        self.phase = SinkState::Rotating;
        let rotated = rotated_path(&self.target, Local::now());

        match fs::rename(&self.target, &rotated) {
            Ok(()) => {
                self.rotations += 1;
                tracing::info!(
                    target: "dlogger",
                    from = %self.target.display(),
                    to = %rotated.display(),
                    "Rotated log file"
                );

                if self.compress {
                    if let Err(source) = compress_file(&rotated) {
                        reporter.report(&LoggerError::CompressionFailed {
                            path: rotated.clone(),
                            source,
                        });
                    }
                }

                self.started_at = Some(Local::now());

                if self.retention_days.is_some() {
                    self.cleanup(reporter);
                }
            }
            Err(source) => {
                // The old file stays in place and keeps receiving appends
                reporter.report(&LoggerError::RotationFailed {
                    path: self.target.clone(),
                    source,
                });
            }
        }

        self.phase = SinkState::Open;
    }

    fn cleanup(&self, reporter: &dyn ErrorReporter) -> usize {
        let Some(days) = self.retention_days else {
            return 0;
        };

        match cleanup_old_logs(&self.target, days, reporter) {
            Ok(deleted) => deleted,
            Err(err) => {
                reporter.report(&err);
                0
            }
        }
    }
}

/// Append a batch with a single write so a failure never leaves half a line
fn append_lines(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let chunk = lines.concat();
    file.write_all(chunk.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryReporter;
    use tempfile::TempDir;

    fn sink_with(dir: &Path, options: FileSinkOptions) -> (FileSink, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        let sink = FileSink::open(dir.join("app.log"), options, reporter.clone()).unwrap();
        (sink, reporter)
    }

    fn info(message: &str) -> Event {
        Event::new(Level::Info, message, "test:1:")
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("app.log");

        let sink = FileSink::new(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(sink.state(), SinkState::Open);
        assert!(!path.exists());
    }

    #[test]
    fn test_directory_creation_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"not a dir").unwrap();

        let result = FileSink::new(blocker.join("app.log"));
        assert!(matches!(result, Err(LoggerError::DirectoryCreation { .. })));
    }

    #[test]
    fn test_buffer_flushes_at_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(temp_dir.path(), FileSinkOptions::default().buffer_size(2));

        sink.emit(&info("a"));
        sink.emit(&info("b"));
        sink.emit(&info("c"));

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a"));
        assert!(lines[1].ends_with(" b"));

        let pending = sink.pending_lines();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].ends_with(" c\n"));
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn test_rejected_event_has_no_effect() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default().level(Level::Warning).buffer_size(1),
        );

        sink.emit(&info("ignored"));
        assert!(sink.pending_lines().is_empty());
        assert_eq!(sink.emitted_count(), 0);
        assert_eq!(sink.flush_count(), 0);
        assert!(!sink.path().exists());
    }

    #[test]
    fn test_failed_flush_requeues_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, reporter) = sink_with(temp_dir.path(), FileSinkOptions::default().buffer_size(2));

        // A directory at the target path makes every append fail
        fs::create_dir(sink.path()).unwrap();

        sink.emit(&info("one"));
        sink.emit(&info("two"));
        sink.emit(&info("three"));

        let pending = sink.pending_lines();
        assert_eq!(pending.len(), 3);
        assert!(pending[0].ends_with(" one\n"));
        assert!(pending[1].ends_with(" two\n"));
        assert!(pending[2].ends_with(" three\n"));
        // Second and third emits both hit the capacity and both fail
        assert_eq!(reporter.len(), 2);

        fs::remove_dir(sink.path()).unwrap();
        assert!(sink.try_flush());

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" one"));
        assert!(lines[2].ends_with(" three"));
        assert!(sink.pending_lines().is_empty());
    }

    #[test]
    fn test_size_rotation_at_check_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, reporter) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default()
                .buffer_size(1)
                .check_rotation_every(4)
                .rotation_size(64),
        );

        for i in 0..4 {
            sink.emit(&info(&format!("line number {}", i)));
        }

        assert_eq!(sink.rotation_count(), 1);
        assert!(!sink.path().exists());

        sink.emit(&info("fresh"));
        let size = fs::metadata(sink.path()).unwrap().len();
        assert!(size < 64);
        assert!(reporter.is_empty());

        let rotated: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("app.log."))
            .collect();
        assert_eq!(rotated.len(), 1);
    }

    #[test]
    fn test_no_rotation_between_checks() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default()
                .buffer_size(1)
                .check_rotation_every(100)
                .rotation_size(1),
        );

        for i in 0..99 {
            sink.emit(&info(&format!("{}", i)));
        }
        assert_eq!(sink.rotation_count(), 0);

        sink.emit(&info("99"));
        assert_eq!(sink.rotation_count(), 1);
    }

    #[test]
    fn test_rotation_flushes_buffer_into_old_file() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default()
                .buffer_size(10)
                .check_rotation_every(3)
                .rotation_size(1),
        );

        fs::write(sink.path(), b"existing\n").unwrap();
        sink.emit(&info("a"));
        sink.emit(&info("b"));
        sink.emit(&info("c"));

        assert_eq!(sink.rotation_count(), 1);
        assert!(sink.pending_lines().is_empty());

        let rotated = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().starts_with("app.log."))
            .unwrap();
        let content = fs::read_to_string(rotated.path()).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.ends_with(" c\n"));
    }

    #[test]
    fn test_time_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default()
                .buffer_size(1)
                .check_rotation_every(1)
                .rotation_interval(Duration::ZERO),
        );

        sink.emit(&info("first"));
        assert_eq!(sink.rotation_count(), 1);
    }

    #[test]
    fn test_missing_file_never_rotates() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default().rotation_size(0),
        );

        assert!(!sink.check_rotation());
        assert_eq!(sink.rotation_count(), 0);
    }

    #[test]
    fn test_compressed_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, reporter) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default()
                .buffer_size(1)
                .check_rotation_every(1)
                .rotation_size(1)
                .compression(true),
        );

        sink.emit(&info("compress me"));
        assert_eq!(sink.rotation_count(), 1);
        assert!(reporter.is_empty());

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("app.log."));
        assert!(names[0].ends_with(".gz"));
    }

    #[test]
    fn test_close_flushes_and_stops() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(temp_dir.path(), FileSinkOptions::default());

        sink.emit(&info("kept"));
        assert!(!sink.path().exists());

        sink.close();
        assert_eq!(sink.state(), SinkState::Closed);
        assert_eq!(sink.flush_count(), 1);

        sink.emit(&info("after close"));
        assert!(sink.pending_lines().is_empty());

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("kept"));
    }

    #[test]
    fn test_drop_flushes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        {
            let sink = FileSink::new(&path).unwrap();
            sink.emit(&info("on drop"));
        }
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("on drop"));
    }

    #[test]
    fn test_line_format() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, _) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default().buffer_size(1).time_format("%Y"),
        );

        sink.emit(&Event::new(Level::Error, "failed", "db:9:"));
        let content = fs::read_to_string(sink.path()).unwrap();
        let year = Local::now().format("%Y").to_string();
        assert_eq!(content, format!("[{}] | ERROR    | db:9: failed\n", year));
    }

    fn aged_sibling(dir: &Path, name: &str, days: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "old\n").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        let when = std::time::SystemTime::now() - Duration::from_secs(days * 86_400);
        file.set_modified(when).unwrap();
        path
    }

    #[test]
    fn test_retention_runs_at_construction() {
        let temp_dir = TempDir::new().unwrap();
        let expired = aged_sibling(temp_dir.path(), "app.log.20200101_000000", 10);
        let recent = temp_dir.path().join("app.log.20200102_000000.gz");
        fs::write(&recent, "recent").unwrap();

        let (_sink, reporter) =
            sink_with(temp_dir.path(), FileSinkOptions::default().retention_days(1));

        assert!(!expired.exists());
        assert!(recent.exists());
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_retention_runs_after_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let (sink, reporter) = sink_with(
            temp_dir.path(),
            FileSinkOptions::default()
                .buffer_size(1)
                .check_rotation_every(2)
                .rotation_size(1)
                .retention_days(1),
        );

        // Appears after construction, so only the rotation pass can remove it
        let expired = aged_sibling(temp_dir.path(), "app.log.20200101_000000", 10);

        sink.emit(&info("first"));
        assert!(expired.exists());
        sink.emit(&info("second"));
        assert_eq!(sink.rotation_count(), 1);
        assert!(!expired.exists());

        sink.emit(&info("third"));
        assert!(reporter.is_empty());

        let files = crate::sink::rotation::list_siblings(&sink.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(!files[0].active);
        let rotated = fs::read_to_string(&files[0].path).unwrap();
        assert!(rotated.contains("first") && rotated.contains("second"));
        assert!(files[1].active);
        assert!(fs::read_to_string(sink.path()).unwrap().contains("third"));
    }

    #[test]
    fn test_flush_count_matches_buffer_arithmetic() {
        // (events, buffer_size)
        let cases = [(0, 3), (2, 5), (5, 5), (6, 3), (7, 3), (10, 4), (5, 1)];

        for (events, capacity) in cases {
            let temp_dir = TempDir::new().unwrap();
            let (sink, _) = sink_with(
                temp_dir.path(),
                FileSinkOptions::default().buffer_size(capacity),
            );

            for i in 0..events {
                sink.emit(&info(&format!("event {}", i)));
            }

            let full_batches = (events / capacity) as u64;
            let remainder = (events % capacity != 0) as u64;
            assert_eq!(
                sink.flush_count(),
                full_batches,
                "before close: {} events, buffer {}",
                events,
                capacity
            );

            sink.close();
            assert_eq!(
                sink.flush_count(),
                full_batches + remainder,
                "after close: {} events, buffer {}",
                events,
                capacity
            );

            let written = fs::read_to_string(sink.path()).unwrap_or_default();
            assert_eq!(written.lines().count(), events);
        }
    }
}
