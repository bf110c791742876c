//! Rotated file naming, compression and sibling discovery

use crate::error::{LoggerError, Result};
use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Timestamp suffix appended to rotated files
pub const ROTATION_SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<target>.<YYYYMMDD_HHMMSS>`
pub fn rotated_path(target: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".");
    name.push(now.format(ROTATION_SUFFIX_FORMAT).to_string());
    PathBuf::from(name)
}

/// Gzip `path` into `<path>.gz` and remove the original.
///
/// On failure the original is kept and any partial archive is removed.
pub fn compress_file(path: &Path) -> io::Result<PathBuf> {
    let mut gz_name = OsString::from(path.as_os_str());
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);

    let result = (|| -> io::Result<()> {
        let mut input = BufReader::new(File::open(path)?);
        let output = BufWriter::new(File::create(&gz_path)?);
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()
    })();

    match result {
        Ok(()) => {
            fs::remove_file(path)?;
            Ok(gz_path)
        }
        Err(e) => {
            let _ = fs::remove_file(&gz_path);
            Err(e)
        }
    }
}

/// A log file on disk related to a sink target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    /// True for the active target itself
    pub active: bool,
}

impl LogFileInfo {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_compressed(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "gz")
    }
}

/// The active file and every sibling whose name starts with its file name.
///
/// Rotated siblings come first in name order (oldest suffix first); the active
/// file, if it exists, is last.
pub fn list_siblings(target: &Path) -> Result<Vec<LogFileInfo>> {
    let dir = parent_dir(target);
    let base = base_name(target)?;

    let entries = fs::read_dir(&dir).map_err(|source| LoggerError::LogReadError(format!(
        "Failed to list {}: {}",
        dir.display(),
        source
    )))?;

    let mut rotated = Vec::new();
    let mut active = None;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&base) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let info = LogFileInfo {
            path: entry.path(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            active: name == base,
        };

        if info.active {
            active = Some(info);
        } else {
            rotated.push(info);
        }
    }

    rotated.sort_by(|a, b| a.path.cmp(&b.path));
    rotated.extend(active);
    Ok(rotated)
}

/// Directory holding the target, `.` for bare file names
pub(crate) fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub(crate) fn base_name(target: &Path) -> Result<String> {
    target
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            LoggerError::ConfigError(format!("Invalid log file name: {}", target.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_rotated_path_format() {
        let now = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let path = rotated_path(Path::new("/var/log/app.log"), now);
        assert_eq!(path, PathBuf::from("/var/log/app.log.20240506_070809"));
    }

    #[test]
    fn test_compress_file_replaces_original() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log.20240506_070809");
        fs::write(&path, "line one\nline two\n").unwrap();

        let gz = compress_file(&path).unwrap();
        assert!(!path.exists());
        assert!(gz.to_string_lossy().ends_with(".20240506_070809.gz"));

        let mut decoded = String::new();
        GzDecoder::new(File::open(&gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "line one\nline two\n");
    }

    #[test]
    fn test_compress_missing_file_fails_cleanly() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.log");

        assert!(compress_file(&path).is_err());
        assert!(!temp_dir.path().join("gone.log.gz").exists());
    }

    #[test]
    fn test_list_siblings_order() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("app.log");
        fs::write(&target, "active").unwrap();
        fs::write(temp_dir.path().join("app.log.20240102_000000"), "b").unwrap();
        fs::write(temp_dir.path().join("app.log.20240101_000000.gz"), "a").unwrap();
        fs::write(temp_dir.path().join("other.log"), "x").unwrap();

        let files = list_siblings(&target).unwrap();
        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "app.log.20240101_000000.gz",
                "app.log.20240102_000000",
                "app.log"
            ]
        );
        assert!(files[0].is_compressed());
        assert!(files[2].active);
        assert_eq!(files[2].size, 6);
    }
}
