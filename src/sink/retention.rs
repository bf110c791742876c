//! Log file retention management
//!
//! Deletes rotated siblings of a log file once they are older than the
//! retention period.

use super::rotation::{base_name, parent_dir};
use crate::error::{ErrorReporter, LoggerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Delete siblings of `target` last modified more than `retention_days` ago.
///
/// Only files whose name starts with the target's file name are considered,
/// and the target itself is never deleted. A file that cannot be removed is
/// passed to `reporter` and skipped. Returns the number of files removed.
pub fn cleanup_old_logs(
    target: &Path,
    retention_days: u32,
    reporter: &dyn ErrorReporter,
) -> Result<usize> {
    let retention = Duration::from_secs(u64::from(retention_days) * SECONDS_PER_DAY);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    cleanup_before(target, cutoff, reporter)
}

/// Delete siblings of `target` last modified before `cutoff`
pub fn cleanup_before(
    target: &Path,
    cutoff: SystemTime,
    reporter: &dyn ErrorReporter,
) -> Result<usize> {
    let expired = expired_siblings(target, cutoff)?;
    Ok(remove_expired(&expired, reporter))
}

/// Rotated siblings of `target` last modified before `cutoff`
pub fn expired_siblings(target: &Path, cutoff: SystemTime) -> Result<Vec<PathBuf>> {
    let dir = parent_dir(target);
    let base = base_name(target)?;

    let entries = fs::read_dir(&dir).map_err(|source| LoggerError::RetentionFailed {
        path: dir.clone(),
        source,
    })?;

    let mut expired = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();

        // Only rotated siblings of this log file
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.starts_with(&base) && name != base => {}
            _ => continue,
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        if metadata.modified().is_ok_and(|modified| modified < cutoff) {
            expired.push(path);
        }
    }

    Ok(expired)
}

/// Remove each file, reporting the ones that fail. Returns how many went.
fn remove_expired(paths: &[PathBuf], reporter: &dyn ErrorReporter) -> usize {
    let mut deleted_count = 0;

    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {
                deleted_count += 1;
                tracing::debug!(
                    target: "dlogger",
                    path = %path.display(),
                    "Deleted expired log file"
                );
            }
            Err(source) => reporter.report(&LoggerError::RetentionFailed {
                path: path.clone(),
                source,
            }),
        }
    }

    deleted_count
}
