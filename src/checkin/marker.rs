// Success marker persistence
// A single local calendar date: the last day a check-in was confirmed

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The "already checked in today" marker. Only the most recent date is
/// kept; each successful check-in overwrites the previous one.
#[derive(Debug, Clone)]
pub struct SuccessMarker {
    path: PathBuf,
}

impl SuccessMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the last success date. Missing or unreadable content is treated
    /// as "never succeeded" rather than an error; the worst outcome of a
    /// lost marker is one redundant (idempotent) check-in.
    pub fn last_success(&self) -> Option<NaiveDate> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match NaiveDate::parse_from_str(contents.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %err,
                    "ignoring unparsable success marker"
                );
                None
            }
        }
    }

    /// True if the marker already records `today`.
    pub fn is_satisfied(&self, today: NaiveDate) -> bool {
        self.last_success() == Some(today)
    }

    /// Record a confirmed check-in for `date`, atomically.
    pub fn record(&self, date: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create marker directory: {}", parent.display())
            })?;
        }
        atomic_write(&self.path, &date.format(DATE_FORMAT).to_string())
    }
}

/// Atomically save data to a file using write-to-temp + rename, so a kill
/// mid-write can never leave a truncated date behind.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("Invalid path: {}", path.display()))?;

    // Temp file in the same directory to ensure same filesystem for rename
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown"),
        std::process::id()
    ));

    fs::write(&temp_path, contents)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let marker = SuccessMarker::new(temp_dir.path().join("last_success.txt"));
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        assert_eq!(marker.last_success(), None);
        marker.record(date).unwrap();
        assert_eq!(marker.last_success(), Some(date));
        assert!(marker.is_satisfied(date));
        assert!(!marker.is_satisfied(date.succ_opt().unwrap()));
    }

    #[test]
    fn overwrite_keeps_only_latest() {
        let temp_dir = TempDir::new().unwrap();
        let marker = SuccessMarker::new(temp_dir.path().join("last_success.txt"));
        let first = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let second = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        marker.record(first).unwrap();
        marker.record(second).unwrap();

        assert_eq!(marker.last_success(), Some(second));
        let raw = std::fs::read_to_string(temp_dir.path().join("last_success.txt")).unwrap();
        assert_eq!(raw, "2026-08-07");
    }

    #[test]
    fn corrupt_marker_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_success.txt");
        std::fs::write(&path, "yesterday-ish").unwrap();

        let marker = SuccessMarker::new(path);
        assert_eq!(marker.last_success(), None);
    }

    #[test]
    fn record_creates_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let marker = SuccessMarker::new(temp_dir.path().join("Logs/last_success.txt"));
        marker
            .record(NaiveDate::from_ymd_opt(2026, 8, 7).unwrap())
            .unwrap();
        assert!(temp_dir.path().join("Logs/last_success.txt").exists());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("value.txt");

        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // No temp files left behind
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }
}
