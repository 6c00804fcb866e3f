//! Segment store implementation

use crate::StoreError;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H-%M-%S";

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory the store lives under
    pub root: PathBuf,
    /// Folder created under the root for all segments
    pub folder_name: String,
    /// Footage older than this many days is deleted on sweep
    pub retention_days: i64,
    /// Segment file extension
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            folder_name: "DashCam".to_string(),
            retention_days: 7,
            extension: "mp4".to_string(),
        }
    }
}

/// One finalized segment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Segments recorded on one date, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySegments {
    /// Date folder name (YYYY-MM-DD)
    pub date: String,
    pub segments: Vec<SegmentFile>,
}

/// Filesystem-backed segment store
pub struct SegmentStore {
    base: PathBuf,
    retention_days: i64,
    extension: String,
}

impl SegmentStore {
    /// Open the store, creating the base folder when absent
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let base = config.root.join(&config.folder_name);
        fs::create_dir_all(&base)?;
        info!(base = %base.display(), retention_days = config.retention_days, "segment store opened");
        Ok(Self {
            base,
            retention_days: config.retention_days,
            extension: config.extension,
        })
    }

    /// Base directory all date folders live under
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Allocate the path for a new segment: `<base>/<YYYY-MM-DD>/<HH-MM-SS>.<ext>`.
    ///
    /// Two allocations within the same second yield the same path; the
    /// later writer overwrites the earlier target. Known limitation,
    /// accepted for now.
    pub fn allocate_path(&self) -> Result<PathBuf, StoreError> {
        let now = Local::now();
        let folder = self.base.join(now.format(DATE_FORMAT).to_string());
        fs::create_dir_all(&folder)?;

        let path = folder.join(format!("{}.{}", now.format(TIME_FORMAT), self.extension));
        debug!(path = %path.display(), "allocated segment path");
        Ok(path)
    }

    /// Register a completed segment and run the retention sweep.
    ///
    /// Idempotent: finalizing an already-finalized path re-reads the same
    /// metadata and only repeats the normal sweep.
    pub fn finalize(&self, path: &Path) -> Result<SegmentFile, StoreError> {
        let meta = fs::metadata(path)?;
        let segment = SegmentFile {
            path: path.to_path_buf(),
            file_name: file_name_of(path),
            size_bytes: meta.len(),
        };
        info!(
            path = %path.display(),
            size_bytes = segment.size_bytes,
            "segment finalized"
        );

        self.sweep_expired();
        Ok(segment)
    }

    /// Delete date folders strictly older than the retention window.
    ///
    /// Folders whose names do not parse as dates are kept: an
    /// unrecognized folder is never data we are allowed to delete.
    /// Sweep errors are logged and never block recording.
    pub fn sweep_expired(&self) {
        let cutoff = (Local::now() - Duration::days(self.retention_days)).naive_local();

        let entries = match fs::read_dir(&self.base) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("retention sweep skipped: {e}");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();

            let date = match NaiveDate::parse_from_str(&name, DATE_FORMAT) {
                Ok(date) => date,
                Err(e) => {
                    warn!(folder = %name, "skipping unrecognized folder: {e}");
                    continue;
                }
            };
            let Some(folder_start) = date.and_hms_opt(0, 0, 0) else {
                continue;
            };

            if folder_start < cutoff {
                match fs::remove_dir_all(&path) {
                    Ok(()) => info!(folder = %name, "deleted expired footage"),
                    Err(e) => warn!(folder = %name, "failed to delete expired folder: {e}"),
                }
            }
        }
    }

    /// List all segments grouped by date folder, newest date first and
    /// newest file first within each date. Empty folders are omitted.
    pub fn list_segments(&self) -> Result<Vec<DaySegments>, StoreError> {
        let mut days = Vec::new();

        for entry in fs::read_dir(&self.base)?.flatten() {
            let folder = entry.path();
            if !folder.is_dir() {
                continue;
            }
            let date = entry.file_name().to_string_lossy().into_owned();

            let mut segments = Vec::new();
            for file in fs::read_dir(&folder)?.flatten() {
                let path = file.path();
                if !path.is_file() {
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                    continue;
                }
                let size_bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
                segments.push(SegmentFile {
                    file_name: file_name_of(&path),
                    path,
                    size_bytes,
                });
            }

            if segments.is_empty() {
                continue;
            }
            segments.sort_by(|a, b| b.file_name.cmp(&a.file_name));
            days.push(DaySegments { date, segments });
        }

        days.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(days)
    }

    /// Total bytes stored under the base folder.
    ///
    /// Capacity reporting only; retention decisions are purely
    /// folder-age based.
    pub fn total_usage_bytes(&self) -> u64 {
        dir_size(&self.base)
    }

    /// Delete a single segment file
    pub fn delete(&self, path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        fs::remove_file(path)?;
        info!(path = %path.display(), "segment deleted");
        Ok(())
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            }
        })
        .sum()
}
