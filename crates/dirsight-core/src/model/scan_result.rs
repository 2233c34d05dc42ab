/// The complete, atomically-published output of one refresh.
use super::entry::DirectoryEntry;
use super::size::SizeUnit;
use super::volume::VolumeInfo;
use crate::error::ScanFailure;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Result of a single scan.
///
/// Built in full on the worker and handed over by value; nothing ever
/// observes a partially-assembled result.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Visible child directories, sorted by size descending then name.
    pub entries: Vec<DirectoryEntry>,

    /// Regular files directly under `scanned_path` (not recursive).
    pub file_count: u64,

    /// Entries dropped by the display threshold. They still count towards
    /// the parent's aggregate size.
    pub hidden_count: usize,

    /// Volume overlay; `None` when the probe was unavailable.
    pub volume: Option<VolumeInfo>,

    pub scanned_path: PathBuf,

    /// Unit the display threshold was applied in.
    pub unit: SizeUnit,

    pub timestamp: DateTime<Local>,

    pub duration: Duration,

    /// Per-entry failures absorbed during the walk.
    pub error_count: u64,

    /// Subtrees skipped by the maximum-depth guard.
    pub depth_limit_hits: u64,

    /// Scan generation this result belongs to.
    pub generation: u64,

    /// Set when `scanned_path` itself could not be opened.
    pub failure: Option<ScanFailure>,
}

impl ScanResult {
    /// Sum of the visible entries' sizes.
    pub fn visible_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }

    /// `true` if the scan produced nothing to show.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
