/// A single child directory of the scanned path, paired with its aggregate size.
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

/// One child directory in a scan.
///
/// Immutable once produced. There is no identity across scans: every refresh
/// produces a fresh set of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Directory name only (NOT the full path).
    pub name: String,

    /// Absolute path of the child directory.
    pub path: PathBuf,

    /// Recursive sum of regular-file sizes below this directory.
    /// Zero when the directory could not be listed.
    pub size_bytes: u64,

    /// `false` if the caller lacks read access. The entry stays in the
    /// listing so users can see where restricted areas are.
    pub accessible: bool,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size_bytes,
            accessible: true,
        }
    }

    /// Mark the entry as restricted (no read access).
    pub fn restricted(mut self) -> Self {
        self.accessible = false;
        self
    }
}

/// Display order: size descending, ties broken by name ascending.
pub fn display_order(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.size_bytes
        .cmp(&a.size_bytes)
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort entries into display order. Deterministic for unchanged input
/// regardless of enumeration order.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(display_order);
}
