/// Recursive directory-size aggregation.
///
/// A single sequential walk: regular files add their size, directories
/// recurse, everything else (symlinks, sockets, devices) is ignored.
/// Symlinks are never followed, which also rules out cycles through linked
/// directories. Hard links are counted once per reference.
///
/// Failures are absorbed per entry and contribute zero. A directory that
/// cannot be opened, an entry that vanishes before it is stat'ed, or a
/// subtree beyond the depth guard never aborts the surrounding sum.
use super::progress::ProgressSink;
use super::ScanToken;
use crate::config::DEFAULT_MAX_DEPTH;
use crate::platform::{EntryKind, Filesystem, OsFilesystem};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Counters accumulated over one or more `aggregate` calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub dirs_visited: u64,
    pub files_counted: u64,
    pub bytes_counted: u64,
    /// Entries or directories that failed and were counted as zero.
    pub error_count: u64,
    /// Directories skipped because they were deeper than `max_depth`.
    pub depth_limit_hits: u64,
}

/// Sums file sizes under a directory.
///
/// Reusable across calls; statistics accumulate until the aggregator is
/// dropped. When given a [`ScanToken`], the walk stops early once the token
/// goes stale, returning whatever it had summed so far.
pub struct SizeAggregator<'a> {
    fs: &'a dyn Filesystem,
    max_depth: usize,
    token: Option<&'a ScanToken>,
    progress: Option<&'a ProgressSink>,
    stats: WalkStats,
    interrupted: bool,
}

impl<'a> SizeAggregator<'a> {
    pub fn new(fs: &'a dyn Filesystem, max_depth: usize) -> Self {
        Self {
            fs,
            max_depth,
            token: None,
            progress: None,
            stats: WalkStats::default(),
            interrupted: false,
        }
    }

    /// Stop walking once `token` is superseded.
    pub fn with_token(mut self, token: &'a ScanToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_progress(mut self, sink: &'a ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Aggregate size of everything under `path`, in bytes.
    ///
    /// Never fails: if `path` cannot be opened the result is 0.
    pub fn aggregate(&mut self, path: &Path) -> u64 {
        self.walk(path, 0)
    }

    pub fn stats(&self) -> WalkStats {
        self.stats
    }

    /// `true` once the walk has been abandoned because its token went stale.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Record a failure observed outside the walk (e.g. by the lister).
    pub(crate) fn record_error(&mut self) {
        self.stats.error_count += 1;
    }

    pub(crate) fn record_file(&mut self, size: u64) {
        self.stats.files_counted += 1;
        self.stats.bytes_counted = self.stats.bytes_counted.saturating_add(size);
    }

    fn check_interrupted(&mut self) -> bool {
        if !self.interrupted && self.token.is_some_and(ScanToken::is_stale) {
            debug!("Walk interrupted: scan generation superseded");
            self.interrupted = true;
        }
        self.interrupted
    }

    fn walk(&mut self, path: &Path, depth: usize) -> u64 {
        if depth > self.max_depth {
            self.stats.depth_limit_hits += 1;
            warn!(
                "Depth limit {} exceeded at {}; subtree counted as zero",
                self.max_depth,
                path.display()
            );
            return 0;
        }
        if self.check_interrupted() {
            return 0;
        }

        let entries = match self.fs.read_dir(path) {
            Ok(entries) => entries,
            Err(err) => {
                self.stats.error_count += 1;
                debug!("Skipping unreadable directory {}: {err}", path.display());
                return 0;
            }
        };

        self.stats.dirs_visited += 1;
        if let Some(sink) = self.progress {
            sink.report(&self.stats, path);
        }

        let mut total: u64 = 0;
        for entry in entries {
            if self.interrupted {
                break;
            }
            match entry {
                Ok(entry) => match entry.kind {
                    EntryKind::File { size } => {
                        self.record_file(size);
                        total = total.saturating_add(size);
                    }
                    EntryKind::Dir => {
                        total = total.saturating_add(self.walk(&entry.path, depth + 1));
                    }
                    EntryKind::Other => {}
                },
                Err(err) => {
                    self.stats.error_count += 1;
                    debug!("Skipping entry under {}: {err}", path.display());
                }
            }
        }
        total
    }
}

/// Aggregate size of `path` on the real filesystem with the default depth guard.
pub fn aggregate(path: &Path) -> u64 {
    SizeAggregator::new(&OsFilesystem, DEFAULT_MAX_DEPTH).aggregate(path)
}
