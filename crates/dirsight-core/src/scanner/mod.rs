/// Scanner module — orchestrates one full refresh of a directory.
///
/// A refresh probes the volume, lists the child directories with their
/// aggregate sizes, hides entries below the display threshold, and sorts
/// the rest. [`ScanCoordinator`] lets at most one refresh run at a time;
/// a refresh requested while one is in flight is dropped, not queued.
///
/// The busy flag and the scan generation are the only state shared with
/// the worker thread. Both live behind a single mutex. Superseded scans
/// are detected by comparing generations when they complete, and their
/// results are discarded; the walk itself also stops early once its
/// generation is stale.
pub mod aggregate;
pub mod lister;
pub mod progress;

pub use aggregate::{aggregate, SizeAggregator, WalkStats};
pub use lister::{list_children, Listing};
pub use progress::{ProgressSink, ScanMessage};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, ScanFailure};
use crate::model::{sort_entries, DirectoryEntry, ScanResult, SizeUnit};
use crate::platform::{Filesystem, OsFilesystem};
use crate::probe::VolumeProbe;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Maximum number of progress messages that may queue up in the channel.
///
/// Updates beyond this are dropped; the final `Complete` waits for room.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 1_024;

#[derive(Debug, Default)]
struct ScanGate {
    busy: bool,
    generation: u64,
}

/// Identifies one scan. Goes stale as soon as the coordinator's generation
/// moves past it.
#[derive(Debug, Clone)]
pub struct ScanToken {
    gate: Arc<Mutex<ScanGate>>,
    generation: u64,
}

impl ScanToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.gate.lock().generation != self.generation
    }
}

/// Clears the busy flag when dropped, so a panicking walk cannot wedge
/// the coordinator in `Scanning`.
struct BusyGuard {
    gate: Arc<Mutex<ScanGate>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.gate.lock().busy = false;
    }
}

/// What to scan and which unit to apply the display threshold in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub path: PathBuf,
    pub unit: SizeUnit,
}

impl ScanRequest {
    pub fn new(path: impl Into<PathBuf>, unit: SizeUnit) -> Self {
        Self {
            path: path.into(),
            unit,
        }
    }
}

/// Outcome of a synchronous [`ScanCoordinator::refresh`].
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Completed(Arc<ScanResult>),
    /// Another scan was in flight; nothing was done.
    Busy,
}

/// Outcome of [`ScanCoordinator::start_refresh`].
pub enum ScanStart {
    Started(ScanHandle),
    /// Another scan was in flight; nothing was started.
    Busy,
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    /// Progress and completion messages from the scan thread.
    pub progress_rx: Receiver<ScanMessage>,
    generation: u64,
    _thread: thread::JoinHandle<()>,
}

impl ScanHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Runs refreshes, one at a time, and keeps the latest accepted result.
pub struct ScanCoordinator {
    fs: Arc<dyn Filesystem>,
    probe: Arc<VolumeProbe>,
    config: EngineConfig,
    gate: Arc<Mutex<ScanGate>>,
    latest: Option<Arc<ScanResult>>,
}

impl ScanCoordinator {
    pub fn new(fs: Arc<dyn Filesystem>, config: EngineConfig) -> Self {
        let probe = Arc::new(VolumeProbe::new(fs.clone(), config.volume_cache_ttl()));
        Self {
            fs,
            probe,
            config,
            gate: Arc::new(Mutex::new(ScanGate::default())),
            latest: None,
        }
    }

    /// Coordinator over the real filesystem.
    pub fn with_os(config: EngineConfig) -> Self {
        Self::new(Arc::new(OsFilesystem), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.gate.lock().busy
    }

    pub fn generation(&self) -> u64 {
        self.gate.lock().generation
    }

    /// Mark any in-flight scan as superseded. Its result will be discarded
    /// by [`accept`](Self::accept) and its walk stops at the next directory.
    pub fn invalidate(&self) -> u64 {
        let mut gate = self.gate.lock();
        gate.generation += 1;
        debug!("Scan generation advanced to {}", gate.generation);
        gate.generation
    }

    /// Latest accepted result, if any.
    pub fn latest(&self) -> Option<&Arc<ScanResult>> {
        self.latest.as_ref()
    }

    /// Drop the latest result.
    pub fn clear_results(&mut self) {
        self.latest = None;
        self.probe.invalidate();
    }

    /// Idle → Scanning. `None` if a scan is already in flight.
    fn begin(&self) -> Option<(ScanToken, BusyGuard)> {
        let mut gate = self.gate.lock();
        if gate.busy {
            return None;
        }
        gate.busy = true;
        gate.generation += 1;
        let token = ScanToken {
            gate: self.gate.clone(),
            generation: gate.generation,
        };
        let guard = BusyGuard {
            gate: self.gate.clone(),
        };
        Some((token, guard))
    }

    /// Run a refresh on the calling thread, blocking for the whole walk.
    pub fn refresh(&mut self, request: &ScanRequest) -> RefreshOutcome {
        let Some((token, guard)) = self.begin() else {
            debug!("Refresh of {} coalesced: scan in flight", request.path.display());
            return RefreshOutcome::Busy;
        };
        let result = run_scan(
            self.fs.as_ref(),
            &self.probe,
            &self.config,
            request,
            &token,
            None,
        );
        drop(guard);

        // `&mut self` rules out an invalidation during the walk, so the
        // result is always current here.
        let result = Arc::new(result);
        self.latest = Some(result.clone());
        RefreshOutcome::Completed(result)
    }

    /// Run a refresh on a background thread.
    ///
    /// Progress and the final result arrive on the handle's channel. The
    /// result must be handed back through [`accept`](Self::accept) to become
    /// the latest result.
    pub fn start_refresh(&self, request: ScanRequest) -> Result<ScanStart> {
        let Some((token, guard)) = self.begin() else {
            debug!("Refresh of {} coalesced: scan in flight", request.path.display());
            return Ok(ScanStart::Busy);
        };

        let (tx, progress_rx) = crossbeam_channel::bounded::<ScanMessage>(PROGRESS_CHANNEL_CAPACITY);
        let generation = token.generation();
        let fs = self.fs.clone();
        let probe = self.probe.clone();
        let config = self.config.clone();
        let path = request.path.clone();

        let thread = thread::Builder::new()
            .name("dirsight-scanner".into())
            .spawn(move || {
                let sink = ProgressSink::new(tx.clone(), generation, config.progress_interval);
                let result = run_scan(fs.as_ref(), &probe, &config, &request, &token, Some(&sink));
                // Idle before the completion is observable.
                drop(guard);
                let _ = tx.send(ScanMessage::Complete {
                    generation,
                    result: Box::new(result),
                });
            })
            .map_err(|source| EngineError::Io { path, source })?;

        Ok(ScanStart::Started(ScanHandle {
            progress_rx,
            generation,
            _thread: thread,
        }))
    }

    /// Offer a completed result. Applied only if its generation is still
    /// current; returns whether it was applied.
    pub fn accept(&mut self, result: ScanResult) -> bool {
        let current = self.gate.lock().generation;
        if result.generation != current {
            debug!(
                "Discarding stale scan of {} (generation {} < {})",
                result.scanned_path.display(),
                result.generation,
                current
            );
            return false;
        }
        self.latest = Some(Arc::new(result));
        true
    }
}

/// Whether an entry survives the display threshold. Restricted entries are
/// always shown so inaccessible areas stay visible.
pub fn is_displayed(entry: &DirectoryEntry, unit: SizeUnit, threshold: f64) -> bool {
    !entry.accessible || unit.convert(entry.size_bytes) >= threshold
}

/// Apply the display threshold and sort into display order.
/// Returns the number of hidden entries.
pub fn filter_and_sort(entries: &mut Vec<DirectoryEntry>, unit: SizeUnit, threshold: f64) -> usize {
    let before = entries.len();
    entries.retain(|e| is_displayed(e, unit, threshold));
    sort_entries(entries);
    before - entries.len()
}

fn run_scan(
    fs: &dyn Filesystem,
    probe: &VolumeProbe,
    config: &EngineConfig,
    request: &ScanRequest,
    token: &ScanToken,
    progress: Option<&ProgressSink>,
) -> ScanResult {
    let start = Instant::now();
    info!(
        "Starting scan of {} (generation {})",
        request.path.display(),
        token.generation()
    );

    let volume = probe.probe(&request.path).ok();

    let mut aggregator = SizeAggregator::new(fs, config.max_depth).with_token(token);
    if let Some(sink) = progress {
        aggregator = aggregator.with_progress(sink);
    }

    let (mut entries, file_count, failure) =
        match list_children(fs, &request.path, &mut aggregator) {
            Ok(listing) => (listing.entries, listing.file_count, None),
            Err(err) => {
                warn!("Cannot open {}: {err}", request.path.display());
                (Vec::new(), 0, Some(ScanFailure::from_io(&err)))
            }
        };

    let hidden_count = filter_and_sort(&mut entries, request.unit, config.display_threshold);
    let stats = aggregator.stats();
    let duration = start.elapsed();

    if aggregator.is_interrupted() {
        info!(
            "Scan of {} interrupted after {duration:?}",
            request.path.display()
        );
    } else {
        info!(
            "Scan of {} complete: {} dirs shown, {} hidden, {} errors in {duration:?}",
            request.path.display(),
            entries.len(),
            hidden_count,
            stats.error_count
        );
    }

    ScanResult {
        entries,
        file_count,
        hidden_count,
        volume,
        scanned_path: request.path.clone(),
        unit: request.unit,
        timestamp: chrono::Local::now(),
        duration,
        error_count: stats.error_count,
        depth_limit_hits: stats.depth_limit_hits,
        generation: token.generation(),
        failure,
    }
}
