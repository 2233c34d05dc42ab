/// Session state management.
///
/// One session owns one `NavigationController` and one `ScanCoordinator`
/// and is driven from a single controlling context (REPL loop, UI frame,
/// request handler). Scans run on a background thread and report back over
/// a channel; state updates happen in `process_scan_messages()`, which the
/// controlling context calls whenever it can.
///
/// Navigating while a scan is in flight marks that scan stale and records a
/// single pending refresh, started as soon as the stale scan reports back.
use crossbeam_channel::TryRecvError;
use dirsight_core::config::EngineConfig;
use dirsight_core::error::{NavError, Result};
use dirsight_core::model::{ScanResult, SizeUnit};
use dirsight_core::navigation::{NavAction, NavOutcome, NavigationController};
use dirsight_core::platform::{Filesystem, OsFilesystem};
use dirsight_core::scanner::{ScanCoordinator, ScanHandle, ScanMessage, ScanRequest, ScanStart};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The current phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No scan in progress and nothing to show.
    Idle,
    /// A background scan is running.
    Scanning,
    /// A result for the current path is available.
    Results,
}

/// Maximum number of scan messages drained from the channel per call.
///
/// Keeps a single call short even if the controlling context fell behind.
const MAX_MESSAGES_PER_CALL: usize = 300;

pub struct Session {
    // ── Navigation ─────────────────────────────────────
    navigator: NavigationController,

    // ── Scan ───────────────────────────────────────────
    coordinator: ScanCoordinator,
    pub phase: SessionPhase,
    unit: SizeUnit,
    scan_handle: Option<ScanHandle>,
    /// Set when the path or unit changed during a scan.
    refresh_pending: bool,
    pub scan_dirs_visited: u64,
    pub scan_files_counted: u64,
    pub scan_bytes_counted: u64,
    pub scan_current_path: String,
    /// Completed scans dropped because they were superseded.
    pub discarded_results: u64,
}

impl Session {
    /// Session over the real filesystem.
    pub fn new(config: EngineConfig, start: impl Into<PathBuf>) -> Self {
        Self::with_filesystem(Arc::new(OsFilesystem), config, start)
    }

    pub fn with_filesystem(
        fs: Arc<dyn Filesystem>,
        config: EngineConfig,
        start: impl Into<PathBuf>,
    ) -> Self {
        let unit = config.default_unit;
        let navigator = NavigationController::new(fs.clone(), start, config.max_history);
        Self {
            navigator,
            coordinator: ScanCoordinator::new(fs, config),
            phase: SessionPhase::Idle,
            unit,
            scan_handle: None,
            refresh_pending: false,
            scan_dirs_visited: 0,
            scan_files_counted: 0,
            scan_bytes_counted: 0,
            scan_current_path: String::new(),
            discarded_results: 0,
        }
    }

    pub fn current_path(&self) -> &Path {
        self.navigator.current_path()
    }

    pub fn history(&self) -> &[PathBuf] {
        self.navigator.history()
    }

    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    pub fn config(&self) -> &EngineConfig {
        self.coordinator.config()
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_handle.is_some()
    }

    /// `true` if a refresh will start once the current scan reports back.
    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    /// The latest accepted scan result, if any.
    pub fn result(&self) -> Option<&ScanResult> {
        self.coordinator.latest().map(|r| r.as_ref())
    }

    /// Start a background refresh of the current path.
    ///
    /// Returns `false` (and does nothing) if a scan is already in flight.
    pub fn request_refresh(&mut self) -> Result<bool> {
        if self.scan_handle.is_some() {
            debug!("Refresh request dropped: scan in flight");
            return Ok(false);
        }
        let request = ScanRequest::new(self.navigator.current_path(), self.unit);
        match self.coordinator.start_refresh(request)? {
            ScanStart::Started(handle) => {
                self.phase = SessionPhase::Scanning;
                self.scan_dirs_visited = 0;
                self.scan_files_counted = 0;
                self.scan_bytes_counted = 0;
                self.scan_current_path = self.navigator.current_path().to_string_lossy().into_owned();
                self.scan_handle = Some(handle);
                Ok(true)
            }
            ScanStart::Busy => Ok(false),
        }
    }

    /// Apply a navigation action. A successful move refreshes the new path,
    /// or queues the refresh if a scan is in flight.
    pub fn navigate(&mut self, action: NavAction) -> std::result::Result<NavOutcome, NavError> {
        let outcome = self.navigator.navigate(action)?;
        if outcome.moved() {
            self.schedule_refresh();
        }
        Ok(outcome)
    }

    /// Path of the `index`th displayed entry of the latest result.
    pub fn entry_path(&self, index: usize) -> Option<PathBuf> {
        self.result()
            .and_then(|r| r.entries.get(index))
            .map(|e| e.path.clone())
    }

    /// Switch the display unit and refresh with it.
    pub fn set_unit(&mut self, unit: SizeUnit) {
        if unit == self.unit {
            return;
        }
        info!("Display unit changed to {unit}");
        self.unit = unit;
        self.schedule_refresh();
    }

    /// Drop the latest result. Does not affect a scan in flight.
    pub fn clear_results(&mut self) {
        self.coordinator.clear_results();
        if self.phase == SessionPhase::Results {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Process pending scan messages.
    ///
    /// Returns `true` if anything changed.
    pub fn process_scan_messages(&mut self) -> bool {
        let mut changed = false;
        let mut finished = false;

        for _ in 0..MAX_MESSAGES_PER_CALL {
            let msg = match &self.scan_handle {
                Some(handle) => handle.progress_rx.try_recv(),
                None => break,
            };
            match msg {
                Ok(ScanMessage::Update {
                    dirs_visited,
                    files_counted,
                    bytes_counted,
                    current_path,
                    ..
                }) => {
                    self.scan_dirs_visited = dirs_visited;
                    self.scan_files_counted = files_counted;
                    self.scan_bytes_counted = bytes_counted;
                    self.scan_current_path = current_path;
                    changed = true;
                }
                Ok(ScanMessage::Complete { result, .. }) => {
                    if !self.coordinator.accept(*result) {
                        self.discarded_results += 1;
                    }
                    self.scan_handle = None;
                    finished = true;
                    changed = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Scan thread exited without reporting a result");
                    self.scan_handle = None;
                    finished = true;
                    changed = true;
                    break;
                }
            }
        }

        if finished {
            self.phase = if self.result().is_some() {
                SessionPhase::Results
            } else {
                SessionPhase::Idle
            };
            if std::mem::take(&mut self.refresh_pending) {
                debug!("Starting pending refresh of {}", self.current_path().display());
                if let Err(e) = self.request_refresh() {
                    warn!("Pending refresh failed to start: {e}");
                }
            }
        }
        changed
    }

    /// Pump messages until no scan is in flight or `timeout` elapses.
    /// Returns `true` if the session went idle.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_scan_messages();
            if !self.is_scanning() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn schedule_refresh(&mut self) {
        if self.scan_handle.is_some() {
            self.coordinator.invalidate();
            self.refresh_pending = true;
            return;
        }
        if let Err(e) = self.request_refresh() {
            warn!("Refresh failed to start: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsight_core::platform::MemoryFilesystem;

    fn session(fs: &Arc<MemoryFilesystem>, start: &str) -> Session {
        let config = EngineConfig {
            display_threshold: 0.0,
            default_unit: SizeUnit::Bytes,
            ..EngineConfig::default()
        };
        Session::with_filesystem(fs.clone(), config, start)
    }

    #[test]
    fn new_session_is_idle_without_result() {
        let fs = Arc::new(MemoryFilesystem::new());
        let s = session(&fs, "/");
        assert_eq!(s.phase, SessionPhase::Idle);
        assert!(s.result().is_none());
        assert!(!s.is_scanning());
    }

    #[test]
    fn refresh_while_scanning_is_dropped() {
        let fs = Arc::new(MemoryFilesystem::new());
        fs.add_file("/d/a/f", 1);
        let release = fs.pause_at("/d");
        let mut s = session(&fs, "/d");

        assert!(s.request_refresh().unwrap());
        assert!(!s.request_refresh().unwrap());
        assert!(!s.refresh_pending());

        drop(release);
        assert!(s.wait_until_idle(Duration::from_secs(10)));
        assert_eq!(s.phase, SessionPhase::Results);
        assert_eq!(s.discarded_results, 0);
    }

    #[test]
    fn unit_change_reuses_path() {
        let fs = Arc::new(MemoryFilesystem::new());
        fs.add_file("/d/a/f", 1);
        let mut s = session(&fs, "/d");
        s.set_unit(SizeUnit::Kb);
        assert!(s.wait_until_idle(Duration::from_secs(10)));
        let result = s.result().unwrap();
        assert_eq!(result.unit, SizeUnit::Kb);
        assert_eq!(result.scanned_path, Path::new("/d"));
    }
}
