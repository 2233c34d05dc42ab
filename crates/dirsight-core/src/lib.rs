/// DirSight Core — directory-size aggregation, scanning, and navigation.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be driven by any controlling context (REPL, GUI, HTTP).
///
/// # Modules
///
/// - [`model`] — Directory entries, scan results, volume info, and size units.
/// - [`scanner`] — Recursive size aggregation and the one-at-a-time scan coordinator.
/// - [`navigation`] — Current path and back-history, with validated transitions.
/// - [`probe`] — Volume totals for the directory being viewed, behind a TTL cache.
/// - [`platform`] — Filesystem access layer (real and in-memory) and permission checks.
/// - [`config`] — Engine configuration loaded from JSON.
/// - [`export`] — CSV and JSON export of a scan result.
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod navigation;
pub mod platform;
pub mod probe;
pub mod scanner;

pub use config::EngineConfig;
pub use error::{EngineError, NavError, ProbeUnavailable, Result, ScanFailure};
pub use model::{DirectoryEntry, ScanResult, SizeUnit, VolumeInfo};
pub use navigation::{NavAction, NavOutcome, NavigationController, NavigationState};
pub use platform::{Filesystem, MemoryFilesystem, OsFilesystem};
pub use scanner::{RefreshOutcome, ScanCoordinator, ScanHandle, ScanMessage, ScanRequest, ScanStart};
