/// Error taxonomy for the engine.
///
/// Only two families ever reach a caller: configuration/programming errors
/// ([`EngineError`]) and navigation validation failures ([`NavError`]).
/// Per-entry traversal failures are absorbed inside the walker and never
/// surface here.
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Shared `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Configuration, unit, and I/O errors raised by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("[DS-1001] invalid unit tag: {tag:?} (expected B, KB, MB or GB)")]
    InvalidUnit { tag: String },

    #[error("[DS-1002] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DS-1003] configuration parse failure: {details}")]
    ConfigParse { details: String },

    #[error("[DS-2001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("[DS-2101] export failure: {details}")]
    Export { details: String },
}

impl EngineError {
    /// Stable machine-parseable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidUnit { .. } => "DS-1001",
            Self::InvalidConfig { .. } => "DS-1002",
            Self::ConfigParse { .. } => "DS-1003",
            Self::Io { .. } => "DS-2001",
            Self::Export { .. } => "DS-2101",
        }
    }
}

/// Navigation validation failures. The navigation state is unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("access denied: {}", path.display())]
    AccessDenied { path: PathBuf },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("home directory is not available on this platform")]
    HomeUnavailable,
}

/// Volume statistics could not be obtained. Never fatal: a scan simply
/// carries no volume overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("volume stats unavailable for {}: {reason}", path.display())]
pub struct ProbeUnavailable {
    pub path: PathBuf,
    pub reason: String,
}

/// Why the scanned path itself could not be opened.
///
/// Carried inside a `ScanResult` (which then has no entries) so the
/// presentation layer can render it; a scan never fails with an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanFailure {
    AccessDenied,
    NotFound,
    Io { message: String },
}

impl ScanFailure {
    /// Classify an I/O error from opening the scan root.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io {
                message: err.to_string(),
            },
        }
    }
}

impl std::fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied => f.write_str("access denied"),
            Self::NotFound => f.write_str("not found"),
            Self::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}
