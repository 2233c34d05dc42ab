/// Engine configuration.
///
/// Every field has a default, so an empty JSON object (or no file at all)
/// yields a working configuration.
use crate::error::{EngineError, Result};
use crate::model::SizeUnit;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default maximum recursion depth below a scanned child directory.
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// Default minimum converted size for an entry to be displayed.
pub const DEFAULT_DISPLAY_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Entries whose size in the active unit is below this are hidden.
    pub display_threshold: f64,

    /// Unit a new session starts in.
    pub default_unit: SizeUnit,

    /// Subtrees deeper than this are skipped (contribute zero) instead of
    /// exhausting the stack.
    pub max_depth: usize,

    /// How long volume stats are reused for the same path.
    pub volume_cache_ttl_ms: u64,

    /// Navigation history cap; `None` keeps every entry.
    pub max_history: Option<usize>,

    /// Directories walked between progress messages.
    pub progress_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            default_unit: SizeUnit::Gb,
            max_depth: DEFAULT_MAX_DEPTH,
            volume_cache_ttl_ms: 2_000,
            max_history: None,
            progress_interval: 512,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| EngineError::ConfigParse {
                details: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.display_threshold.is_finite() || self.display_threshold < 0.0 {
            return Err(EngineError::InvalidConfig {
                details: format!(
                    "display_threshold must be a finite, non-negative number (got {})",
                    self.display_threshold
                ),
            });
        }
        if self.max_depth == 0 {
            return Err(EngineError::InvalidConfig {
                details: "max_depth must be at least 1".into(),
            });
        }
        if self.progress_interval == 0 {
            return Err(EngineError::InvalidConfig {
                details: "progress_interval must be at least 1".into(),
            });
        }
        if self.max_history == Some(0) {
            return Err(EngineError::InvalidConfig {
                details: "max_history must be at least 1 when set".into(),
            });
        }
        Ok(())
    }

    pub fn volume_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.volume_cache_ttl_ms)
    }
}
