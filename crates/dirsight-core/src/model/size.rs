/// Size units and formatting — the unit converter.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display boundary.
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

/// Display unit for directory sizes.
///
/// Binary multiples (1 KB = 1024 bytes), labelled with the short forms
/// users expect in a disk tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SizeUnit {
    #[serde(rename = "B")]
    Bytes,
    #[serde(rename = "KB")]
    Kb,
    #[serde(rename = "MB")]
    Mb,
    #[serde(rename = "GB")]
    #[default]
    Gb,
}

impl SizeUnit {
    /// Short label, e.g. "MB".
    pub fn label(self) -> &'static str {
        match self {
            Self::Bytes => "B",
            Self::Kb => "KB",
            Self::Mb => "MB",
            Self::Gb => "GB",
        }
    }

    /// Number of bytes in one of this unit.
    pub fn divisor(self) -> f64 {
        match self {
            Self::Bytes => 1.0,
            Self::Kb => KB,
            Self::Mb => MB,
            Self::Gb => GB,
        }
    }

    /// Convert a byte count into this unit.
    #[inline]
    pub fn convert(self, bytes: u64) -> f64 {
        bytes as f64 / self.divisor()
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeUnit {
    type Err = EngineError;

    /// Parse a unit tag, case-insensitively. Unknown tags are an error
    /// rather than a silent fallback to bytes.
    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "B" | "BYTES" => Ok(Self::Bytes),
            "KB" => Ok(Self::Kb),
            "MB" => Ok(Self::Mb),
            "GB" => Ok(Self::Gb),
            _ => Err(EngineError::InvalidUnit {
                tag: tag.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SizeUnit {
    type Error = EngineError;

    fn try_from(tag: String) -> Result<Self> {
        tag.parse()
    }
}

/// Convert `bytes` into the unit named by `tag` ("B", "KB", "MB", "GB").
pub fn convert(bytes: u64, tag: &str) -> Result<f64> {
    Ok(tag.parse::<SizeUnit>()?.convert(bytes))
}

/// Format a byte count in a fixed unit, e.g. `"1.50 GB"`.
pub fn format_in_unit(bytes: u64, unit: SizeUnit) -> String {
    match unit {
        SizeUnit::Bytes => format!("{bytes} B"),
        _ => format!("{:.2} {}", unit.convert(bytes), unit.label()),
    }
}

/// Format a byte count into a human-readable string with appropriate unit.
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else if b < TB {
        format!("{:.2} GB", b / GB)
    } else {
        format!("{:.2} TB", b / TB)
    }
}
