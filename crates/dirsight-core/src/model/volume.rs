/// Total/used/free space for the volume containing a path.
use super::size::{format_in_unit, SizeUnit};
use serde::Serialize;

/// Volume statistics from a single filesystem-stat call.
///
/// `used_bytes == total_bytes - free_bytes` always holds: `used` is derived
/// here, never taken from raw OS fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    total_bytes: u64,
    used_bytes: u64,
    free_bytes: u64,
}

impl VolumeInfo {
    /// Build from total and free space. `free` is clamped to `total` so a
    /// misreporting filesystem cannot produce a negative used figure.
    pub fn new(total_bytes: u64, free_bytes: u64) -> Self {
        let free_bytes = free_bytes.min(total_bytes);
        Self {
            total_bytes,
            used_bytes: total_bytes - free_bytes,
            free_bytes,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn free_bytes(&self) -> u64 {
        self.free_bytes
    }

    /// Usage percentage (0.0–100.0).
    pub fn usage_percent(&self) -> f32 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.total_bytes as f64 * 100.0) as f32
    }

    /// One-line summary, e.g. "931.51 GB total, 512.00 GB used, 419.51 GB free".
    pub fn summary(&self, unit: SizeUnit) -> String {
        format!(
            "{} total, {} used, {} free",
            format_in_unit(self.total_bytes, unit),
            format_in_unit(self.used_bytes, unit),
            format_in_unit(self.free_bytes, unit)
        )
    }
}
