/// Data model for dirsight scans.
///
/// Re-exports the entry, result, and volume types plus the unit converter.
pub mod entry;
pub mod scan_result;
pub mod size;
pub mod volume;

pub use entry::{sort_entries, DirectoryEntry};
pub use scan_result::ScanResult;
pub use size::SizeUnit;
pub use volume::VolumeInfo;
