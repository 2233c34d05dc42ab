/// Platform layer — the filesystem access the engine consumes.
///
/// Everything the engine needs from the OS goes through the [`Filesystem`]
/// trait: directory enumeration with per-entry type/size, a read-access
/// check, volume statistics, and the home directory. [`OsFilesystem`] is
/// the real implementation; [`MemoryFilesystem`] is an in-memory stand-in
/// for tests and demos.
pub mod memory;
pub mod permissions;
pub mod volume;

pub use memory::MemoryFilesystem;
pub use permissions::{has_read_access, is_elevated};

use crate::model::VolumeInfo;
use std::io;
use std::path::{Path, PathBuf};

/// What kind of object a directory entry is. Symbolic links are reported
/// as `Other`, never as the type of their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with its size in bytes.
    File { size: u64 },
    Dir,
    /// Symlink, socket, device, FIFO, ...
    Other,
}

/// One entry from a directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Filesystem access used by the aggregator, lister, probe and navigator.
pub trait Filesystem: Send + Sync {
    /// Enumerate the immediate children of `path`.
    ///
    /// The outer `Err` means `path` itself could not be opened. Inner
    /// errors are per-entry failures (e.g. the entry vanished between
    /// enumeration and stat).
    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<FsEntry>>>;

    /// Whether the caller may read `path`.
    fn has_read_access(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    /// Statistics for the volume containing `path`.
    fn volume_stats(&self, path: &Path) -> io::Result<VolumeInfo>;

    /// The current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<FsEntry>>> {
        // Collected eagerly so the directory handle is closed before the
        // caller recurses; open handles stay bounded by one.
        Ok(std::fs::read_dir(path)?
            .map(|entry| entry.and_then(|e| os_entry(&e)))
            .collect())
    }

    fn has_read_access(&self, path: &Path) -> bool {
        permissions::has_read_access(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn volume_stats(&self, path: &Path) -> io::Result<VolumeInfo> {
        volume::volume_stats(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// Classify a `DirEntry` without following symlinks.
fn os_entry(entry: &std::fs::DirEntry) -> io::Result<FsEntry> {
    // `DirEntry::file_type` and `DirEntry::metadata` do not traverse links.
    let file_type = entry.file_type()?;
    let kind = if file_type.is_file() {
        EntryKind::File {
            size: entry.metadata()?.len(),
        }
    } else if file_type.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::Other
    };
    Ok(FsEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        path: entry.path(),
        kind,
    })
}

/// Filesystem root for `path`: `/` on Unix, the drive root (e.g. `C:\`)
/// on Windows.
pub fn fs_root(path: &Path) -> PathBuf {
    path.ancestors()
        .last()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn os_read_dir_classifies_entries() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("f.bin"), vec![0u8; 42]).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let mut entries: Vec<FsEntry> = OsFilesystem
            .read_dir(tmp.path())
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::File { size: 42 });
        assert_eq!(entries[1].kind, EntryKind::Dir);
        assert_eq!(entries[1].path, tmp.path().join("sub"));
    }

    #[cfg(unix)]
    #[test]
    fn os_read_dir_reports_symlinks_as_other() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();

        let link = OsFilesystem
            .read_dir(tmp.path())
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .find(|e| e.name == "link")
            .unwrap();
        assert_eq!(link.kind, EntryKind::Other);
    }

    #[test]
    fn os_read_dir_missing_path_is_err() {
        let tmp = TempDir::new().unwrap();
        let err = OsFilesystem.read_dir(&tmp.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn fs_root_is_slash() {
        assert_eq!(fs_root(Path::new("/usr/local/bin")), PathBuf::from("/"));
        assert_eq!(fs_root(Path::new("/")), PathBuf::from("/"));
    }
}
