/// In-memory filesystem for deterministic tests and demos.
///
/// Models the situations the real filesystem produces only with root
/// privileges or precise timing: unreadable directories, entries that
/// vanish between enumeration and stat, special files, and a scan that is
/// held in flight at a chosen directory.
use super::{EntryKind, Filesystem, FsEntry};
use crate::model::VolumeInfo;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemNode {
    Dir,
    File(u64),
    /// Symlink or special file.
    Other,
    /// Listed by its parent but fails to stat.
    Vanished,
}

/// A tree of directories and sized files held in memory.
///
/// All mutators take `&self`, so one instance can be shared behind an `Arc`
/// and modified between scans.
pub struct MemoryFilesystem {
    nodes: RwLock<BTreeMap<PathBuf, MemNode>>,
    denied: RwLock<HashSet<PathBuf>>,
    home: RwLock<Option<PathBuf>>,
    volume: RwLock<Option<VolumeInfo>>,
    read_dir_calls: AtomicU64,
    pause: Mutex<Option<(PathBuf, Receiver<()>)>>,
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFilesystem {
    /// Create a filesystem containing only the root directory `/`.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), MemNode::Dir);
        Self {
            nodes: RwLock::new(nodes),
            denied: RwLock::new(HashSet::new()),
            home: RwLock::new(None),
            volume: RwLock::new(None),
            read_dir_calls: AtomicU64::new(0),
            pause: Mutex::new(None),
        }
    }

    /// Create a directory and any missing ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let mut nodes = self.nodes.write();
        for ancestor in path.as_ref().ancestors() {
            nodes.entry(ancestor.to_path_buf()).or_insert(MemNode::Dir);
        }
        self
    }

    /// Create a regular file of `size` bytes, creating parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) -> &Self {
        self.insert_leaf(path.as_ref(), MemNode::File(size))
    }

    /// Create a symlink (or other non-regular entry).
    pub fn add_symlink(&self, path: impl AsRef<Path>) -> &Self {
        self.insert_leaf(path.as_ref(), MemNode::Other)
    }

    /// Create an entry that is listed by its parent but fails to stat,
    /// as if it were deleted mid-scan.
    pub fn add_vanished(&self, path: impl AsRef<Path>) -> &Self {
        self.insert_leaf(path.as_ref(), MemNode::Vanished)
    }

    /// Make `path` unreadable: listing it fails with `PermissionDenied` and
    /// the access check returns `false`.
    pub fn deny(&self, path: impl AsRef<Path>) -> &Self {
        self.denied.write().insert(path.as_ref().to_path_buf());
        self
    }

    pub fn set_home(&self, path: impl AsRef<Path>) -> &Self {
        self.add_dir(path.as_ref());
        *self.home.write() = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn set_volume(&self, volume: Option<VolumeInfo>) -> &Self {
        *self.volume.write() = volume;
        self
    }

    /// Number of `read_dir` calls made so far.
    pub fn read_dir_calls(&self) -> u64 {
        self.read_dir_calls.load(Ordering::SeqCst)
    }

    /// Block the next `read_dir(path)` until the returned sender sends a
    /// message or is dropped.
    pub fn pause_at(&self, path: impl AsRef<Path>) -> Sender<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        *self.pause.lock() = Some((path.as_ref().to_path_buf(), rx));
        tx
    }

    fn insert_leaf(&self, path: &Path, node: MemNode) -> &Self {
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes.write().insert(path.to_path_buf(), node);
        self
    }

    fn wait_if_paused(&self, path: &Path) {
        let gate = {
            let mut pause = self.pause.lock();
            match pause.as_ref() {
                Some((at, _)) if at == path => pause.take(),
                _ => None,
            }
        };
        if let Some((_, rx)) = gate {
            let _ = rx.recv();
        }
    }
}

impl Filesystem for MemoryFilesystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<io::Result<FsEntry>>> {
        self.read_dir_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_if_paused(path);

        if self.denied.read().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }

        let nodes = self.nodes.read();
        match nodes.get(path) {
            Some(MemNode::Dir) => {}
            Some(_) => return Err(io::Error::other("not a directory")),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such directory: {}", path.display()),
                ))
            }
        }

        let children: Vec<io::Result<FsEntry>> = nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .map(|(child, node)| {
                let name = child
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let kind = match node {
                    MemNode::Dir => EntryKind::Dir,
                    MemNode::File(size) => EntryKind::File { size: *size },
                    MemNode::Other => EntryKind::Other,
                    MemNode::Vanished => {
                        return Err(io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("vanished: {}", child.display()),
                        ))
                    }
                };
                Ok(FsEntry {
                    name,
                    path: child.clone(),
                    kind,
                })
            })
            .collect();
        Ok(children)
    }

    fn has_read_access(&self, path: &Path) -> bool {
        self.nodes.read().contains_key(path) && !self.denied.read().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.read().get(path), Some(MemNode::Dir))
    }

    fn volume_stats(&self, path: &Path) -> io::Result<VolumeInfo> {
        if !self.nodes.read().contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such path"));
        }
        (*self.volume.read()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::Unsupported, "no volume stats configured")
        })
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(fs: &MemoryFilesystem, path: &str) -> Vec<String> {
        fs.read_dir(Path::new(path))
            .unwrap()
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn lists_only_direct_children() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/data/a/one.bin", 10)
            .add_file("/data/a/deep/two.bin", 20)
            .add_dir("/data/b");

        assert_eq!(names(&fs, "/data"), ["a", "b"]);
        assert_eq!(names(&fs, "/data/a"), ["deep", "one.bin"]);
    }

    #[test]
    fn denied_dir_fails_and_has_no_access() {
        let fs = MemoryFilesystem::new();
        fs.add_dir("/secret").deny("/secret");

        let err = fs.read_dir(Path::new("/secret")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(!fs.has_read_access(Path::new("/secret")));
        assert!(fs.has_read_access(Path::new("/")));
    }

    #[test]
    fn vanished_entry_is_a_per_entry_error() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/d/ok.bin", 1).add_vanished("/d/gone.bin");

        let entries = fs.read_dir(Path::new("/d")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.iter().filter(|e| e.is_err()).count(), 1);
    }

    #[test]
    fn counts_read_dir_calls() {
        let fs = MemoryFilesystem::new();
        fs.add_dir("/x");
        let _ = fs.read_dir(Path::new("/x"));
        let _ = fs.read_dir(Path::new("/missing"));
        assert_eq!(fs.read_dir_calls(), 2);
    }

    #[test]
    fn volume_stats_absent_by_default() {
        let fs = MemoryFilesystem::new();
        assert!(fs.volume_stats(Path::new("/")).is_err());
        fs.set_volume(Some(VolumeInfo::new(100, 40)));
        assert_eq!(fs.volume_stats(Path::new("/")).unwrap().used_bytes(), 60);
    }
}
