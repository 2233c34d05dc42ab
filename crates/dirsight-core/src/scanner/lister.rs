/// Directory lister — immediate subdirectories of a path with their sizes.
use super::aggregate::SizeAggregator;
use crate::model::DirectoryEntry;
use crate::platform::{EntryKind, Filesystem};
use std::io;
use std::path::Path;
use tracing::debug;

/// Children of one directory. Entry order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<DirectoryEntry>,
    /// Regular files directly under the listed path.
    pub file_count: u64,
}

/// List the child directories of `path`, each paired with its aggregate size.
///
/// Fails only when `path` itself cannot be opened. A child that cannot be
/// listed is still reported, with size 0 and `accessible == false` when the
/// caller lacks read access. Symlinked directories are not listed.
pub fn list_children(
    fs: &dyn Filesystem,
    path: &Path,
    aggregator: &mut SizeAggregator<'_>,
) -> io::Result<Listing> {
    let raw = fs.read_dir(path)?;
    let mut listing = Listing::default();

    for entry in raw {
        if aggregator.is_interrupted() {
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                aggregator.record_error();
                debug!("Skipping entry under {}: {err}", path.display());
                continue;
            }
        };
        match entry.kind {
            EntryKind::Dir => {
                let size = aggregator.aggregate(&entry.path);
                let mut dir = DirectoryEntry::new(entry.name, entry.path, size);
                if !fs.has_read_access(&dir.path) {
                    dir = dir.restricted();
                }
                listing.entries.push(dir);
            }
            EntryKind::File { size } => {
                aggregator.record_file(size);
                listing.file_count += 1;
            }
            EntryKind::Other => {}
        }
    }

    Ok(listing)
}
