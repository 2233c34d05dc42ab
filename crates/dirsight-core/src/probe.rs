/// Filesystem info probe — volume totals for the directory being viewed.
///
/// Volume stats are an overlay on the listing, never a precondition for it:
/// every failure becomes [`ProbeUnavailable`]. Results are cached per path
/// for a short TTL so rapid refreshes don't repeat the stat call.
use crate::cache::TtlCache;
use crate::error::ProbeUnavailable;
use crate::model::VolumeInfo;
use crate::platform::Filesystem;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct VolumeProbe {
    fs: Arc<dyn Filesystem>,
    cache: Mutex<TtlCache<(PathBuf, VolumeInfo)>>,
}

impl VolumeProbe {
    pub fn new(fs: Arc<dyn Filesystem>, cache_ttl: Duration) -> Self {
        Self {
            fs,
            cache: Mutex::new(TtlCache::new(cache_ttl)),
        }
    }

    /// Volume statistics for the volume containing `path`.
    pub fn probe(&self, path: &Path) -> Result<VolumeInfo, ProbeUnavailable> {
        let cached = self.cache.lock().get();
        if let Some((cached_path, info)) = cached {
            if cached_path == path {
                debug!("Volume stats cache hit for {}", path.display());
                return Ok(info);
            }
        }

        match self.fs.volume_stats(path) {
            Ok(info) => {
                self.cache.lock().put((path.to_path_buf(), info));
                Ok(info)
            }
            Err(err) => {
                warn!("Volume stats unavailable for {}: {err}", path.display());
                Err(ProbeUnavailable {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Drop any cached stats.
    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }
}
