/// Scan progress reporting — lightweight messages sent from the scan
/// thread to the controlling context via a crossbeam channel.
use crate::model::ScanResult;
use crossbeam_channel::Sender;
use std::path::Path;

use super::aggregate::WalkStats;

/// Messages sent from the scan thread to the controlling context.
#[derive(Debug)]
pub enum ScanMessage {
    /// Periodic update with running totals.
    Update {
        generation: u64,
        dirs_visited: u64,
        files_counted: u64,
        bytes_counted: u64,
        current_path: String,
    },
    /// The scan finished. The coordinator's busy flag is already cleared
    /// when this is received.
    Complete {
        generation: u64,
        result: Box<ScanResult>,
    },
}

/// Throttled sender for `Update` messages.
///
/// Updates are dropped rather than blocking when the channel is full; only
/// `Complete` is guaranteed delivery.
pub struct ProgressSink {
    tx: Sender<ScanMessage>,
    generation: u64,
    interval: u64,
}

impl ProgressSink {
    pub fn new(tx: Sender<ScanMessage>, generation: u64, interval: u64) -> Self {
        Self {
            tx,
            generation,
            interval: interval.max(1),
        }
    }

    /// Called once per directory walked; sends every `interval` directories.
    pub fn report(&self, stats: &WalkStats, current: &Path) {
        if stats.dirs_visited % self.interval != 0 {
            return;
        }
        let _ = self.tx.try_send(ScanMessage::Update {
            generation: self.generation,
            dirs_visited: stats.dirs_visited,
            files_counted: stats.files_counted,
            bytes_counted: stats.bytes_counted,
            current_path: current.to_string_lossy().into_owned(),
        });
    }
}
