/// A single-value cache with an explicit time-to-live.
///
/// Owned by whichever component needs staleness checks; there is no
/// process-wide cached state.
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    value: Option<T>,
    last_updated: Option<Instant>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            last_updated: None,
            ttl,
        }
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    /// `true` if empty or older than the TTL as of `now`.
    pub fn is_stale_at(&self, now: Instant) -> bool {
        match self.last_updated {
            Some(at) => now.saturating_duration_since(at) >= self.ttl,
            None => true,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    /// The cached value if still fresh.
    pub fn get(&self) -> Option<T> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&self, now: Instant) -> Option<T> {
        if self.is_stale_at(now) {
            return None;
        }
        self.value.clone()
    }

    pub fn put(&mut self, value: T) {
        self.put_at(value, Instant::now());
    }

    pub fn put_at(&mut self, value: T, now: Instant) {
        self.value = Some(value);
        self.last_updated = Some(now);
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.last_updated = None;
    }
}
