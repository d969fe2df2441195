//! Per-endpoint resolution cache.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::endpoint::Endpoint;

#[derive(Debug, Clone, Default)]
struct CacheState {
    last_resolution: Option<Instant>,
    resolved: Option<Endpoint>,
}

/// The outcome of the last resolution of one endpoint and when it happened.
///
/// The timestamp and the result are always read and written together, so no
/// reader sees a new timestamp paired with an old result. Refreshes are
/// serialized per cache; distinct caches never contend.
pub struct ResolutionCache {
    state: Mutex<CacheState>,
    refresh: tokio::sync::Mutex<()>,
    resolutions: AtomicU64,
}

impl ResolutionCache {
    /// An empty cache that has never resolved.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            refresh: tokio::sync::Mutex::new(()),
            resolutions: AtomicU64::new(0),
        }
    }

    /// When the last resolution finished, if ever.
    pub fn last_resolution(&self) -> Option<Instant> {
        self.state.lock().last_resolution
    }

    /// The last resolved numeric endpoint, regardless of freshness.
    pub fn resolved(&self) -> Option<Endpoint> {
        self.state.lock().resolved.clone()
    }

    /// Number of resolutions performed through this cache.
    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Acquire)
    }

    /// Mark the cache stale so the next access re-resolves.
    ///
    /// The previous result stays readable through [`resolved`](Self::resolved)
    /// until it is replaced.
    pub fn invalidate(&self) {
        self.state.lock().last_resolution = None;
    }

    /// The cached result if it is no older than `interval` at `now`.
    ///
    /// The outer `Option` is freshness; the inner one is the cached result,
    /// which may itself be absent.
    pub(crate) fn fresh(&self, now: Instant, interval: Duration) -> Option<Option<Endpoint>> {
        let state = self.state.lock();
        let last = state.last_resolution?;
        if now.saturating_duration_since(last) > interval {
            return None;
        }
        Some(state.resolved.clone())
    }

    /// Record a finished resolution.
    pub(crate) fn store(&self, resolved: Option<Endpoint>, at: Instant) {
        debug_assert!(resolved.as_ref().is_none_or(Endpoint::is_numeric));
        let mut state = self.state.lock();
        state.last_resolution = Some(at);
        state.resolved = resolved;
        self.resolutions.fetch_add(1, Ordering::AcqRel);
    }

    /// Wait for exclusive permission to refresh this cache.
    pub(crate) async fn lock_refresh(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.refresh.lock().await
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResolutionCache")
            .field("last_resolution", &state.last_resolution)
            .field("resolved", &state.resolved)
            .field("resolutions", &self.resolutions())
            .finish()
    }
}
