//! Time-to-live cache around the current index snapshot.
//!
//! The snapshot lives behind an [`ArcSwapOption`]: readers take a cheap
//! `Arc` clone and keep using it for the whole query, while a rebuild
//! stores a completely new snapshot. Nobody ever observes a half-built
//! index.
//!
//! Rebuilds are serialized by a mutex. A caller that waited on the mutex
//! re-checks freshness before rebuilding, so a burst of concurrent
//! expirations results in a single rebuild.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use knowledge_harness_core::index::{build_snapshot, IndexParams};
use knowledge_harness_core::models::IndexSnapshot;

use crate::source::DocumentSource;

struct Loaded {
    snapshot: Arc<IndexSnapshot>,
    at: Instant,
}

pub struct KnowledgeCache {
    source: Box<dyn DocumentSource>,
    params: IndexParams,
    ttl: Duration,
    current: ArcSwapOption<Loaded>,
    rebuild_lock: Mutex<()>,
}

impl KnowledgeCache {
    pub fn new(source: Box<dyn DocumentSource>, params: IndexParams, ttl: Duration) -> Self {
        Self {
            source,
            params,
            ttl,
            current: ArcSwapOption::empty(),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// The last built snapshot, without touching the source.
    pub fn current(&self) -> Option<Arc<IndexSnapshot>> {
        self.current
            .load_full()
            .map(|loaded| Arc::clone(&loaded.snapshot))
    }

    /// The current snapshot, rebuilding first if it is missing or older
    /// than the TTL.
    pub fn ensure_fresh(&self) -> Arc<IndexSnapshot> {
        if let Some(snapshot) = self.fresh() {
            return snapshot;
        }

        let _guard = self.rebuild_lock.lock();
        if let Some(snapshot) = self.fresh() {
            return snapshot;
        }
        self.rebuild_locked()
    }

    /// Rebuild unconditionally.
    pub fn rebuild(&self) -> Arc<IndexSnapshot> {
        let _guard = self.rebuild_lock.lock();
        self.rebuild_locked()
    }

    fn fresh(&self) -> Option<Arc<IndexSnapshot>> {
        let guard = self.current.load();
        let loaded = (*guard).as_ref()?;
        (loaded.at.elapsed() <= self.ttl).then(|| Arc::clone(&loaded.snapshot))
    }

    fn rebuild_locked(&self) -> Arc<IndexSnapshot> {
        let started = Instant::now();

        let snapshot = match self.source.load() {
            Ok(docs) => {
                let snapshot = build_snapshot(&docs, &self.params);
                tracing::info!(
                    source = self.source.name(),
                    files = snapshot.file_count,
                    chunks = snapshot.chunk_count(),
                    avg_tokens = snapshot.average_chunk_tokens,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "knowledge index rebuilt"
                );
                snapshot
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(
                    source = self.source.name(),
                    error = %message,
                    "knowledge index rebuild failed; serving empty index"
                );
                IndexSnapshot::failed(message)
            }
        };

        let snapshot = Arc::new(snapshot);
        self.current.store(Some(Arc::new(Loaded {
            snapshot: Arc::clone(&snapshot),
            at: Instant::now(),
        })));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use knowledge_harness_core::models::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: Arc<AtomicUsize>,
        fail: bool,
    }

    impl DocumentSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn load(&self) -> Result<Vec<Document>> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("source offline");
            }
            Ok(vec![Document::new("a.md", format!("generation {} alpha beta", n))])
        }
    }

    fn cache(ttl: Duration, fail: bool) -> (KnowledgeCache, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            loads: Arc::clone(&loads),
            fail,
        };
        (
            KnowledgeCache::new(Box::new(source), IndexParams::default(), ttl),
            loads,
        )
    }

    #[test]
    fn test_first_access_builds() {
        let (cache, loads) = cache(Duration::from_secs(60), false);
        assert!(cache.current().is_none());
        let snap = cache.ensure_fresh();
        assert_eq!(snap.chunk_count(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(cache.current().is_some());
    }

    #[test]
    fn test_fresh_snapshot_is_reused() {
        let (cache, loads) = cache(Duration::from_secs(60), false);
        let a = cache.ensure_fresh();
        let b = cache.ensure_fresh();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_snapshot_is_rebuilt_and_old_stays_valid() {
        let (cache, loads) = cache(Duration::from_millis(0), false);
        let old = cache.ensure_fresh();
        std::thread::sleep(Duration::from_millis(5));
        let new = cache.ensure_fresh();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(old.chunks[0].normalized_text.contains("generation 0"));
        assert!(new.chunks[0].normalized_text.contains("generation 1"));
    }

    #[test]
    fn test_failure_yields_empty_snapshot_with_error() {
        let (cache, _) = cache(Duration::from_secs(60), true);
        let snap = cache.ensure_fresh();
        assert!(snap.is_empty());
        assert_eq!(snap.last_error.as_deref(), Some("source offline"));
    }

    #[test]
    fn test_concurrent_expiry_rebuilds_once() {
        let (cache, loads) = cache(Duration::from_secs(60), false);
        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.ensure_fresh().chunk_count())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
