//! Nested route cache with per-branch write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::cache::lock_pool::LockPool;
use crate::cache::stats::CacheStats;
use crate::coord::{BranchKey, CoordKey, RouteKey};

/// Innermost level: destination latitude to metric.
pub type LeafMap = HashMap<CoordKey, f64>;

/// Destination side of a branch: destination longitude to leaves.
pub type DestMap = HashMap<CoordKey, LeafMap>;

/// Owned four-level form of the cache, as persisted:
/// `src_lon -> src_lat -> dst_lon -> dst_lat -> metric`.
pub type CacheSnapshot = HashMap<CoordKey, HashMap<CoordKey, DestMap>>;

/// Concurrent cache of route metrics keyed by coordinate 4-tuples.
///
/// Logically a four-level mapping from
/// `(src_lon, src_lat, dst_lon, dst_lat)` to one scalar metric (duration or
/// distance, by caller convention; the cache is metric-agnostic). In memory
/// the two source levels are flattened into a [`BranchKey`], so the sharded
/// map plus one lock per branch let writers on unrelated source points
/// proceed without blocking each other.
///
/// The cache is unbounded and append-mostly: entries are never expired or
/// evicted, only overwritten or explicitly removed. Bounding it is a
/// deployment decision for the caller, not something the cache does behind
/// the caller's back.
pub struct RouteCache {
    /// Branch storage: source pair to destination mapping
    branches: DashMap<BranchKey, DestMap>,
    /// Per-branch write locks
    locks: Arc<LockPool>,
    /// Statistics
    stats: Mutex<CacheStats>,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteCache {
    /// Create an empty cache with its own lock pool.
    pub fn new() -> Self {
        Self::with_lock_pool(Arc::new(LockPool::new()))
    }

    /// Create an empty cache sharing the given lock pool.
    pub fn with_lock_pool(locks: Arc<LockPool>) -> Self {
        Self {
            branches: DashMap::new(),
            locks,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Rebuild a cache from its persisted four-level form.
    pub fn from_snapshot(snapshot: CacheSnapshot) -> Self {
        Self::from_snapshot_with_locks(snapshot, Arc::new(LockPool::new()))
    }

    /// Rebuild a cache from its persisted form, sharing the given lock pool.
    pub fn from_snapshot_with_locks(snapshot: CacheSnapshot, locks: Arc<LockPool>) -> Self {
        let cache = Self::with_lock_pool(locks);
        for (src_lon, lats) in snapshot {
            for (src_lat, dests) in lats {
                let branch = BranchKey {
                    lon: src_lon,
                    lat: src_lat,
                };
                cache.branches.insert(branch, dests);
            }
        }
        cache
    }

    /// Look up the metric stored for a route.
    ///
    /// Returns `None` when the full key path has never been inserted; a miss
    /// is a normal outcome, not an error.
    pub fn lookup(&self, key: RouteKey) -> Option<f64> {
        let found = self.branches.get(&key.branch()).and_then(|branch| {
            branch
                .get(&key.dst_lon)
                .and_then(|leaves| leaves.get(&key.dst_lat).copied())
        });

        if let Ok(mut stats) = self.stats.lock() {
            match found {
                Some(_) => stats.record_hit(),
                None => stats.record_miss(),
            }
        }
        found
    }

    /// Check whether a route is cached, without touching hit/miss counters.
    pub fn contains(&self, key: RouteKey) -> bool {
        self.branches
            .get(&key.branch())
            .map(|branch| {
                branch
                    .get(&key.dst_lon)
                    .is_some_and(|leaves| leaves.contains_key(&key.dst_lat))
            })
            .unwrap_or(false)
    }

    /// Insert or overwrite the metric for a route.
    ///
    /// Missing intermediate levels are created; an existing value is
    /// silently replaced (last writer wins). Writers to the same branch are
    /// serialized through the lock pool; writers to other branches are not
    /// blocked.
    pub fn insert(&self, key: RouteKey, metric: f64) {
        let lock = self.locks.branch_lock(key.branch());
        let _guard = lock.lock().unwrap();

        {
            let mut branch = self
                .branches
                .entry(key.branch())
                .or_insert_with(HashMap::new);
            branch
                .entry(key.dst_lon)
                .or_insert_with(HashMap::new)
                .insert(key.dst_lat, metric);
        }

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_inserts(1);
        }
    }

    /// Remove the metric for a route, returning it if present.
    ///
    /// Intermediate levels stay in place even when they become empty; only
    /// the lock pool has a reclamation path.
    pub fn remove(&self, key: RouteKey) -> Option<f64> {
        let lock = self.locks.branch_lock(key.branch());
        let _guard = lock.lock().unwrap();

        let removed = self.branches.get_mut(&key.branch()).and_then(|mut branch| {
            branch
                .get_mut(&key.dst_lon)
                .and_then(|leaves| leaves.remove(&key.dst_lat))
        });

        if removed.is_some() {
            if let Ok(mut stats) = self.stats.lock() {
                stats.record_remove();
            }
        }
        removed
    }

    /// Bulk-insert a sources × destinations metric matrix.
    ///
    /// `matrix[i][j]` is stored under source `i` and destination `j`. Each
    /// source row is merged under its branch lock in one step. Non-finite
    /// cells (the engine convention for unroutable pairs) are skipped, never
    /// cached.
    ///
    /// # Returns
    ///
    /// The number of leaves written.
    pub fn merge_matrix(
        &self,
        sources: &[(f64, f64)],
        destinations: &[(f64, f64)],
        matrix: &[Vec<f64>],
    ) -> usize {
        let mut inserted = 0;

        for (&(src_lon, src_lat), row) in sources.iter().zip(matrix) {
            let branch_key = BranchKey::new(src_lon, src_lat);
            let lock = self.locks.branch_lock(branch_key);
            let _guard = lock.lock().unwrap();

            let mut branch = self
                .branches
                .entry(branch_key)
                .or_insert_with(HashMap::new);
            for (&(dst_lon, dst_lat), &metric) in destinations.iter().zip(row) {
                if !metric.is_finite() {
                    continue;
                }
                branch
                    .entry(CoordKey::new(dst_lon))
                    .or_insert_with(HashMap::new)
                    .insert(CoordKey::new(dst_lat), metric);
                inserted += 1;
            }
        }

        if inserted > 0 {
            if let Ok(mut stats) = self.stats.lock() {
                stats.record_inserts(inserted as u64);
            }
        }
        inserted
    }

    /// Total number of cached routes. Walks every branch; O(branches).
    pub fn len(&self) -> usize {
        self.branches
            .iter()
            .map(|entry| entry.value().values().map(|leaves| leaves.len()).sum::<usize>())
            .sum()
    }

    /// Whether the cache holds no routes.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() || self.len() == 0
    }

    /// Number of branches (distinct source points) in the cache.
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Remove all cached routes.
    pub fn clear(&self) {
        self.branches.clear();
    }

    /// Clone the cache into its four-level persisted form.
    ///
    /// Branches are copied one at a time under their branch lock, so each
    /// branch is internally consistent but the snapshot as a whole is not a
    /// point-in-time image under concurrent mutation. Callers wanting one
    /// quiesce writers first.
    pub fn snapshot(&self) -> CacheSnapshot {
        let keys: Vec<BranchKey> = self.branches.iter().map(|entry| *entry.key()).collect();

        let mut snapshot = CacheSnapshot::new();
        for branch_key in keys {
            let lock = self.locks.branch_lock(branch_key);
            let _guard = lock.lock().unwrap();

            if let Some(branch) = self.branches.get(&branch_key) {
                snapshot
                    .entry(branch_key.lon)
                    .or_insert_with(HashMap::new)
                    .insert(branch_key.lat, branch.value().clone());
            }
        }
        snapshot
    }

    /// Reclaim branch locks that are idle and unreferenced.
    ///
    /// Safe to run alongside ordinary lookups and inserts; callers serialize
    /// it against itself by invoking it from a single maintenance path.
    ///
    /// # Returns
    ///
    /// The number of locks reclaimed.
    pub fn cleanup_branch_locks(&self) -> usize {
        self.locks.cleanup_unused()
    }

    /// Number of currently registered branch locks.
    pub fn branch_lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().unwrap().clone()
    }

    pub(crate) fn record_compute(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_compute();
        }
    }

    pub(crate) fn record_compute_failure(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_compute_failure();
        }
    }
}
