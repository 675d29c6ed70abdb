//! Per-branch lock registry with lazy creation and idle reclamation.
//!
//! Writers touching different branches of the route cache must not block
//! each other, while writers touching the same branch must be serialized.
//! `LockPool` hands out one reference-counted mutex per branch key, created
//! on first request. Long-running processes accumulate locks for branches
//! that were touched once and never again; `cleanup_unused` reclaims those.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::coord::BranchKey;

/// Registry mapping branch identity to its mutual-exclusion lock.
///
/// The registry itself is guarded by one coarse mutex held only for the
/// check-and-insert; the returned per-branch locks guard branch contents.
/// Construct one per cache (or share one across caches under test); there
/// is no process-wide instance.
#[derive(Debug, Default)]
pub struct LockPool {
    locks: Mutex<HashMap<BranchKey, Arc<Mutex<()>>>>,
}

impl LockPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the lock for a branch, creating and registering it on first use.
    ///
    /// The returned handle stays valid even if `cleanup_unused` later drops
    /// the registry entry: callers lock whatever handle they hold, and a
    /// handle with outside references is never reclaimed in the first place.
    pub fn branch_lock(&self, branch: BranchKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(
            locks
                .entry(branch)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Reclaim locks that are idle and unreferenced outside the registry.
    ///
    /// A lock is removed only when the registry holds the sole reference to
    /// it (`Arc::strong_count == 1`) and it is not currently held. The
    /// strong-count guard means a thread that has fetched a handle but not
    /// yet locked it keeps that handle pinned in use, so reclamation can run
    /// concurrently with `branch_lock` without ever invalidating a handle.
    ///
    /// Callers are expected to serialize this against itself by invoking it
    /// from a single maintenance path.
    ///
    /// # Returns
    ///
    /// The number of locks removed from the registry.
    pub fn cleanup_unused(&self) -> usize {
        let mut locks = self.locks.lock().unwrap();
        let before = locks.len();
        locks.retain(|_, handle| {
            Arc::strong_count(handle) > 1 || handle.try_lock().is_err()
        });
        let removed = before - locks.len();
        if removed > 0 {
            debug!(removed, remaining = locks.len(), "Reclaimed idle branch locks");
        }
        removed
    }

    /// Number of registered locks.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_lock_pool_new_is_empty() {
        let pool = LockPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_branch_lock_registers_once() {
        let pool = LockPool::new();
        let branch = BranchKey::new(13.405, 52.52);

        let first = pool.branch_lock(branch);
        let second = pool.branch_lock(branch);

        assert_eq!(pool.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_branch_lock_distinct_branches_distinct_locks() {
        let pool = LockPool::new();
        let a = pool.branch_lock(BranchKey::new(13.405, 52.52));
        let b = pool.branch_lock(BranchKey::new(11.576, 48.137));

        assert_eq!(pool.len(), 2);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cleanup_removes_idle_locks() {
        let pool = LockPool::new();
        for i in 0..5 {
            // Handles dropped immediately: all five locks are reclaimable.
            drop(pool.branch_lock(BranchKey::new(i as f64, 0.0)));
        }

        assert_eq!(pool.cleanup_unused(), 5);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_cleanup_keeps_referenced_locks() {
        let pool = LockPool::new();
        let held = pool.branch_lock(BranchKey::new(13.405, 52.52));
        drop(pool.branch_lock(BranchKey::new(11.576, 48.137)));

        // The handle is merely referenced, not locked, and must survive.
        assert_eq!(pool.cleanup_unused(), 1);
        assert_eq!(pool.len(), 1);

        // The surviving registry entry is still the same lock.
        let again = pool.branch_lock(BranchKey::new(13.405, 52.52));
        assert!(Arc::ptr_eq(&held, &again));
    }

    #[test]
    fn test_cleanup_then_fresh_lock_is_usable() {
        let pool = LockPool::new();
        let branch = BranchKey::new(13.405, 52.52);
        drop(pool.branch_lock(branch));
        pool.cleanup_unused();

        let lock = pool.branch_lock(branch);
        let guard = lock.lock().unwrap();
        drop(guard);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_held_handle_serializes_after_cleanup() {
        // A waiter that fetched its handle before cleanup still excludes
        // against anyone who fetched the same handle.
        let pool = Arc::new(LockPool::new());
        let branch = BranchKey::new(13.405, 52.52);

        let handle = pool.branch_lock(branch);
        pool.cleanup_unused();

        let guard = handle.lock().unwrap();
        let contender = Arc::clone(&handle);
        let t = thread::spawn(move || contender.try_lock().is_err());
        assert!(t.join().unwrap());
        drop(guard);
    }

    #[test]
    fn test_concurrent_registration_single_lock() {
        let pool = Arc::new(LockPool::new());
        let branch = BranchKey::new(13.405, 52.52);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || pool.branch_lock(branch))
            })
            .map(|t| t.join().unwrap())
            .collect();

        assert_eq!(pool.len(), 1);
        for handle in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], handle));
        }
    }
}
