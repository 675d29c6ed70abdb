//! Cache service facade over a routing engine.
//!
//! `RouteCacheService` is the one component that talks to the routing
//! engine: it loads the persisted cache at startup, answers lookups from
//! the cache, falls back to the engine on a miss, and writes the cache back
//! to disk on demand. Save cadence is the caller's decision (on shutdown,
//! every N computations, on a timer); the service runs no background loop.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::codec;
use crate::cache::route::RouteCache;
use crate::cache::stats::CacheStats;
use crate::cache::types::{CacheConfig, CacheError};
use crate::coord::RouteKey;
use crate::provider::RouteProvider;

/// Facade combining the route cache with a routing engine.
///
/// Cloneable handles to the underlying cache can be obtained via
/// [`cache()`](Self::cache) and shared across threads; the service itself is
/// `Send + Sync` and is typically wrapped in an `Arc` by callers.
pub struct RouteCacheService {
    /// The shared route cache.
    cache: Arc<RouteCache>,

    /// The routing engine, consulted only on cache misses.
    provider: Arc<dyn RouteProvider>,

    /// Service configuration.
    config: CacheConfig,
}

impl RouteCacheService {
    /// Create a service starting from an empty cache.
    pub fn new(config: CacheConfig, provider: Arc<dyn RouteProvider>) -> Self {
        Self::with_cache(Arc::new(RouteCache::new()), config, provider)
    }

    /// Create a service over an existing cache.
    ///
    /// Lets callers share one cache (and its lock pool) between services or
    /// pre-populate it; tests use this to run several independent instances
    /// side by side.
    pub fn with_cache(
        cache: Arc<RouteCache>,
        config: CacheConfig,
        provider: Arc<dyn RouteProvider>,
    ) -> Self {
        Self {
            cache,
            provider,
            config,
        }
    }

    /// Create a service, loading the cache file named by the configuration.
    ///
    /// A missing or empty file is a normal cold start and yields an empty
    /// cache. A file that exists but cannot be decoded is reported as
    /// [`CacheError::Decode`]; whether to abort or start empty is the
    /// caller's policy decision.
    pub fn open(config: CacheConfig, provider: Arc<dyn RouteProvider>) -> Result<Self, CacheError> {
        let cache = Self::load_cache(&config.cache_file)?;
        info!(
            path = %config.cache_file.display(),
            routes = cache.len(),
            branches = cache.branch_count(),
            provider = provider.name(),
            "Route cache service started"
        );

        Ok(Self {
            cache: Arc::new(cache),
            provider,
            config,
        })
    }

    /// Load a cache from a file.
    ///
    /// Missing and zero-length files produce an empty cache; load is a
    /// best-effort bootstrap, never fatal for the cold-start cases.
    pub fn load_cache(path: &Path) -> Result<RouteCache, CacheError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache file found, starting empty");
                return Ok(RouteCache::new());
            }
            Err(err) => return Err(err.into()),
        };

        let snapshot = codec::decode(&bytes)?;
        Ok(RouteCache::from_snapshot(snapshot))
    }

    /// Persist the cache to the configured file.
    pub fn save(&self) -> Result<(), CacheError> {
        self.save_to(&self.config.cache_file)
    }

    /// Persist the cache to the given file, replacing any previous content.
    ///
    /// The snapshot is taken branch by branch; under concurrent mutation the
    /// saved image is non-corrupting but not point-in-time (quiesce writers
    /// for that).
    pub fn save_to(&self, path: &Path) -> Result<(), CacheError> {
        let bytes = codec::encode(&self.cache.snapshot())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        info!(
            path = %path.display(),
            routes = self.cache.len(),
            bytes = bytes.len(),
            "Route cache saved"
        );
        Ok(())
    }

    /// Return the cached metric for a route, computing it on a miss.
    ///
    /// Coordinates are `(lon, lat)` pairs. The engine is called outside any
    /// cache lock; on success the configured metric is inserted and
    /// returned, on failure the error is propagated and nothing is cached.
    /// Concurrent callers missing on the same key may each invoke the
    /// engine; the last insert wins, and both observe a valid result.
    pub fn get_or_compute(&self, src: (f64, f64), dst: (f64, f64)) -> Result<f64, CacheError> {
        let key = RouteKey::new(src.0, src.1, dst.0, dst.1);
        if let Some(metric) = self.cache.lookup(key) {
            return Ok(metric);
        }

        let summary = match self.provider.route(src.0, src.1, dst.0, dst.1) {
            Ok(summary) => {
                self.cache.record_compute();
                summary
            }
            Err(err) => {
                self.cache.record_compute_failure();
                return Err(err.into());
            }
        };

        let metric = summary.metric(self.config.metric);
        self.cache.insert(key, metric);
        debug!(
            src_lon = src.0,
            src_lat = src.1,
            dst_lon = dst.0,
            dst_lat = dst.1,
            metric,
            "Route computed and cached"
        );
        Ok(metric)
    }

    /// Build a sources × destinations metric matrix, computing misses in bulk.
    ///
    /// Cells already cached are filled from the cache. If any cell is
    /// missing, the engine's table service is invoked once for the
    /// sub-matrix spanning every source row and destination column that
    /// still has a miss; the fresh sub-matrix overwrites both the returned
    /// matrix and the cache for those cells. Pairs the engine reports as
    /// unroutable stay NaN in the result and are never cached.
    pub fn table(
        &self,
        sources: &[(f64, f64)],
        destinations: &[(f64, f64)],
    ) -> Result<Vec<Vec<f64>>, CacheError> {
        let mut matrix = vec![vec![f64::NAN; destinations.len()]; sources.len()];
        let mut row_missing = vec![false; sources.len()];
        let mut col_missing = vec![false; destinations.len()];

        for (i, &(src_lon, src_lat)) in sources.iter().enumerate() {
            for (j, &(dst_lon, dst_lat)) in destinations.iter().enumerate() {
                match self
                    .cache
                    .lookup(RouteKey::new(src_lon, src_lat, dst_lon, dst_lat))
                {
                    Some(metric) => matrix[i][j] = metric,
                    None => {
                        row_missing[i] = true;
                        col_missing[j] = true;
                    }
                }
            }
        }

        let rows: Vec<usize> = (0..sources.len()).filter(|&i| row_missing[i]).collect();
        let cols: Vec<usize> = (0..destinations.len()).filter(|&j| col_missing[j]).collect();
        if rows.is_empty() {
            return Ok(matrix);
        }

        let sub_sources: Vec<(f64, f64)> = rows.iter().map(|&i| sources[i]).collect();
        let sub_dests: Vec<(f64, f64)> = cols.iter().map(|&j| destinations[j]).collect();
        debug!(
            rows = sub_sources.len(),
            cols = sub_dests.len(),
            "Computing cache-missing sub-matrix via engine"
        );

        let sub = match self
            .provider
            .table(&sub_sources, &sub_dests, self.config.metric)
        {
            Ok(sub) => {
                self.cache.record_compute();
                sub
            }
            Err(err) => {
                self.cache.record_compute_failure();
                return Err(err.into());
            }
        };

        if sub.len() != sub_sources.len() || sub.iter().any(|row| row.len() != sub_dests.len()) {
            return Err(CacheError::TableShape {
                expected_rows: sub_sources.len(),
                expected_cols: sub_dests.len(),
                rows: sub.len(),
                cols: sub.first().map(|row| row.len()).unwrap_or(0),
            });
        }

        self.cache.merge_matrix(&sub_sources, &sub_dests, &sub);
        for (bi, &i) in rows.iter().enumerate() {
            for (bj, &j) in cols.iter().enumerate() {
                matrix[i][j] = sub[bi][bj];
            }
        }
        Ok(matrix)
    }

    /// Get a shared handle to the underlying cache.
    pub fn cache(&self) -> Arc<RouteCache> {
        Arc::clone(&self.cache)
    }

    /// Get the service configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Reclaim idle branch locks.
    ///
    /// The single maintenance entry point: call it from one housekeeping
    /// thread so cleanup never races itself.
    pub fn cleanup_branch_locks(&self) -> usize {
        self.cache.cleanup_branch_locks()
    }
}
