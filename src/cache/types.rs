//! Error and configuration types for the cache.

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::codec::{DecodeError, EncodeError};
use crate::provider::{MetricKind, RouteError};

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error reading or writing the cache file
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file exists but could not be decoded
    #[error("Cache decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The cache could not be encoded for persistence
    #[error("Cache encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The routing engine failed; propagated verbatim, never cached
    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    /// The engine returned a matrix with the wrong dimensions
    #[error("Table shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    TableShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
}

/// Cache service configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Path of the persisted cache file
    pub cache_file: PathBuf,
    /// Which scalar of a route result is cached
    pub metric: MetricKind,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cache_file = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("routecache")
            .join("routes.cache");

        Self {
            cache_file,
            metric: MetricKind::Duration,
        }
    }
}

impl CacheConfig {
    /// Create a configuration persisting to the given file.
    pub fn new(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            ..Self::default()
        }
    }

    /// Set the cache file path.
    pub fn with_cache_file(mut self, cache_file: impl Into<PathBuf>) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    /// Set which metric is cached.
    pub fn with_metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }
}
