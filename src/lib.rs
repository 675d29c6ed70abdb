//! routecache - concurrent, persistent route-metric cache
//!
//! Caches the scalar results (travel duration or distance) of an expensive
//! external route-computation engine, keyed by exact source and destination
//! coordinates, so repeated queries for the same pair never hit the engine
//! twice. The cache is safe for concurrent use from many threads and
//! survives process restarts through a compact binary file.
//!
//! # High-Level API
//!
//! Most callers go through the [`cache::RouteCacheService`] facade:
//!
//! ```ignore
//! use std::sync::Arc;
//! use routecache::cache::{CacheConfig, RouteCacheService};
//!
//! let config = CacheConfig::new("/var/cache/myapp/routes.cache");
//! let service = RouteCacheService::open(config, Arc::new(engine))?;
//!
//! let seconds = service.get_or_compute((13.405, 52.52), (11.576, 48.137))?;
//! service.save()?;
//! ```
//!
//! `engine` is any implementation of [`provider::RouteProvider`]; the
//! cache never computes routes itself.
//!
//! Lookups are exact-key only: coordinates are matched on their f64 bit
//! patterns, with no rounding or proximity tolerance (see
//! [`coord::CoordKey`]).

pub mod cache;
pub mod coord;
pub mod logging;
pub mod provider;

/// Version of the routecache library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
