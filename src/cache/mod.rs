//! Concurrent, persistent route-metric cache.
//!
//! Stores one scalar travel metric per `(src_lon, src_lat, dst_lon,
//! dst_lat)` coordinate tuple, with per-branch locking so unrelated
//! sources never contend, and a versioned binary file format for
//! durability across restarts.

mod codec;
mod lock_pool;
mod route;
mod service;
mod stats;
mod types;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use lock_pool::LockPool;
pub use route::{CacheSnapshot, DestMap, LeafMap, RouteCache};
pub use service::RouteCacheService;
pub use stats::CacheStats;
pub use types::{CacheConfig, CacheError};
