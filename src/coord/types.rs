//! Coordinate key type definitions

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hashable key for a single longitude or latitude component.
///
/// Wraps the raw IEEE-754 bit pattern of an `f64`, so equality and hashing
/// are exact-bit: no epsilon tolerance and no rounding. Two logically equal
/// coordinates produced by different arithmetic paths are *different* keys,
/// `-0.0` and `+0.0` are distinct, and NaN bit patterns are ordinary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey(u64);

impl CoordKey {
    /// Create a key from a coordinate component.
    #[inline]
    pub fn new(value: f64) -> Self {
        Self(value.to_bits())
    }

    /// Recover the coordinate component this key was created from.
    #[inline]
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl From<f64> for CoordKey {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// Persisted as the f64 value itself; the bit pattern survives the round
// trip because binary serde formats write the raw 8 bytes.
impl Serialize for CoordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for CoordKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::new)
    }
}

/// Identity of a cache branch: the source coordinate pair.
///
/// All routes sharing a source point live under one branch, which is the
/// granularity at which writers are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchKey {
    /// Source longitude component
    pub lon: CoordKey,
    /// Source latitude component
    pub lat: CoordKey,
}

impl BranchKey {
    /// Create a branch key from source coordinates.
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon: CoordKey::new(lon),
            lat: CoordKey::new(lat),
        }
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lon, self.lat)
    }
}

/// Full key for one cached route: source and destination coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// Source longitude
    pub src_lon: CoordKey,
    /// Source latitude
    pub src_lat: CoordKey,
    /// Destination longitude
    pub dst_lon: CoordKey,
    /// Destination latitude
    pub dst_lat: CoordKey,
}

impl RouteKey {
    /// Create a route key from raw coordinates.
    #[inline]
    pub fn new(src_lon: f64, src_lat: f64, dst_lon: f64, dst_lat: f64) -> Self {
        Self {
            src_lon: CoordKey::new(src_lon),
            src_lat: CoordKey::new(src_lat),
            dst_lon: CoordKey::new(dst_lon),
            dst_lat: CoordKey::new(dst_lat),
        }
    }

    /// The branch this route belongs to.
    #[inline]
    pub fn branch(&self) -> BranchKey {
        BranchKey {
            lon: self.src_lon,
            lat: self.src_lat,
        }
    }
}
