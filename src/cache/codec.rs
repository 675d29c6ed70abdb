//! Versioned binary codec for the persisted cache.
//!
//! File layout: 4-byte magic, one format-version byte, then the
//! bincode-serialized four-level mapping. Key iteration order is
//! unspecified, so encoding is semantically (not byte-for-byte) stable;
//! decoding an encode always reproduces the same mapping.

use thiserror::Error;

use crate::cache::route::CacheSnapshot;

const MAGIC: [u8; 4] = *b"RCCH";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;

/// Errors produced when decoding a persisted cache.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The byte stream does not start with the cache file magic
    #[error("Not a route cache file (bad magic)")]
    BadMagic,

    /// The file was written by an unknown format version
    #[error("Unsupported cache format version {0}")]
    UnsupportedVersion(u8),

    /// The payload does not match the expected nested-mapping shape
    #[error("Malformed cache payload: {0}")]
    Malformed(String),
}

/// Error produced when encoding a cache for persistence.
#[derive(Debug, Error)]
#[error("Failed to encode cache: {0}")]
pub struct EncodeError(String);

/// Serialize a cache snapshot into the on-disk byte format.
pub fn encode(snapshot: &CacheSnapshot) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(HEADER_LEN + 64);
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    bincode::serialize_into(&mut buf, snapshot).map_err(|err| EncodeError(err.to_string()))?;
    Ok(buf)
}

/// Deserialize a cache snapshot from the on-disk byte format.
///
/// An empty byte stream is an empty cache, not an error. Anything else that
/// is not a well-formed versioned payload yields a [`DecodeError`].
pub fn decode(bytes: &[u8]) -> Result<CacheSnapshot, DecodeError> {
    if bytes.is_empty() {
        return Ok(CacheSnapshot::new());
    }
    if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let version = bytes[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    bincode::deserialize(&bytes[HEADER_LEN..]).map_err(|err| DecodeError::Malformed(err.to_string()))
}
