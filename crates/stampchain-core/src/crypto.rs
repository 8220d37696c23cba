//! Hash primitives used by proof operations.
//!
//! SHA-256 is the digest of record; SHA-1 and RIPEMD-160 only appear as
//! intermediate transforms inside a proof chain.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest as _, Sha256};

use crate::types::Digest;

/// SHA-256 of the given data.
pub fn sha256(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}

/// SHA-256 over the concatenation `left || right`.
///
/// Streams both halves into the hasher instead of allocating the pair.
pub fn sha256_pair(left: &[u8], right: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    Digest(hasher.finalize().into())
}

/// Double SHA-256, as Bitcoin uses for block and transaction ids.
pub fn sha256d(data: &[u8]) -> Digest {
    sha256(sha256(data).as_bytes())
}

/// SHA-1 of the given data (20 bytes).
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// RIPEMD-160 of the given data (20 bytes).
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}
