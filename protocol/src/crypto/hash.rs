//! # Hashing Utilities
//!
//! The enclave hashes everything with blake2b. Two widths are in use:
//!
//! - **blake2-256** (`hash256`) for challenge codes, operation digests,
//!   identity hashes and ID graph hashes.
//! - **blake2-512** only for SS58 checksums, where the address format fixes it.
//!
//! Every digest that leaves the client is compared byte-for-byte with one the
//! enclave computes independently, so there is no room for a "compatible"
//! alternative here.

use blake2::{digest::consts::U32, Blake2b, Blake2b512, Digest};

type Blake2b256 = Blake2b<U32>;

/// blake2b with a 256-bit output.
///
/// # Example
///
/// ```
/// use idgraph_protocol::crypto::blake2_256;
///
/// let hash = blake2_256(b"id graph");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// blake2-256 over the concatenation of several parts, without building
/// the concatenated buffer first.
pub fn blake2_256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// blake2b with a 512-bit output.
pub fn blake2_512(data: &[u8]) -> [u8; 64] {
    let digest = Blake2b512::digest(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// Lowercase hex with a `0x` prefix.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without a `0x` prefix.
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}
