//! # Cryptographic Primitives
//!
//! Thin wrappers over audited implementations: blake2b for every digest the
//! enclave re-derives, AES-256-GCM for the per-call shielding key, and an
//! explicit randomness context so tests can pin every random byte.

pub mod context;
pub mod hash;
pub mod shielding;

pub use context::{random_bytes, CryptoContext, OsCrypto, SeededCrypto};
pub use hash::{blake2_256, blake2_256_concat, blake2_512, from_hex, to_prefixed_hex};
pub use shielding::{AesNonce, AesOutput, RequestAesKey, ShieldingKey};
