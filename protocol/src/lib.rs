// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # IdGraph Protocol: Enclave Client Library
//!
//! Client side of a confidential identity service running inside a TEE
//! enclave. The client builds identities, assembles trusted calls, derives
//! the exact payload a wallet signs, seals the signed call under a single-use
//! AES-256-GCM key, hands it to a transport, and decrypts and verifies what
//! comes back.
//!
//! ## Architecture
//!
//! Leaf first:
//!
//! - **identity**: the identity model, address parsing, DIDs, ID graphs.
//! - **crypto**: blake2 digests, shielding keys, randomness contexts.
//! - **call**: trusted calls, getters, wallet signatures, assertions.
//! - **payload**: challenge codes and the payload-to-sign builder.
//! - **request**: envelopes, JSON-RPC, the transport seam, the client.
//! - **response**: frame types and the decoders that verify them.
//! - **codec** / **config** / **error**: shared plumbing.
//!
//! ## Ground Rules
//!
//! 1. Anything the enclave re-derives is bit-exact. Byte layouts live in
//!    [`config`] and in the `#[codec(index)]` attributes, nowhere else.
//! 2. Randomness is always drawn from an explicit [`crypto::CryptoContext`].
//! 3. Decoding fails closed. The one exception is the ID-graph-hash getter.
//! 4. Nothing retries. A failed call is reported, not repeated.

pub mod call;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod payload;
pub mod request;
pub mod response;

/// 32-byte hash as used on the wire.
pub type H256 = [u8; 32];

/// Identifier of the enclave's execution shard.
pub type ShardId = H256;

/// Per-identity replay counter.
pub type Index = u32;

pub use error::{ClientError, Result};
pub use identity::{create_identity, Identity, IdentityKind, Web3Network};
pub use request::{EnclaveClient, EnclaveTransport, PreparedRequest};
