//! # Identity Model
//!
//! Identities are the unit everything else hangs off: they sign calls, they
//! are linked into ID graphs, and their encoded bytes feed every digest the
//! enclave re-derives.
//!
//! - [`types`] holds the wire types ([`Identity`], [`Web3Network`]).
//! - [`factory`] builds identities from user input or encoded bytes.
//! - [`address`] parses the per-chain address formats.
//! - [`did`] maps identities to and from `did:litentry:` strings.
//! - [`id_graph`] models the linked-identity graph and its hash.

pub mod address;
pub mod did;
pub mod factory;
pub mod id_graph;
pub mod types;

pub use factory::{create_identity, identity_from_encoded, identity_from_hex, IdentityDescriptor};
pub use id_graph::{IdGraph, IdentityContext, IdentityStatus};
pub use types::{Identity, IdentityKind, IdentityString, Web3Network};
