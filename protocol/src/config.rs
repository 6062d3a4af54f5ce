//! # Protocol Configuration & Constants
//!
//! Every magic number the client shares with the enclave lives here. The
//! enclave re-derives signing payloads and decodes call tuples on its own,
//! so most of these values are not tunables at all: they are one half of a
//! wire contract. Changing one of them without a matching enclave release
//! produces calls that decode as garbage on the other side.
//!
//! The few knobs that are genuinely local to the client live in
//! [`ClientConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// AES-256-GCM for the ephemeral shielding key. The enclave encrypts its
/// results back to the caller under this key.
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-GCM";

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. Twelve, always.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// Output length of `hash256` (blake2b truncated to 256 bits).
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Length of a shard identifier (an `H256`).
pub const SHARD_LENGTH: usize = 32;

/// Length of the random client-side correlation id (`tx_hash`).
pub const CORRELATION_ID_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Identity Limits
// ---------------------------------------------------------------------------

/// Web2 handles are bounded to 64 bytes by the enclave schema.
pub const MAX_IDENTITY_STRING_LENGTH: usize = 64;

/// Substrate public keys and Solana keys.
pub const ADDRESS32_LENGTH: usize = 32;

/// EVM addresses.
pub const ADDRESS20_LENGTH: usize = 20;

/// Compressed secp256k1 public keys (Bitcoin identities).
pub const ADDRESS33_LENGTH: usize = 33;

/// SS58 checksum preimage prefix.
pub const SS58_PREFIX: &[u8] = b"SS58PRE";

/// Number of checksum bytes appended to an SS58 address carrying a 32-byte key.
pub const SS58_CHECKSUM_LENGTH: usize = 2;

/// DID method prefix used for identity round trips.
pub const DID_PREFIX: &str = "did:litentry:";

// ---------------------------------------------------------------------------
// Call Limits
// ---------------------------------------------------------------------------

/// `request_batch_vc` carries a bounded vector of assertions on the enclave side.
pub const MAX_BATCH_ASSERTIONS: usize = 128;

// ---------------------------------------------------------------------------
// Payload Prettification
// ---------------------------------------------------------------------------

/// Marker placed immediately before the digest in every prettified message.
pub const TOKEN_PREFIX: &str = "Token: ";

/// Sentence shown to the user when linking an identity.
pub const LINK_IDENTITY_MESSAGE: &str = "By linking your identity to our platform, you're taking a step towards a more integrated experience. Please be assured, this process is safe and involves no transactions of your assets.";

/// Reassurance sentence appended to every VC request message.
pub const VC_REASSURANCE_MESSAGE: &str =
    "Please be assured, this process is safe and involves no transactions of your assets.";

/// Sentence shown to the user when reading their ID graph via a trusted getter.
pub const ID_GRAPH_GETTER_MESSAGE: &str = "Our team is ready to support you in retrieving your on-chain identity securely. Please be assured, this process is safe and involves no transactions of your assets.";

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request id used for one-shot connections. It must stay a small integer:
/// large numbers and strings break response correlation in the transport.
pub const DEFAULT_RPC_ID: u32 = 1;

/// Read path. Single response frame.
pub const METHOD_EXECUTE_GETTER: &str = "state_executeGetter";

/// Mutation path. May stream intermediate status frames.
pub const METHOD_SUBMIT_AND_WATCH: &str = "author_submitAndWatchAesRequest";

/// VC issuance path. One frame per requested assertion.
pub const METHOD_REQUEST_VC: &str = "author_requestVc";

// ---------------------------------------------------------------------------
// Client Configuration
// ---------------------------------------------------------------------------

/// How getters treat an absent value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// `None` on the wire becomes `Ok(None)`.
    Lenient,
    /// `None` on the wire is a decode error naming the requested type.
    Strict,
}

/// Client-local tunables. None of these are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON-RPC id used on outgoing requests.
    pub rpc_id: u32,
    /// Decode mode used by the nonce getter. The ID-graph-hash getter always
    /// fails open regardless of this value.
    pub nonce_decode_mode: DecodeMode,
    /// When a link call is made without explicit networks, fall back to the
    /// identity's default network set instead of rejecting the call.
    pub default_networks_on_link: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_id: DEFAULT_RPC_ID,
            nonce_decode_mode: DecodeMode::Strict,
            default_networks_on_link: true,
        }
    }
}

/// Errors from loading a [`ClientConfig`] file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rpc id {0} is not a small positive integer")]
    InvalidRpcId(u32),
}

impl ClientConfig {
    /// Load a JSON config file. Missing keys fall back to [`Default`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject ids the transport cannot correlate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_id == 0 || self.rpc_id > u16::MAX as u32 {
            return Err(ConfigError::InvalidRpcId(self.rpc_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(AES_KEY_LENGTH, 32);
        assert_eq!(AES_NONCE_LENGTH, 12);
        assert_eq!(AES_TAG_LENGTH, 16);
        assert_eq!(HASH_OUTPUT_LENGTH, 32);
        assert_eq!(SHARD_LENGTH, 32);
    }

    #[test]
    fn test_messages_do_not_embed_token_marker() {
        // The marker is appended by the payload builder, never baked in.
        assert!(!LINK_IDENTITY_MESSAGE.contains(TOKEN_PREFIX));
        assert!(!VC_REASSURANCE_MESSAGE.contains(TOKEN_PREFIX));
        assert!(!ID_GRAPH_GETTER_MESSAGE.contains(TOKEN_PREFIX));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rpc_id, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ClientConfig::from_json(r#"{ "nonce_decode_mode": "lenient" }"#).unwrap();
        assert_eq!(config.nonce_decode_mode, DecodeMode::Lenient);
        assert_eq!(config.rpc_id, DEFAULT_RPC_ID);
        assert!(config.default_networks_on_link);
    }

    #[test]
    fn test_large_rpc_id_rejected() {
        let err = ClientConfig::from_json(r#"{ "rpc_id": 4294967295 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRpcId(_)));
    }
}
