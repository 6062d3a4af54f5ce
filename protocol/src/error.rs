//! Error types for the enclave client.
//!
//! Every fallible operation in the crate returns a [`ClientError`]. The
//! variants map one-to-one onto the five failure classes a caller has to
//! tell apart: bad input, crypto failure, undecodable wire data, a protocol
//! violation by the enclave, and transport trouble.

use thiserror::Error;

use crate::response::StfError;

/// Caller supplied something the client refuses to build a request from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A required descriptor field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The address or handle does not decode for the declared kind.
    #[error("invalid {kind} address: {reason}")]
    InvalidAddress {
        /// Declared identity kind.
        kind: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Unrecognised identity kind name.
    #[error("unknown identity kind: {0}")]
    UnknownKind(String),

    /// Unrecognised network name.
    #[error("unknown web3 network: {0}")]
    UnknownNetwork(String),

    /// The networks do not belong to the identity's class.
    #[error("web3 networks {networks:?} do not match identity kind {kind}")]
    NetworkMismatch {
        /// Identity kind the networks were attached to.
        kind: String,
        /// Offending network list.
        networks: Vec<String>,
    },

    /// Batch VC requests carry between 1 and 128 assertions.
    #[error("invalid assertion count {0}: expected 1..=128")]
    InvalidAssertionCount(usize),

    /// AES-GCM nonces are exactly twelve bytes.
    #[error("invalid nonce length {0}: expected 12 bytes")]
    InvalidNonceLength(usize),

    /// The signature bytes do not fit the signer's scheme.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Malformed DID string.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// Malformed hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Cryptographic failure. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Failed to encrypt data")]
    EncryptFailed,

    #[error("Failed to decrypt data")]
    DecryptFailed,
}

/// Wire data that could not be decoded into the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The hex string itself was malformed.
    #[error("invalid hex for {type_name}: {reason}")]
    Hex {
        /// Type the caller asked for.
        type_name: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// SCALE decoding failed.
    #[error("cannot decode {type_name}: {reason}")]
    Scale {
        /// Type the caller asked for.
        type_name: &'static str,
        /// Codec message.
        reason: String,
    },

    /// Strict mode saw `None` where a value was required.
    #[error("expected a value of type {type_name}, got None")]
    NoneValue {
        /// Type the caller asked for.
        type_name: &'static str,
    },

    /// The first byte of an Option was neither 0x00 nor 0x01.
    #[error("invalid Option discriminant 0x{byte:02x} for {type_name}")]
    InvalidDiscriminant {
        /// Type the caller asked for.
        type_name: &'static str,
        /// The discriminant that was seen.
        byte: u8,
    },

    /// The value decoded but bytes were left over.
    #[error("{remaining} trailing bytes after {type_name}")]
    TrailingBytes {
        /// Type the caller asked for.
        type_name: &'static str,
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// Text that should have been UTF-8 was not.
    #[error("invalid utf-8 in {0}")]
    Utf8(&'static str),
}

/// The enclave answered, but not with something we accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A frame carried no value.
    #[error("empty response value")]
    EmptyResponse,

    /// No frames at all came back.
    #[error("no response frames received")]
    NoFrames,

    /// The enclave reported a state transition error.
    #[error("enclave error: {0}")]
    Stf(StfError),

    /// The enclave reported an error that is not a decodable `StfError`.
    #[error("enclave error: {0}")]
    Enclave(String),

    /// The trusted operation was rejected as invalid.
    #[error("trusted operation is invalid")]
    InvalidOperation,

    /// The JSON-RPC layer returned an error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// Decrypted graph does not hash to the shipped digest.
    #[error("id graph hash mismatch: expected {expected}, computed {computed}")]
    IdGraphHashMismatch {
        /// Digest shipped by the enclave.
        expected: String,
        /// Digest recomputed locally.
        computed: String,
    },

    /// One assertion of a VC batch failed.
    #[error("vc request {idx}/{len} failed: {detail}")]
    VcRequestFailed {
        /// Zero-based index of the assertion.
        idx: u8,
        /// Batch size.
        len: u8,
        /// Enclave-side reason.
        detail: String,
    },

    /// The request lifecycle was driven out of order.
    #[error("invalid request transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// The signer identity cannot produce the signature type required.
    #[error("unsupported signer: {0}")]
    UnsupportedSigner(String),
}

/// Failure in the external transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds waited before giving up.
        elapsed_ms: u64,
    },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("connection closed before the final frame")]
    Closed,
}

/// Top-level error returned by every public operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// True when the error means the enclave may never have seen the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// Crate-wide result alias.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
