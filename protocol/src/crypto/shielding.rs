//! # Ephemeral Shielding Keys
//!
//! Each mutating call embeds a fresh AES-256-GCM key. The enclave encrypts
//! its result (the mutated ID graph, a VC payload) back to the caller under
//! that key, and the client uses the same key to seal the outgoing request.
//!
//! ## Lifetime
//!
//! A [`ShieldingKey`] is generated once per call and dropped after the
//! round trip. It never implements `Serialize` and its `Debug` output is
//! redacted. The only way to get the raw bytes out is [`ShieldingKey::export`],
//! which exists so the key can be placed into the trusted call.
//!
//! ## Nonces
//!
//! Random 96-bit nonces from the caller's [`CryptoContext`]. The nonce length
//! is enforced by the type (`[u8; 12]`); byte slices of any other length are
//! rejected by [`nonce_from_slice`] before they reach the cipher.
//!
//! ## Errors
//!
//! Decryption failures surface as a single generic message. Whether the key,
//! the nonce, the tag or the aad was wrong is not reported.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use parity_scale_codec::{Decode, Encode};
use tracing::debug;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH};
use crate::crypto::context::{random_bytes, CryptoContext};
use crate::error::{CryptoError, InputError};

/// Raw AES-256 key bytes as carried inside a trusted call.
pub type RequestAesKey = [u8; AES_KEY_LENGTH];

/// AES-GCM nonce.
pub type AesNonce = [u8; AES_NONCE_LENGTH];

/// Ciphertext plus everything needed to open it, as shipped on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AesOutput {
    /// Ciphertext with the 16-byte GCM tag appended.
    pub ciphertext: Vec<u8>,
    /// Additional authenticated data.
    pub aad: Vec<u8>,
    /// Nonce used for this ciphertext.
    pub nonce: AesNonce,
}

/// A single-use AES-256-GCM key.
#[derive(Clone, PartialEq, Eq)]
pub struct ShieldingKey {
    bytes: RequestAesKey,
}

impl std::fmt::Debug for ShieldingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ShieldingKey(<redacted>)")
    }
}

impl ShieldingKey {
    /// Generate a fresh key from the given context.
    pub fn generate(ctx: &dyn CryptoContext) -> Self {
        Self {
            bytes: random_bytes::<AES_KEY_LENGTH>(ctx),
        }
    }

    /// Wrap existing key bytes. Used by the enclave side of the mock
    /// transport after it unwraps a request key.
    pub fn from_bytes(bytes: RequestAesKey) -> Self {
        Self { bytes }
    }

    /// The raw 32 key bytes.
    pub fn export(&self) -> RequestAesKey {
        self.bytes
    }

    fn cipher(&self) -> Aes256Gcm {
        // Key length is fixed by the type, so this cannot fail.
        Aes256Gcm::new(&self.bytes.into())
    }

    /// Encrypt `cleartext` under this key. Returns ciphertext with tag.
    pub fn encrypt(
        &self,
        cleartext: &[u8],
        nonce: &AesNonce,
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: cleartext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::EncryptFailed)
    }

    /// Decrypt `ciphertext` (with tag) under this key.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &AesNonce,
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| {
                debug!(ciphertext_len = ciphertext.len(), "aes-gcm authentication failed");
                CryptoError::DecryptFailed
            })
    }

    /// Encrypt under a fresh random nonce and package the result.
    pub fn seal(
        &self,
        ctx: &dyn CryptoContext,
        cleartext: &[u8],
        aad: &[u8],
    ) -> Result<AesOutput, CryptoError> {
        let nonce = random_bytes::<AES_NONCE_LENGTH>(ctx);
        let ciphertext = self.encrypt(cleartext, &nonce, aad)?;
        Ok(AesOutput {
            ciphertext,
            aad: aad.to_vec(),
            nonce,
        })
    }

    /// Open an [`AesOutput`] produced by [`ShieldingKey::seal`] or by the enclave.
    pub fn open(&self, output: &AesOutput) -> Result<Vec<u8>, CryptoError> {
        self.decrypt(&output.ciphertext, &output.nonce, &output.aad)
    }
}

/// Check a caller-supplied nonce slice.
pub fn nonce_from_slice(bytes: &[u8]) -> Result<AesNonce, InputError> {
    bytes
        .try_into()
        .map_err(|_| InputError::InvalidNonceLength(bytes.len()))
}
