//! # Signatures
//!
//! The wallet signs outside the client; what comes back is a string. This
//! module turns that string into the tagged signature the enclave expects,
//! picking the scheme from the signer's identity class.
//!
//! | signer     | scheme      | length | accepted encodings  |
//! |------------|-------------|--------|---------------------|
//! | Evm        | `Ethereum`  | 65     | hex                 |
//! | Bitcoin    | `Bitcoin`   | 65     | base64, hex         |
//! | Substrate  | `Sr25519`   | 64     | hex                 |
//! | Solana     | `Ed25519`   | 64     | hex, base58         |

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parity_scale_codec::{Decode, Encode};

use crate::crypto::from_hex;
use crate::error::InputError;
use crate::identity::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum MultiSignature {
    #[codec(index = 0)]
    Ed25519([u8; 64]),
    #[codec(index = 1)]
    Sr25519([u8; 64]),
    /// secp256k1 over a blake2 hash.
    #[codec(index = 2)]
    Ecdsa([u8; 65]),
    /// secp256k1 over keccak256, personal-sign style.
    #[codec(index = 3)]
    Ethereum([u8; 65]),
    /// Bitcoin signed message.
    #[codec(index = 4)]
    Bitcoin([u8; 65]),
}

/// Scheme selector for [`decode_signature_as`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Ed25519,
    Sr25519,
    Ecdsa,
    Ethereum,
    Bitcoin,
}

impl MultiSignature {
    pub fn scheme(&self) -> SignatureScheme {
        match self {
            Self::Ed25519(_) => SignatureScheme::Ed25519,
            Self::Sr25519(_) => SignatureScheme::Sr25519,
            Self::Ecdsa(_) => SignatureScheme::Ecdsa,
            Self::Ethereum(_) => SignatureScheme::Ethereum,
            Self::Bitcoin(_) => SignatureScheme::Bitcoin,
        }
    }
}

fn sized<const N: usize>(bytes: Vec<u8>, scheme: SignatureScheme) -> Result<[u8; N], InputError> {
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        InputError::InvalidSignature(format!("{scheme:?} signature must be {N} bytes, got {len}"))
    })
}

fn is_plain_hex(raw: &str, bytes: usize) -> bool {
    raw.len() == bytes * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

fn hex_sig(raw: &str) -> Result<Vec<u8>, InputError> {
    from_hex(raw).map_err(|e| InputError::InvalidSignature(e.to_string()))
}

/// Decode `raw` with an explicit scheme.
pub fn decode_signature_as(scheme: SignatureScheme, raw: &str) -> Result<MultiSignature, InputError> {
    let raw = raw.trim();
    let sig = match scheme {
        SignatureScheme::Ed25519 => {
            let bytes = if raw.starts_with("0x") || is_plain_hex(raw, 64) {
                hex_sig(raw)?
            } else {
                bs58::decode(raw)
                    .into_vec()
                    .map_err(|e| InputError::InvalidSignature(e.to_string()))?
            };
            MultiSignature::Ed25519(sized(bytes, scheme)?)
        }
        SignatureScheme::Sr25519 => MultiSignature::Sr25519(sized(hex_sig(raw)?, scheme)?),
        SignatureScheme::Ecdsa => MultiSignature::Ecdsa(sized(hex_sig(raw)?, scheme)?),
        SignatureScheme::Ethereum => MultiSignature::Ethereum(sized(hex_sig(raw)?, scheme)?),
        SignatureScheme::Bitcoin => {
            let bytes = if raw.starts_with("0x") || is_plain_hex(raw, 65) {
                hex_sig(raw)?
            } else {
                BASE64.decode(raw).map_err(|_| {
                    InputError::InvalidSignature("bitcoin signature is neither base64 nor hex".into())
                })?
            };
            MultiSignature::Bitcoin(sized(bytes, scheme)?)
        }
    };
    Ok(sig)
}

/// Default scheme for a signer. Web2 identities cannot sign.
pub fn default_scheme(signer: &Identity) -> Result<SignatureScheme, InputError> {
    match signer {
        Identity::Evm(_) => Ok(SignatureScheme::Ethereum),
        Identity::Bitcoin(_) => Ok(SignatureScheme::Bitcoin),
        Identity::Substrate(_) => Ok(SignatureScheme::Sr25519),
        Identity::Solana(_) => Ok(SignatureScheme::Ed25519),
        other => Err(InputError::InvalidSignature(format!(
            "{} identities cannot sign requests",
            other.kind()
        ))),
    }
}

/// Decode `raw` with the scheme implied by the signer's class.
pub fn decode_signature(signer: &Identity, raw: &str) -> Result<MultiSignature, InputError> {
    decode_signature_as(default_scheme(signer)?, raw)
}
