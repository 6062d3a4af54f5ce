//! # DID Mapping
//!
//! Identities round-trip through a `did:litentry:<kind>:<handle>` string,
//! the form used by credential subjects and by CLI output.
//!
//! | kind        | handle encoding  |
//! |-------------|------------------|
//! | `substrate` | `0x` hex         |
//! | `evm`       | `0x` hex         |
//! | `bitcoin`   | `0x` hex         |
//! | `solana`    | base58           |
//! | web2 kinds  | UTF-8 as is      |

use crate::config::DID_PREFIX;
use crate::crypto::{from_hex, to_prefixed_hex};
use crate::error::InputError;
use crate::identity::address::{parse_bitcoin, parse_evm, parse_solana};
use crate::identity::types::{Identity, IdentityKind, IdentityString};

impl Identity {
    /// Render as a DID.
    ///
    /// Fails only for web2 handles that are not valid UTF-8, which can
    /// happen for identities decoded from the wire.
    pub fn to_did(&self) -> Result<String, InputError> {
        let handle = match self {
            Identity::Solana(key) => bs58::encode(key).into_string(),
            Identity::Substrate(key) => to_prefixed_hex(key),
            Identity::Evm(address) => to_prefixed_hex(address),
            Identity::Bitcoin(key) => to_prefixed_hex(key),
            Identity::Twitter(h) | Identity::Discord(h) | Identity::Github(h) | Identity::Email(h) => h
                .as_str()
                .ok_or_else(|| InputError::InvalidDid(format!("{} handle is not utf-8", self.kind())))?
                .to_string(),
        };
        Ok(format!("{DID_PREFIX}{}:{handle}", self.kind()))
    }

    /// Parse a DID produced by [`Identity::to_did`].
    pub fn from_did(did: &str) -> Result<Self, InputError> {
        let suffix = did
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| InputError::InvalidDid(format!("missing {DID_PREFIX} prefix")))?;
        let (kind, handle) = suffix
            .split_once(':')
            .ok_or_else(|| InputError::InvalidDid("expected <kind>:<handle>".into()))?;
        if handle.contains(':') {
            return Err(InputError::InvalidDid("too many segments".into()));
        }

        let kind: IdentityKind = kind
            .parse()
            .map_err(|_| InputError::InvalidDid(format!("unknown did type {kind}")))?;
        let web2 = || IdentityString::new(handle.as_bytes().to_vec());

        Ok(match kind {
            IdentityKind::Substrate => {
                let bytes = from_hex(handle).map_err(|e| InputError::InvalidDid(e.to_string()))?;
                Identity::Substrate(
                    bytes
                        .try_into()
                        .map_err(|_| InputError::InvalidDid("substrate key is not 32 bytes".into()))?,
                )
            }
            IdentityKind::Evm => Identity::Evm(parse_evm(handle)?),
            IdentityKind::Bitcoin => Identity::Bitcoin(parse_bitcoin(handle)?),
            IdentityKind::Solana => Identity::Solana(parse_solana(handle)?),
            IdentityKind::Twitter => Identity::Twitter(web2()?),
            IdentityKind::Discord => Identity::Discord(web2()?),
            IdentityKind::Github => Identity::Github(web2()?),
            IdentityKind::Email => Identity::Email(web2()?),
        })
    }
}
