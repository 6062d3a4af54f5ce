//! Ownership proofs attached to `link_identity`.
//!
//! Web3 identities prove ownership by signing the challenge code; web2
//! identities by a public post, an OAuth2 code or an email verification code.

use parity_scale_codec::{Decode, Encode};

use crate::call::signature::MultiSignature;
use crate::config::TOKEN_PREFIX;
use crate::error::InputError;
use crate::identity::{Identity, IdentityKind};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Web3CommonValidationData {
    /// The exact message the wallet signed.
    pub message: Vec<u8>,
    pub signature: MultiSignature,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Web3ValidationData {
    #[codec(index = 0)]
    Substrate(Web3CommonValidationData),
    #[codec(index = 1)]
    Evm(Web3CommonValidationData),
    #[codec(index = 2)]
    Bitcoin(Web3CommonValidationData),
    #[codec(index = 3)]
    Solana(Web3CommonValidationData),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum TwitterValidationData {
    #[codec(index = 0)]
    PublicTweet { tweet_id: Vec<u8> },
    #[codec(index = 1)]
    OAuth2 {
        code: Vec<u8>,
        state: Vec<u8>,
        redirect_uri: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum DiscordValidationData {
    #[codec(index = 0)]
    PublicMessage {
        channel_id: Vec<u8>,
        message_id: Vec<u8>,
        guild_id: Vec<u8>,
    },
    #[codec(index = 1)]
    OAuth2 { code: Vec<u8>, redirect_uri: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct EmailValidationData {
    pub email: Vec<u8>,
    pub verification_code: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Web2ValidationData {
    #[codec(index = 0)]
    Twitter(TwitterValidationData),
    #[codec(index = 1)]
    Discord(DiscordValidationData),
    #[codec(index = 2)]
    Email(EmailValidationData),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum ValidationData {
    #[codec(index = 0)]
    Web2(Web2ValidationData),
    #[codec(index = 1)]
    Web3(Web3ValidationData),
}

impl ValidationData {
    /// Web3 proof for `identity`: the signed message and the wallet's signature.
    ///
    /// Bitcoin wallets sign the challenge code without `0x`; the enclave
    /// expects it back, so a bare code gets the prefix restored here.
    pub fn web3(
        identity: &Identity,
        message: Vec<u8>,
        signature: MultiSignature,
    ) -> Result<Self, InputError> {
        let message = match identity {
            Identity::Bitcoin(_) => restore_hex_prefix(message),
            _ => message,
        };
        let data = Web3CommonValidationData { message, signature };
        let inner = match identity {
            Identity::Substrate(_) => Web3ValidationData::Substrate(data),
            Identity::Evm(_) => Web3ValidationData::Evm(data),
            Identity::Bitcoin(_) => Web3ValidationData::Bitcoin(data),
            Identity::Solana(_) => Web3ValidationData::Solana(data),
            other => {
                return Err(InputError::InvalidAddress {
                    kind: other.kind().to_string(),
                    reason: "web2 identities need web2 validation data".into(),
                })
            }
        };
        Ok(Self::Web3(inner))
    }

    /// Kind of identity this proof can validate.
    pub fn identity_kind(&self) -> IdentityKind {
        match self {
            Self::Web2(Web2ValidationData::Twitter(_)) => IdentityKind::Twitter,
            Self::Web2(Web2ValidationData::Discord(_)) => IdentityKind::Discord,
            Self::Web2(Web2ValidationData::Email(_)) => IdentityKind::Email,
            Self::Web3(Web3ValidationData::Substrate(_)) => IdentityKind::Substrate,
            Self::Web3(Web3ValidationData::Evm(_)) => IdentityKind::Evm,
            Self::Web3(Web3ValidationData::Bitcoin(_)) => IdentityKind::Bitcoin,
            Self::Web3(Web3ValidationData::Solana(_)) => IdentityKind::Solana,
        }
    }

    /// Whether this proof is the right shape for `identity`.
    pub fn matches(&self, identity: &Identity) -> bool {
        self.identity_kind() == identity.kind()
    }
}

/// Leaves `Token: ...` and `0x`-hex messages alone; prefixes anything else
/// with `0x`.
fn restore_hex_prefix(message: Vec<u8>) -> Vec<u8> {
    let is_prefixed_hex = message
        .strip_prefix(b"0x")
        .is_some_and(|rest| rest.len() % 2 == 0 && rest.iter().all(u8::is_ascii_hexdigit));
    if message.starts_with(TOKEN_PREFIX.as_bytes()) || is_prefixed_hex {
        return message;
    }
    let mut prefixed = b"0x".to_vec();
    prefixed.extend(message);
    prefixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityString;

    #[test]
    fn test_layout_indices() {
        let tweet = ValidationData::Web2(Web2ValidationData::Twitter(
            TwitterValidationData::PublicTweet {
                tweet_id: b"1".to_vec(),
            },
        ));
        assert_eq!(tweet.encode(), vec![0, 0, 0, 0x04, b'1']);

        let sig = MultiSignature::Ethereum([0; 65]);
        let evm = ValidationData::web3(&Identity::Evm([0; 20]), b"m".to_vec(), sig).unwrap();
        assert_eq!(&evm.encode()[..5], &[1, 1, 0x04, b'm', 3]);
    }

    #[test]
    fn test_matches() {
        let sig = MultiSignature::Sr25519([0; 64]);
        let sub = Identity::Substrate([0; 32]);
        let proof = ValidationData::web3(&sub, vec![], sig).unwrap();
        assert!(proof.matches(&sub));
        assert!(!proof.matches(&Identity::Evm([0; 20])));
    }

    #[test]
    fn test_web3_helper_rejects_web2() {
        let web2 = Identity::Github(IdentityString::new(b"octo".to_vec()).unwrap());
        assert!(ValidationData::web3(&web2, vec![], MultiSignature::Sr25519([0; 64])).is_err());
    }

    #[test]
    fn test_bitcoin_message_gets_hex_prefix_back() {
        let code = "5c6cf11d75e49d9c6f26b458efcc429b3ce5626fa2ea9de874806edef934581a";
        let btc = Identity::Bitcoin([2; 33]);
        let message = |proof: ValidationData| match proof {
            ValidationData::Web3(Web3ValidationData::Bitcoin(data)) => data.message,
            other => panic!("unexpected proof {other:?}"),
        };

        let proof = ValidationData::web3(&btc, code.as_bytes().to_vec(), MultiSignature::Bitcoin([0; 65]));
        assert_eq!(message(proof.unwrap()), format!("0x{code}").into_bytes());

        for kept in [format!("0x{code}"), format!("Token: {code}")] {
            let proof = ValidationData::web3(&btc, kept.clone().into_bytes(), MultiSignature::Bitcoin([0; 65]));
            assert_eq!(message(proof.unwrap()), kept.into_bytes());
        }

        // Other classes pass the message through untouched.
        let evm = ValidationData::web3(&Identity::Evm([0; 20]), code.as_bytes().to_vec(), MultiSignature::Ethereum([0; 65]));
        match evm.unwrap() {
            ValidationData::Web3(Web3ValidationData::Evm(data)) => assert_eq!(data.message, code.as_bytes()),
            other => panic!("unexpected proof {other:?}"),
        }
    }
}
