//! Identity and network types exactly as the enclave encodes them.
//!
//! Enum discriminants are pinned with `#[codec(index = ..)]`. Reordering
//! variants in this file is harmless; changing an index is a wire break.

use std::fmt;
use std::str::FromStr;

use parity_scale_codec::{Decode, Encode, Error as CodecError, Input};

use crate::config::{
    ADDRESS20_LENGTH, ADDRESS32_LENGTH, ADDRESS33_LENGTH, MAX_IDENTITY_STRING_LENGTH,
};
use crate::crypto::blake2_256;
use crate::error::InputError;
use crate::H256;

// ---------------------------------------------------------------------------
// IdentityString
// ---------------------------------------------------------------------------

/// Web2 handle bytes, at most 64 long. Encoded as a length-prefixed byte vector.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Encode)]
pub struct IdentityString(Vec<u8>);

impl IdentityString {
    /// Build a handle, rejecting anything over the enclave's bound.
    pub fn new(bytes: Vec<u8>) -> Result<Self, InputError> {
        if bytes.len() > MAX_IDENTITY_STRING_LENGTH {
            return Err(InputError::InvalidAddress {
                kind: "web2".into(),
                reason: format!(
                    "handle is {} bytes, limit is {MAX_IDENTITY_STRING_LENGTH}",
                    bytes.len()
                ),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The handle as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl Decode for IdentityString {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let bytes = Vec::<u8>::decode(input)?;
        if bytes.len() > MAX_IDENTITY_STRING_LENGTH {
            return Err("IdentityString exceeds 64 bytes".into());
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for IdentityString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "{s:?}"),
            None => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

// ---------------------------------------------------------------------------
// Web3Network
// ---------------------------------------------------------------------------

/// Chains a web3 identity may be linked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub enum Web3Network {
    #[codec(index = 0)]
    Polkadot,
    #[codec(index = 1)]
    Kusama,
    #[codec(index = 2)]
    Litentry,
    #[codec(index = 3)]
    Litmus,
    #[codec(index = 4)]
    LitentryRococo,
    #[codec(index = 5)]
    Khala,
    #[codec(index = 6)]
    SubstrateTestnet,
    #[codec(index = 7)]
    Ethereum,
    #[codec(index = 8)]
    Bsc,
    #[codec(index = 9)]
    BitcoinP2tr,
    #[codec(index = 10)]
    BitcoinP2pkh,
    #[codec(index = 11)]
    BitcoinP2sh,
    #[codec(index = 12)]
    BitcoinP2wpkh,
    #[codec(index = 13)]
    BitcoinP2wsh,
    #[codec(index = 14)]
    Polygon,
    #[codec(index = 15)]
    Arbitrum,
    #[codec(index = 16)]
    Solana,
    #[codec(index = 17)]
    Combo,
}

impl Web3Network {
    /// Every network, in index order.
    pub const ALL: [Web3Network; 18] = [
        Web3Network::Polkadot,
        Web3Network::Kusama,
        Web3Network::Litentry,
        Web3Network::Litmus,
        Web3Network::LitentryRococo,
        Web3Network::Khala,
        Web3Network::SubstrateTestnet,
        Web3Network::Ethereum,
        Web3Network::Bsc,
        Web3Network::BitcoinP2tr,
        Web3Network::BitcoinP2pkh,
        Web3Network::BitcoinP2sh,
        Web3Network::BitcoinP2wpkh,
        Web3Network::BitcoinP2wsh,
        Web3Network::Polygon,
        Web3Network::Arbitrum,
        Web3Network::Solana,
        Web3Network::Combo,
    ];

    pub fn is_substrate(&self) -> bool {
        matches!(
            self,
            Self::Polkadot
                | Self::Kusama
                | Self::Litentry
                | Self::Litmus
                | Self::LitentryRococo
                | Self::Khala
                | Self::SubstrateTestnet
        )
    }

    pub fn is_evm(&self) -> bool {
        matches!(
            self,
            Self::Ethereum | Self::Bsc | Self::Polygon | Self::Arbitrum | Self::Combo
        )
    }

    pub fn is_bitcoin(&self) -> bool {
        matches!(
            self,
            Self::BitcoinP2tr
                | Self::BitcoinP2pkh
                | Self::BitcoinP2sh
                | Self::BitcoinP2wpkh
                | Self::BitcoinP2wsh
        )
    }

    pub fn is_solana(&self) -> bool {
        matches!(self, Self::Solana)
    }

    /// Wire index.
    pub fn code(&self) -> u8 {
        self.encode()[0]
    }

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polkadot => "polkadot",
            Self::Kusama => "kusama",
            Self::Litentry => "litentry",
            Self::Litmus => "litmus",
            Self::LitentryRococo => "litentry_rococo",
            Self::Khala => "khala",
            Self::SubstrateTestnet => "substrate_testnet",
            Self::Ethereum => "ethereum",
            Self::Bsc => "bsc",
            Self::BitcoinP2tr => "bitcoin_p2tr",
            Self::BitcoinP2pkh => "bitcoin_p2pkh",
            Self::BitcoinP2sh => "bitcoin_p2sh",
            Self::BitcoinP2wpkh => "bitcoin_p2wpkh",
            Self::BitcoinP2wsh => "bitcoin_p2wsh",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
            Self::Solana => "solana",
            Self::Combo => "combo",
        }
    }
}

impl fmt::Display for Web3Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Web3Network {
    type Err = InputError;

    /// Case-insensitive. Accepts `LitentryRococo` as well as `litentry_rococo`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "");
        Self::ALL
            .iter()
            .copied()
            .find(|n| n.as_str().replace('_', "") == wanted)
            .ok_or_else(|| InputError::UnknownNetwork(s.to_string()))
    }
}

/// All substrate networks.
pub fn all_substrate_web3networks() -> Vec<Web3Network> {
    Web3Network::ALL.into_iter().filter(|n| n.is_substrate()).collect()
}

/// All EVM networks.
pub fn all_evm_web3networks() -> Vec<Web3Network> {
    Web3Network::ALL.into_iter().filter(|n| n.is_evm()).collect()
}

/// All bitcoin address flavours.
pub fn all_bitcoin_web3networks() -> Vec<Web3Network> {
    Web3Network::ALL.into_iter().filter(|n| n.is_bitcoin()).collect()
}

/// Solana.
pub fn all_solana_web3networks() -> Vec<Web3Network> {
    Web3Network::ALL.into_iter().filter(|n| n.is_solana()).collect()
}

// ---------------------------------------------------------------------------
// IdentityKind
// ---------------------------------------------------------------------------

/// Declared kind of an identity descriptor, before any bytes are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    Twitter,
    Discord,
    Github,
    Substrate,
    Evm,
    Bitcoin,
    Solana,
    Email,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Discord => "discord",
            Self::Github => "github",
            Self::Substrate => "substrate",
            Self::Evm => "evm",
            Self::Bitcoin => "bitcoin",
            Self::Solana => "solana",
            Self::Email => "email",
        }
    }

    pub fn is_web2(&self) -> bool {
        matches!(
            self,
            Self::Twitter | Self::Discord | Self::Github | Self::Email
        )
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitter" => Ok(Self::Twitter),
            "discord" => Ok(Self::Discord),
            "github" => Ok(Self::Github),
            "substrate" => Ok(Self::Substrate),
            "evm" => Ok(Self::Evm),
            "bitcoin" => Ok(Self::Bitcoin),
            "solana" => Ok(Self::Solana),
            "email" => Ok(Self::Email),
            _ => Err(InputError::UnknownKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A web2 handle or a web3 public key / address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub enum Identity {
    #[codec(index = 0)]
    Twitter(IdentityString),
    #[codec(index = 1)]
    Discord(IdentityString),
    #[codec(index = 2)]
    Github(IdentityString),
    #[codec(index = 3)]
    Substrate([u8; ADDRESS32_LENGTH]),
    #[codec(index = 4)]
    Evm([u8; ADDRESS20_LENGTH]),
    /// Compressed secp256k1 public key. Bitcoin addresses are derived from
    /// it one-way, so the key itself is the handle.
    #[codec(index = 5)]
    Bitcoin([u8; ADDRESS33_LENGTH]),
    #[codec(index = 6)]
    Solana([u8; ADDRESS32_LENGTH]),
    #[codec(index = 7)]
    Email(IdentityString),
}

impl Identity {
    pub fn kind(&self) -> IdentityKind {
        match self {
            Self::Twitter(_) => IdentityKind::Twitter,
            Self::Discord(_) => IdentityKind::Discord,
            Self::Github(_) => IdentityKind::Github,
            Self::Substrate(_) => IdentityKind::Substrate,
            Self::Evm(_) => IdentityKind::Evm,
            Self::Bitcoin(_) => IdentityKind::Bitcoin,
            Self::Solana(_) => IdentityKind::Solana,
            Self::Email(_) => IdentityKind::Email,
        }
    }

    pub fn is_web2(&self) -> bool {
        self.kind().is_web2()
    }

    pub fn is_web3(&self) -> bool {
        !self.is_web2()
    }

    pub fn is_substrate(&self) -> bool {
        matches!(self, Self::Substrate(..))
    }

    pub fn is_evm(&self) -> bool {
        matches!(self, Self::Evm(..))
    }

    pub fn is_bitcoin(&self) -> bool {
        matches!(self, Self::Bitcoin(..))
    }

    pub fn is_solana(&self) -> bool {
        matches!(self, Self::Solana(..))
    }

    /// The full network set for the identity's class; empty for web2.
    pub fn default_web3networks(&self) -> Vec<Web3Network> {
        match self {
            Self::Substrate(_) => all_substrate_web3networks(),
            Self::Evm(_) => all_evm_web3networks(),
            Self::Bitcoin(_) => all_bitcoin_web3networks(),
            Self::Solana(_) => all_solana_web3networks(),
            Self::Twitter(_) | Self::Discord(_) | Self::Github(_) | Self::Email(_) => Vec::new(),
        }
    }

    /// Web3 identities need a non-empty list from their own class.
    /// Web2 identities take no networks at all.
    pub fn matches_web3networks(&self, networks: &[Web3Network]) -> bool {
        let all = |pred: fn(&Web3Network) -> bool| {
            !networks.is_empty() && networks.iter().all(pred)
        };
        match self {
            Self::Substrate(_) => all(Web3Network::is_substrate),
            Self::Evm(_) => all(Web3Network::is_evm),
            Self::Bitcoin(_) => all(Web3Network::is_bitcoin),
            Self::Solana(_) => all(Web3Network::is_solana),
            Self::Twitter(_) | Self::Discord(_) | Self::Github(_) | Self::Email(_) => {
                networks.is_empty()
            }
        }
    }

    /// blake2-256 over the encoded identity.
    pub fn hash(&self) -> H256 {
        self.using_encoded(blake2_256)
    }

    pub fn from_email(email: &str) -> Result<Self, InputError> {
        Ok(Self::Email(IdentityString::new(email.as_bytes().to_vec())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_indices() {
        let handle = IdentityString::new(b"alice".to_vec()).unwrap();
        assert_eq!(Identity::Twitter(handle.clone()).encode()[0], 0);
        assert_eq!(Identity::Discord(handle.clone()).encode()[0], 1);
        assert_eq!(Identity::Github(handle.clone()).encode()[0], 2);
        assert_eq!(Identity::Substrate([0; 32]).encode()[0], 3);
        assert_eq!(Identity::Evm([0; 20]).encode()[0], 4);
        assert_eq!(Identity::Bitcoin([0; 33]).encode()[0], 5);
        assert_eq!(Identity::Solana([0; 32]).encode()[0], 6);
        assert_eq!(Identity::Email(handle).encode()[0], 7);
    }

    #[test]
    fn test_fixed_width_keys_have_no_length_prefix() {
        assert_eq!(Identity::Substrate([1; 32]).encode().len(), 33);
        assert_eq!(Identity::Evm([1; 20]).encode().len(), 21);
        assert_eq!(Identity::Bitcoin([1; 33]).encode().len(), 34);
    }

    #[test]
    fn test_web2_handle_is_length_prefixed() {
        let id = Identity::Twitter(IdentityString::new(b"bob".to_vec()).unwrap());
        assert_eq!(id.encode(), vec![0x00, 0x0c, b'b', b'o', b'b']);
    }

    #[test]
    fn test_handle_bound() {
        assert!(IdentityString::new(vec![b'a'; 64]).is_ok());
        assert!(IdentityString::new(vec![b'a'; 65]).is_err());

        let oversized = vec![b'a'; 65].encode();
        assert!(IdentityString::decode(&mut &oversized[..]).is_err());
    }

    #[test]
    fn test_network_indices_and_classes() {
        for (i, n) in Web3Network::ALL.iter().enumerate() {
            assert_eq!(n.code() as usize, i);
            let classes = [n.is_substrate(), n.is_evm(), n.is_bitcoin(), n.is_solana()];
            assert_eq!(classes.iter().filter(|c| **c).count(), 1, "{n} in one class");
        }
        assert_eq!(all_substrate_web3networks().len(), 7);
        assert_eq!(all_evm_web3networks().len(), 5);
        assert_eq!(all_bitcoin_web3networks().len(), 5);
        assert_eq!(all_solana_web3networks(), vec![Web3Network::Solana]);
    }

    #[test]
    fn test_network_parse_case_insensitive() {
        assert_eq!("Ethereum".parse::<Web3Network>().unwrap(), Web3Network::Ethereum);
        assert_eq!("BSC".parse::<Web3Network>().unwrap(), Web3Network::Bsc);
        assert_eq!(
            "LitentryRococo".parse::<Web3Network>().unwrap(),
            Web3Network::LitentryRococo
        );
        assert_eq!(
            "bitcoin_p2wpkh".parse::<Web3Network>().unwrap(),
            Web3Network::BitcoinP2wpkh
        );
        assert!("dogechain".parse::<Web3Network>().is_err());
    }

    #[test]
    fn test_matches_web3networks() {
        let sub = Identity::Substrate([0; 32]);
        let evm = Identity::Evm([0; 20]);
        let web2 = Identity::Github(IdentityString::new(b"octo".to_vec()).unwrap());

        assert!(sub.matches_web3networks(&[Web3Network::Polkadot, Web3Network::Litentry]));
        assert!(!sub.matches_web3networks(&[]));
        assert!(!sub.matches_web3networks(&[Web3Network::Polkadot, Web3Network::Ethereum]));
        assert!(evm.matches_web3networks(&evm.default_web3networks()));
        assert!(web2.matches_web3networks(&[]));
        assert!(!web2.matches_web3networks(&[Web3Network::Ethereum]));
        assert!(web2.default_web3networks().is_empty());
    }

    #[test]
    fn test_identity_hash_covers_encoding() {
        let a = Identity::Evm([1; 20]);
        let b = Identity::Evm([2; 20]);
        assert_eq!(a.hash(), blake2_256(&a.encode()));
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("EVM".parse::<IdentityKind>().unwrap(), IdentityKind::Evm);
        assert!("myspace".parse::<IdentityKind>().is_err());
        assert!(IdentityKind::Email.is_web2());
        assert!(!IdentityKind::Solana.is_web2());
    }
}
