//! Credential assertions a VC request can ask for.
//!
//! Only the assertions this client knows how to request are modelled. The
//! indices are the enclave's and are not contiguous.

use std::fmt;
use std::str::FromStr;

use parity_scale_codec::{Decode, Encode};

use crate::codec::BoundedVec;
use crate::error::InputError;
use crate::identity::Web3Network;

/// Free-form assertion parameter, at most 64 bytes.
pub type ParameterString = BoundedVec<u8, 64>;

/// Network list attached to an assertion, at most 64 entries.
pub type AssertionNetworks = BoundedVec<Web3Network, 64>;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Assertion {
    /// Has a web2 and a web3 identity linked.
    #[codec(index = 0)]
    A1,
    /// Discord guild member. `(guild_id)`
    #[codec(index = 1)]
    A2(ParameterString),
    /// Discord role holder. `(guild_id, channel_id, role_id)`
    #[codec(index = 2)]
    A3(ParameterString, ParameterString, ParameterString),
    /// LIT holder. `(minimum_amount)`
    #[codec(index = 3)]
    A4(ParameterString),
    #[codec(index = 4)]
    A6,
    /// DOT holder. `(minimum_amount)`
    #[codec(index = 5)]
    A7(ParameterString),
    /// Transaction count on the given networks.
    #[codec(index = 6)]
    A8(AssertionNetworks),
    /// WBTC holder. `(minimum_amount)`
    #[codec(index = 7)]
    A10(ParameterString),
    /// ETH holder. `(minimum_amount)`
    #[codec(index = 8)]
    A11(ParameterString),
    /// Delegated request for a participant account.
    #[codec(index = 9)]
    A13([u8; 32]),
    #[codec(index = 10)]
    A14,
    #[codec(index = 12)]
    A20,
    #[codec(index = 16)]
    BnbDomainHolding,
    #[codec(index = 20)]
    LITStaking,
    #[codec(index = 22)]
    BRC20AmountHolder,
    #[codec(index = 23)]
    CryptoSummary,
}

impl Assertion {
    /// Short name, used in logs and by the CLI parser.
    pub fn name(&self) -> &'static str {
        match self {
            Self::A1 => "a1",
            Self::A2(..) => "a2",
            Self::A3(..) => "a3",
            Self::A4(..) => "a4",
            Self::A6 => "a6",
            Self::A7(..) => "a7",
            Self::A8(..) => "a8",
            Self::A10(..) => "a10",
            Self::A11(..) => "a11",
            Self::A13(..) => "a13",
            Self::A14 => "a14",
            Self::A20 => "a20",
            Self::BnbDomainHolding => "bnb_domain_holding",
            Self::LITStaking => "lit_staking",
            Self::BRC20AmountHolder => "brc20_amount_holder",
            Self::CryptoSummary => "crypto_summary",
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a [`ParameterString`] from text.
pub fn parameter(s: &str) -> Result<ParameterString, InputError> {
    ParameterString::try_new(s.as_bytes().to_vec()).map_err(|v| InputError::InvalidAddress {
        kind: "assertion parameter".into(),
        reason: format!("{} bytes exceeds 64", v.len()),
    })
}

impl FromStr for Assertion {
    type Err = InputError;

    /// Parses `name` or `name:arg1,arg2`. Parameter-less names map to unit
    /// variants; `a8` takes network names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name, args.split(',').map(str::trim).collect::<Vec<_>>()),
            None => (s, Vec::new()),
        };
        let unknown = || InputError::InvalidAddress {
            kind: "assertion".into(),
            reason: format!("cannot parse {s:?}"),
        };
        let one = |args: &[&str]| -> Result<ParameterString, InputError> {
            match args {
                [arg] => parameter(arg),
                _ => Err(unknown()),
            }
        };

        match (name.trim().to_lowercase().as_str(), args.as_slice()) {
            ("a1", []) => Ok(Self::A1),
            ("a2", a) => Ok(Self::A2(one(a)?)),
            ("a3", [g, c, r]) => Ok(Self::A3(parameter(g)?, parameter(c)?, parameter(r)?)),
            ("a4", a) => Ok(Self::A4(one(a)?)),
            ("a6", []) => Ok(Self::A6),
            ("a7", a) => Ok(Self::A7(one(a)?)),
            ("a8", a) if !a.is_empty() => {
                let networks = a
                    .iter()
                    .map(|n| n.parse::<Web3Network>())
                    .collect::<Result<Vec<_>, _>>()?;
                AssertionNetworks::try_new(networks).map(Self::A8).map_err(|_| unknown())
            }
            ("a10", a) => Ok(Self::A10(one(a)?)),
            ("a11", a) => Ok(Self::A11(one(a)?)),
            ("a14", []) => Ok(Self::A14),
            ("a20", []) => Ok(Self::A20),
            ("bnb_domain_holding", []) => Ok(Self::BnbDomainHolding),
            ("lit_staking", []) => Ok(Self::LITStaking),
            ("brc20_amount_holder", []) => Ok(Self::BRC20AmountHolder),
            ("crypto_summary", []) => Ok(Self::CryptoSummary),
            _ => Err(unknown()),
        }
    }
}
