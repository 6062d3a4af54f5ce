//! Signed calls, getters, and the operation wrapper the enclave accepts.

use parity_scale_codec::{Decode, Encode};

use crate::call::signature::MultiSignature;
use crate::call::trusted_call::TrustedCall;
use crate::crypto::blake2_256;
use crate::identity::Identity;
use crate::{Index, H256};

/// A call plus the nonce it was signed under and the wallet's signature.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TrustedCallSigned {
    pub call: TrustedCall,
    pub index: Index,
    pub signature: MultiSignature,
}

/// Read-only queries that need a signature.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum TrustedGetter {
    #[codec(index = 5)]
    id_graph(Identity),
}

impl TrustedGetter {
    pub fn sender(&self) -> &Identity {
        match self {
            Self::id_graph(who) => who,
        }
    }

    /// Digest the sender signs: `blake2_256(getter)`.
    pub fn signing_digest(&self) -> H256 {
        self.using_encoded(blake2_256)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TrustedGetterSigned {
    pub getter: TrustedGetter,
    pub signature: MultiSignature,
}

/// Queries anyone may run.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum PublicGetter {
    #[codec(index = 0)]
    some_value(u32),
    #[codec(index = 1)]
    nonce(Identity),
    #[codec(index = 2)]
    id_graph_hash(Identity),
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Getter {
    #[codec(index = 0)]
    public(PublicGetter),
    #[codec(index = 1)]
    trusted(TrustedGetterSigned),
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum TrustedOperation {
    #[codec(index = 0)]
    indirect_call(TrustedCallSigned),
    #[codec(index = 1)]
    direct_call(TrustedCallSigned),
    #[codec(index = 2)]
    get(Getter),
}

impl From<PublicGetter> for TrustedOperation {
    fn from(getter: PublicGetter) -> Self {
        TrustedOperation::get(Getter::public(getter))
    }
}

impl From<TrustedGetterSigned> for TrustedOperation {
    fn from(getter: TrustedGetterSigned) -> Self {
        TrustedOperation::get(Getter::trusted(getter))
    }
}

impl TrustedOperation {
    /// Submitted calls always go direct; indirect calls arrive via the chain.
    pub fn direct(call: TrustedCallSigned) -> Self {
        TrustedOperation::direct_call(call)
    }

    pub fn is_getter(&self) -> bool {
        matches!(self, TrustedOperation::get(_))
    }
}
