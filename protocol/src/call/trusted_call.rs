//! # Trusted Call Assembly
//!
//! A [`TrustedCall`] is the confidential instruction the enclave executes.
//! Every variant is a positional tuple whose order and arity are a wire
//! contract. Where a slot holds the same identity twice (`who, who`) the
//! first copy is the *signer* and the second the *subject*; the enclave
//! allows them to differ for delegated calls, so both are always present.
//!
//! Each operation has its own parameter record and constructor. The
//! constructors validate their input, generate a fresh [`ShieldingKey`], and
//! embed the raw key bytes in the call. Nothing here signs: the signing
//! payload is derived in [`crate::payload`] and the signature is attached by
//! the request layer.

use parity_scale_codec::{Decode, Encode};
use tracing::debug;

use crate::call::assertion::Assertion;
use crate::call::validation::ValidationData;
use crate::codec::BoundedVec;
use crate::config::MAX_BATCH_ASSERTIONS;
use crate::crypto::{blake2_256_concat, CryptoContext, RequestAesKey, ShieldingKey};
use crate::error::InputError;
use crate::identity::{Identity, Web3Network};
use crate::{Index, ShardId, H256};

/// Assertions carried by one batch VC request.
pub type BatchAssertions = BoundedVec<Assertion, MAX_BATCH_ASSERTIONS>;

// ---------------------------------------------------------------------------
// TrustedCall
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum TrustedCall {
    /// `(signer, who, identity, validation, networks, key, hash)`
    #[codec(index = 0)]
    LinkIdentity(
        Identity,
        Identity,
        Identity,
        ValidationData,
        Vec<Web3Network>,
        Option<RequestAesKey>,
        H256,
    ),
    /// `(signer, who, identity, key, hash)`
    #[codec(index = 1)]
    DeactivateIdentity(Identity, Identity, Identity, Option<RequestAesKey>, H256),
    /// `(signer, who, identity, key, hash)`
    #[codec(index = 2)]
    ActivateIdentity(Identity, Identity, Identity, Option<RequestAesKey>, H256),
    /// `(signer, who, assertion, key, hash)`
    #[codec(index = 3)]
    RequestVc(Identity, Identity, Assertion, Option<RequestAesKey>, H256),
    /// `(signer, who, identity, networks, key, hash)`
    #[codec(index = 4)]
    SetIdentityNetworks(
        Identity,
        Identity,
        Identity,
        Vec<Web3Network>,
        Option<RequestAesKey>,
        H256,
    ),
    /// `(signer, who, assertions, key, hash)`
    #[codec(index = 6)]
    RequestBatchVc(Identity, Identity, BatchAssertions, Option<RequestAesKey>, H256),
    /// `(signer, who, identity, networks, key, hash)`
    #[codec(index = 20)]
    LinkIdentityCallback(
        Identity,
        Identity,
        Identity,
        Vec<Web3Network>,
        Option<RequestAesKey>,
        H256,
    ),
}

/// Operation kind, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    LinkIdentity,
    DeactivateIdentity,
    ActivateIdentity,
    RequestVc,
    SetIdentityNetworks,
    RequestBatchVc,
    LinkIdentityCallback,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkIdentity => "link_identity",
            Self::DeactivateIdentity => "deactivate_identity",
            Self::ActivateIdentity => "activate_identity",
            Self::RequestVc => "request_vc",
            Self::SetIdentityNetworks => "set_identity_networks",
            Self::RequestBatchVc => "request_batch_vc",
            Self::LinkIdentityCallback => "link_identity_callback",
        }
    }

    /// Calls whose result is an ID graph mutation.
    pub fn mutates_id_graph(&self) -> bool {
        !matches!(self, Self::RequestVc | Self::RequestBatchVc)
    }
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TrustedCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::LinkIdentity(..) => CallKind::LinkIdentity,
            Self::DeactivateIdentity(..) => CallKind::DeactivateIdentity,
            Self::ActivateIdentity(..) => CallKind::ActivateIdentity,
            Self::RequestVc(..) => CallKind::RequestVc,
            Self::SetIdentityNetworks(..) => CallKind::SetIdentityNetworks,
            Self::RequestBatchVc(..) => CallKind::RequestBatchVc,
            Self::LinkIdentityCallback(..) => CallKind::LinkIdentityCallback,
        }
    }

    /// The identity that signs this call.
    pub fn signer(&self) -> &Identity {
        match self {
            Self::LinkIdentity(signer, ..)
            | Self::DeactivateIdentity(signer, ..)
            | Self::ActivateIdentity(signer, ..)
            | Self::RequestVc(signer, ..)
            | Self::SetIdentityNetworks(signer, ..)
            | Self::RequestBatchVc(signer, ..)
            | Self::LinkIdentityCallback(signer, ..) => signer,
        }
    }

    /// The identity whose graph the call acts on.
    pub fn who(&self) -> &Identity {
        match self {
            Self::LinkIdentity(_, who, ..)
            | Self::DeactivateIdentity(_, who, ..)
            | Self::ActivateIdentity(_, who, ..)
            | Self::RequestVc(_, who, ..)
            | Self::SetIdentityNetworks(_, who, ..)
            | Self::RequestBatchVc(_, who, ..)
            | Self::LinkIdentityCallback(_, who, ..) => who,
        }
    }

    /// The embedded shielding key bytes.
    pub fn request_key(&self) -> Option<&RequestAesKey> {
        match self {
            Self::LinkIdentity(.., key, _)
            | Self::DeactivateIdentity(.., key, _)
            | Self::ActivateIdentity(.., key, _)
            | Self::RequestVc(.., key, _)
            | Self::SetIdentityNetworks(.., key, _)
            | Self::RequestBatchVc(.., key, _)
            | Self::LinkIdentityCallback(.., key, _) => key.as_ref(),
        }
    }

    /// The correlation hash in the last slot.
    pub fn hash(&self) -> &H256 {
        match self {
            Self::LinkIdentity(.., hash)
            | Self::DeactivateIdentity(.., hash)
            | Self::ActivateIdentity(.., hash)
            | Self::RequestVc(.., hash)
            | Self::SetIdentityNetworks(.., hash)
            | Self::RequestBatchVc(.., hash)
            | Self::LinkIdentityCallback(.., hash) => hash,
        }
    }

    /// Number of credentials a VC call asks for. Zero for other calls.
    pub fn credential_count(&self) -> usize {
        match self {
            Self::RequestVc(..) => 1,
            Self::RequestBatchVc(_, _, assertions, ..) => assertions.len(),
            _ => 0,
        }
    }

    /// Digest the signer signs:
    /// `blake2_256(call ‖ nonce ‖ shard ‖ shard)`.
    ///
    /// The shard appears twice. The enclave re-derives the payload with its
    /// own measurement in the first position, and on this deployment the
    /// measurement and the shard are the same 32 bytes.
    pub fn signing_digest(&self, nonce: Index, shard: &ShardId) -> H256 {
        let call = self.encode();
        let nonce = nonce.encode();
        blake2_256_concat(&[&call, &nonce, shard, shard])
    }
}

// ---------------------------------------------------------------------------
// Parameter records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LinkIdentityParams {
    pub who: Identity,
    pub identity: Identity,
    pub validation: ValidationData,
    pub networks: Vec<Web3Network>,
    pub hash: H256,
}

/// Shared by `activate_identity` and `deactivate_identity`.
#[derive(Debug, Clone)]
pub struct IdentityStatusParams {
    pub who: Identity,
    pub identity: Identity,
    pub hash: H256,
}

#[derive(Debug, Clone)]
pub struct SetIdentityNetworksParams {
    pub who: Identity,
    pub identity: Identity,
    pub networks: Vec<Web3Network>,
    pub hash: H256,
}

#[derive(Debug, Clone)]
pub struct RequestVcParams {
    pub who: Identity,
    pub assertion: Assertion,
    pub hash: H256,
}

#[derive(Debug, Clone)]
pub struct RequestBatchVcParams {
    pub signer: Identity,
    pub who: Identity,
    pub assertions: Vec<Assertion>,
    pub hash: H256,
}

#[derive(Debug, Clone)]
pub struct LinkIdentityCallbackParams {
    pub signer: Identity,
    pub who: Identity,
    pub identity: Identity,
    pub networks: Vec<Web3Network>,
    pub hash: H256,
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// A call together with the key embedded in it. The key is needed again to
/// seal the request and to open the enclave's reply.
#[derive(Debug)]
pub struct AssembledCall {
    pub call: TrustedCall,
    pub key: ShieldingKey,
}

fn check_networks(identity: &Identity, networks: &[Web3Network]) -> Result<(), InputError> {
    if identity.matches_web3networks(networks) {
        return Ok(());
    }
    Err(InputError::NetworkMismatch {
        kind: identity.kind().to_string(),
        networks: networks.iter().map(|n| n.to_string()).collect(),
    })
}

fn assembled(call: TrustedCall, key: ShieldingKey) -> AssembledCall {
    debug!(kind = %call.kind(), "assembled trusted call");
    AssembledCall { call, key }
}

pub fn link_identity(
    ctx: &dyn CryptoContext,
    params: LinkIdentityParams,
) -> Result<AssembledCall, InputError> {
    check_networks(&params.identity, &params.networks)?;
    if !params.validation.matches(&params.identity) {
        return Err(InputError::InvalidAddress {
            kind: params.identity.kind().to_string(),
            reason: format!(
                "validation data is for a {} identity",
                params.validation.identity_kind()
            ),
        });
    }
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::LinkIdentity(
        params.who.clone(),
        params.who,
        params.identity,
        params.validation,
        params.networks,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}

pub fn deactivate_identity(
    ctx: &dyn CryptoContext,
    params: IdentityStatusParams,
) -> Result<AssembledCall, InputError> {
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::DeactivateIdentity(
        params.who.clone(),
        params.who,
        params.identity,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}

pub fn activate_identity(
    ctx: &dyn CryptoContext,
    params: IdentityStatusParams,
) -> Result<AssembledCall, InputError> {
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::ActivateIdentity(
        params.who.clone(),
        params.who,
        params.identity,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}

pub fn set_identity_networks(
    ctx: &dyn CryptoContext,
    params: SetIdentityNetworksParams,
) -> Result<AssembledCall, InputError> {
    check_networks(&params.identity, &params.networks)?;
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::SetIdentityNetworks(
        params.who.clone(),
        params.who,
        params.identity,
        params.networks,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}

pub fn request_vc(
    ctx: &dyn CryptoContext,
    params: RequestVcParams,
) -> Result<AssembledCall, InputError> {
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::RequestVc(
        params.who.clone(),
        params.who,
        params.assertion,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}

pub fn request_batch_vc(
    ctx: &dyn CryptoContext,
    params: RequestBatchVcParams,
) -> Result<AssembledCall, InputError> {
    let count = params.assertions.len();
    if count == 0 {
        return Err(InputError::InvalidAssertionCount(0));
    }
    let assertions =
        BatchAssertions::try_new(params.assertions).map_err(|_| InputError::InvalidAssertionCount(count))?;
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::RequestBatchVc(
        params.signer,
        params.who,
        assertions,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}

pub fn link_identity_callback(
    ctx: &dyn CryptoContext,
    params: LinkIdentityCallbackParams,
) -> Result<AssembledCall, InputError> {
    check_networks(&params.identity, &params.networks)?;
    let key = ShieldingKey::generate(ctx);
    let call = TrustedCall::LinkIdentityCallback(
        params.signer,
        params.who,
        params.identity,
        params.networks,
        Some(key.export()),
        params.hash,
    );
    Ok(assembled(call, key))
}
