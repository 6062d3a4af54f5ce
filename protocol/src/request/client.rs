//! # Enclave Client
//!
//! Drives one call from parameters to a verified result:
//!
//! 1. **Prepare.** Assemble the call with a fresh shielding key and
//!    correlation id, look up shard and nonce, derive the payload to sign.
//!    The result is a [`PreparedRequest`] the caller can inspect or drop.
//! 2. **Sign.** Outside this crate: a wallet signs
//!    [`PreparedRequest::payload_to_sign`].
//! 3. **Send.** [`PreparedRequest::send`] attaches the signature, seals the
//!    envelope, hands it to the transport and decodes the frames.
//!
//! A [`PreparedRequest`] is consumed by `send`, so its key and nonce are
//! used exactly once.

use std::sync::Arc;

use parity_scale_codec::Encode;
use tracing::{info, warn};

use crate::call::trusted_call::{self, AssembledCall};
use crate::call::{
    decode_signature, Assertion, CallKind, IdentityStatusParams, LinkIdentityCallbackParams,
    LinkIdentityParams, PublicGetter, RequestBatchVcParams, RequestVcParams,
    SetIdentityNetworksParams, TrustedCall, TrustedGetter, TrustedGetterSigned, ValidationData,
};
use crate::config::ClientConfig;
use crate::crypto::{to_prefixed_hex, CryptoContext, OsCrypto, ShieldingKey};
use crate::error::{InputError, Result};
use crate::identity::{IdGraph, Identity, Web3Network};
use crate::payload::{getter_payload_to_sign, payload_to_sign, PayloadToSign};
use crate::request::envelope::{generate_tx_hash, RequestEnvelope};
use crate::request::lifecycle::{RequestLifecycle, RequestState};
use crate::request::rpc::JsonRpcRequest;
use crate::request::transport::{execute_getter, EnclaveTransport};
use crate::response::{
    decode_id_graph, decode_id_graph_hash, decode_mutation_result, decode_vc_results, final_frame,
    MutationOutcome, VcOutcome,
};
use crate::{Index, ShardId, H256};

/// Result of a submitted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Link, set networks, activate, deactivate.
    Mutation(MutationOutcome),
    /// One entry per requested assertion, ordered by index.
    Credentials(Vec<VcOutcome>),
}

impl CallOutcome {
    pub fn into_mutation(self) -> Option<MutationOutcome> {
        match self {
            Self::Mutation(outcome) => Some(outcome),
            Self::Credentials(_) => None,
        }
    }

    pub fn into_credentials(self) -> Option<Vec<VcOutcome>> {
        match self {
            Self::Credentials(outcomes) => Some(outcomes),
            Self::Mutation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PreparedRequest
// ---------------------------------------------------------------------------

/// An assembled call waiting for its signature.
pub struct PreparedRequest {
    call: TrustedCall,
    key: ShieldingKey,
    shard: ShardId,
    nonce: Index,
    tx_hash: H256,
    payload: PayloadToSign,
    rpc_id: u32,
    known_graph: Option<IdGraph>,
    ctx: Arc<dyn CryptoContext>,
    lifecycle: RequestLifecycle,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("kind", &self.call.kind())
            .field("shard", &to_prefixed_hex(&self.shard))
            .field("nonce", &self.nonce)
            .field("tx_hash", &self.tx_hash())
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}

impl PreparedRequest {
    fn new(
        assembled: AssembledCall,
        shard: ShardId,
        nonce: Index,
        rpc_id: u32,
        ctx: Arc<dyn CryptoContext>,
    ) -> Self {
        let AssembledCall { call, key } = assembled;
        let tx_hash = *call.hash();
        let payload = payload_to_sign(&call, nonce, &shard);
        Self {
            lifecycle: RequestLifecycle::new(to_prefixed_hex(&tx_hash)),
            call,
            key,
            shard,
            nonce,
            tx_hash,
            payload,
            rpc_id,
            known_graph: None,
            ctx,
        }
    }

    /// What the wallet must sign.
    pub fn payload_to_sign(&self) -> &PayloadToSign {
        &self.payload
    }

    /// Correlation id as `0x` hex.
    pub fn tx_hash(&self) -> String {
        to_prefixed_hex(&self.tx_hash)
    }

    pub fn call(&self) -> &TrustedCall {
        &self.call
    }

    pub fn kind(&self) -> CallKind {
        self.call.kind()
    }

    pub fn nonce(&self) -> Index {
        self.nonce
    }

    pub fn shard(&self) -> &ShardId {
        &self.shard
    }

    pub fn state(&self) -> RequestState {
        self.lifecycle.state()
    }

    /// Verify the result hash against `graph` merged with the shipped
    /// entries, for enclaves that only ship what changed.
    pub fn with_known_graph(mut self, graph: IdGraph) -> Self {
        self.known_graph = Some(graph);
        self
    }

    /// Attach `signature`, submit, and decode the result.
    ///
    /// `signature` is the wallet's output as text: hex for most wallets,
    /// base64 for Bitcoin, base58 for Solana.
    pub async fn send<T: EnclaveTransport + ?Sized>(
        mut self,
        transport: &T,
        signature: &str,
    ) -> Result<CallOutcome> {
        let signature = decode_signature(self.call.signer(), signature)?;
        self.lifecycle.advance(RequestState::Signed)?;

        let envelope = RequestEnvelope::new(self.shard, self.call.clone(), self.nonce, signature);
        let wrapped_key = transport.wrap_request_key(&self.key.export()).await?;
        let sealed = envelope.seal(self.ctx.as_ref(), &self.key, wrapped_key)?;
        let request = JsonRpcRequest::new(self.rpc_id, envelope.method(), &sealed.encode());
        self.lifecycle.advance(RequestState::Enveloped)?;

        info!(
            tx_hash = %self.lifecycle.tx_hash(),
            kind = %self.call.kind(),
            method = %request.method,
            nonce = self.nonce,
            "submitting trusted call"
        );
        self.lifecycle.advance(RequestState::Sent)?;

        match self.receive(transport, request).await {
            Ok(outcome) => {
                info!(
                    tx_hash = %self.lifecycle.tx_hash(),
                    elapsed_ms = self.lifecycle.elapsed_ms(),
                    "trusted call verified"
                );
                Ok(outcome)
            }
            Err(err) => {
                let state = self.lifecycle.fail(&err);
                warn!(tx_hash = %self.lifecycle.tx_hash(), %state, error = %err, "trusted call failed");
                Err(err)
            }
        }
    }

    async fn receive<T: EnclaveTransport + ?Sized>(
        &mut self,
        transport: &T,
        request: JsonRpcRequest,
    ) -> Result<CallOutcome> {
        let frames = transport.send(request).await?;
        self.lifecycle.advance(RequestState::ResponseReceived)?;

        let outcome = if self.call.kind().mutates_id_graph() {
            let frame = final_frame(&frames)?;
            CallOutcome::Mutation(decode_mutation_result(frame, &self.key, self.known_graph.as_ref())?)
        } else {
            CallOutcome::Credentials(decode_vc_results(&frames, &self.key)?)
        };
        self.lifecycle.advance(RequestState::Decrypted)?;
        self.lifecycle.advance(RequestState::Verified)?;
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// EnclaveClient
// ---------------------------------------------------------------------------

pub struct EnclaveClient<T> {
    transport: T,
    config: ClientConfig,
    ctx: Arc<dyn CryptoContext>,
}

impl<T: EnclaveTransport> EnclaveClient<T> {
    /// Client drawing randomness from the operating system.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_crypto(transport, config, Arc::new(OsCrypto))
    }

    pub fn with_crypto(transport: T, config: ClientConfig, ctx: Arc<dyn CryptoContext>) -> Self {
        Self {
            transport,
            config,
            ctx,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -- getters ------------------------------------------------------------

    pub async fn nonce(&self, who: &Identity) -> Result<Index> {
        self.transport.get_nonce(who, self.config.nonce_decode_mode).await
    }

    /// Current ID graph hash of `who`. `None` when the enclave has none or
    /// its answer does not decode.
    pub async fn id_graph_hash(&self, who: &Identity) -> Result<Option<H256>> {
        let shard = self.transport.get_shard().await?;
        let frame = execute_getter(
            &self.transport,
            self.config.rpc_id,
            shard,
            PublicGetter::id_graph_hash(who.clone()).into(),
        )
        .await?;
        Ok(decode_id_graph_hash(&frame))
    }

    /// What `who` must sign to read its own graph.
    pub fn id_graph_payload(&self, who: &Identity) -> PayloadToSign {
        getter_payload_to_sign(&TrustedGetter::id_graph(who.clone()))
    }

    /// Read `who`'s graph with a signature over [`Self::id_graph_payload`].
    pub async fn id_graph(&self, who: &Identity, signature: &str) -> Result<IdGraph> {
        let signed = TrustedGetterSigned {
            getter: TrustedGetter::id_graph(who.clone()),
            signature: decode_signature(who, signature)?,
        };
        let shard = self.transport.get_shard().await?;
        let frame = execute_getter(&self.transport, self.config.rpc_id, shard, signed.into()).await?;
        decode_id_graph(&frame)
    }

    // -- calls --------------------------------------------------------------

    async fn prepare(&self, assembled: AssembledCall) -> Result<PreparedRequest> {
        let shard = self.transport.get_shard().await?;
        let nonce = self
            .transport
            .get_nonce(assembled.call.signer(), self.config.nonce_decode_mode)
            .await?;
        Ok(PreparedRequest::new(
            assembled,
            shard,
            nonce,
            self.config.rpc_id,
            Arc::clone(&self.ctx),
        ))
    }

    fn tx_hash(&self) -> H256 {
        generate_tx_hash(self.ctx.as_ref())
    }

    /// Link `identity` to `who`'s graph. Without explicit networks the
    /// identity's defaults are used if the config allows it.
    pub async fn link_identity(
        &self,
        who: &Identity,
        identity: Identity,
        validation: ValidationData,
        networks: Option<Vec<Web3Network>>,
    ) -> Result<PreparedRequest> {
        let networks = match networks {
            Some(networks) => networks,
            None if self.config.default_networks_on_link => identity.default_web3networks(),
            None => return Err(InputError::MissingField("networks").into()),
        };
        let assembled = trusted_call::link_identity(
            self.ctx.as_ref(),
            LinkIdentityParams {
                who: who.clone(),
                identity,
                validation,
                networks,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    pub async fn deactivate_identity(&self, who: &Identity, identity: Identity) -> Result<PreparedRequest> {
        let assembled = trusted_call::deactivate_identity(
            self.ctx.as_ref(),
            IdentityStatusParams {
                who: who.clone(),
                identity,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    pub async fn activate_identity(&self, who: &Identity, identity: Identity) -> Result<PreparedRequest> {
        let assembled = trusted_call::activate_identity(
            self.ctx.as_ref(),
            IdentityStatusParams {
                who: who.clone(),
                identity,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    pub async fn set_identity_networks(
        &self,
        who: &Identity,
        identity: Identity,
        networks: Vec<Web3Network>,
    ) -> Result<PreparedRequest> {
        let assembled = trusted_call::set_identity_networks(
            self.ctx.as_ref(),
            SetIdentityNetworksParams {
                who: who.clone(),
                identity,
                networks,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    pub async fn request_vc(&self, who: &Identity, assertion: Assertion) -> Result<PreparedRequest> {
        let assembled = trusted_call::request_vc(
            self.ctx.as_ref(),
            RequestVcParams {
                who: who.clone(),
                assertion,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    /// Request several credentials in one call. `signer` may differ from
    /// `who` for delegated requests.
    pub async fn request_batch_vc(
        &self,
        signer: &Identity,
        who: &Identity,
        assertions: Vec<Assertion>,
    ) -> Result<PreparedRequest> {
        let assembled = trusted_call::request_batch_vc(
            self.ctx.as_ref(),
            RequestBatchVcParams {
                signer: signer.clone(),
                who: who.clone(),
                assertions,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    pub async fn link_identity_callback(
        &self,
        signer: &Identity,
        who: &Identity,
        identity: Identity,
        networks: Vec<Web3Network>,
    ) -> Result<PreparedRequest> {
        let assembled = trusted_call::link_identity_callback(
            self.ctx.as_ref(),
            LinkIdentityCallbackParams {
                signer: signer.clone(),
                who: who.clone(),
                identity,
                networks,
                hash: self.tx_hash(),
            },
        )?;
        self.prepare(assembled).await
    }

    /// Submit a prepared request through this client's transport.
    pub async fn send(&self, prepared: PreparedRequest, signature: &str) -> Result<CallOutcome> {
        prepared.send(&self.transport, signature).await
    }
}
