//! # In-Memory Enclave
//!
//! A [`EnclaveTransport`] that plays the enclave's part: it unwraps request
//! keys, opens sealed calls, checks nonces, applies calls to in-memory ID
//! graphs, and seals results back under the caller's key. Signatures are
//! not verified.
//!
//! Knobs for exercising failure paths: [`MockEnclave::fail_next`],
//! [`MockEnclave::corrupt_next_hash`] and [`MockEnclave::ship_deltas`].

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use parity_scale_codec::Encode;
use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use crate::call::{
    Assertion, Getter, PublicGetter, TrustedCall, TrustedCallSigned, TrustedGetter, TrustedOperation,
};
use crate::codec::decode_exact;
use crate::crypto::{blake2_256, to_prefixed_hex, AesOutput, CryptoContext, OsCrypto, RequestAesKey, ShieldingKey};
use crate::error::{Result, TransportError};
use crate::identity::{IdGraph, Identity, IdentityContext, IdentityStatus, Web3Network};
use crate::request::envelope::{AesRequest, Request};
use crate::request::rpc::{collect_frames, JsonRpcRequest, JsonRpcResponse, RpcError, RpcMethod};
use crate::request::transport::EnclaveTransport;
use crate::response::{
    DirectRequestStatus, ErrorDetail, MutationResult, RequestVcErrorDetail, RequestVcResult,
    RequestVcResultOrError, StfError, TrustedOperationStatus, WorkerRpcReturnValue,
};
use crate::{Index, ShardId, H256};

const KEY_WRAP_AAD: &[u8] = b"request-key";

#[derive(Default)]
struct MockState {
    graphs: HashMap<Identity, IdGraph>,
    nonces: HashMap<Identity, Index>,
    block: u32,
    ship_deltas: bool,
    corrupt_next_hash: bool,
    fail_next: Option<TransportError>,
    last_request: Option<JsonRpcRequest>,
}

fn stf_detail(reason: &str) -> ErrorDetail {
    ErrorDetail::StfError(reason.as_bytes().to_vec())
}

impl MockState {
    fn nonce(&self, who: &Identity) -> Index {
        self.nonces.get(who).copied().unwrap_or_default()
    }

    fn next_block(&mut self) -> u32 {
        self.block += 1;
        self.block
    }

    /// Apply a mutating call and return the entries it changed.
    fn apply(&mut self, call: &TrustedCall) -> Result<IdGraph, StfError> {
        match call {
            TrustedCall::LinkIdentity(_, who, identity, _, networks, ..)
            | TrustedCall::LinkIdentityCallback(_, who, identity, networks, ..) => {
                self.link(who, identity, networks)
            }
            TrustedCall::DeactivateIdentity(_, who, identity, ..) => self
                .update(who, identity, |ctx| ctx.status = IdentityStatus::Inactive)
                .map_err(StfError::DeactivateIdentityFailed),
            TrustedCall::ActivateIdentity(_, who, identity, ..) => self
                .update(who, identity, |ctx| ctx.status = IdentityStatus::Active)
                .map_err(StfError::ActivateIdentityFailed),
            TrustedCall::SetIdentityNetworks(_, who, identity, networks, ..) => {
                if !identity.matches_web3networks(networks) {
                    return Err(StfError::SetIdentityNetworksFailed(stf_detail("WrongWeb3NetworkTypes")));
                }
                let networks = networks.clone();
                self.update(who, identity, move |ctx| ctx.web3networks = networks)
                    .map_err(StfError::SetIdentityNetworksFailed)
            }
            TrustedCall::RequestVc(..) | TrustedCall::RequestBatchVc(..) => {
                Err(StfError::Dispatch("vc requests go through author_requestVc".into()))
            }
        }
    }

    fn link(&mut self, who: &Identity, identity: &Identity, networks: &[Web3Network]) -> Result<IdGraph, StfError> {
        if who == identity {
            return Err(StfError::LinkIdentityFailed(stf_detail("LinkPrimeIdentityDisallowed")));
        }
        if self.graphs.get(who).is_some_and(|g| g.contains(identity)) {
            return Err(StfError::LinkIdentityFailed(stf_detail("IdentityAlreadyLinked")));
        }

        let block = self.next_block();
        let graph = self.graphs.entry(who.clone()).or_default();
        let mut changed = IdGraph::new();
        if graph.is_empty() {
            let prime = IdentityContext::new(block, who.default_web3networks());
            graph.upsert(who.clone(), prime.clone());
            changed.upsert(who.clone(), prime);
        }
        let linked = IdentityContext::new(block, networks.to_vec());
        graph.upsert(identity.clone(), linked.clone());
        changed.upsert(identity.clone(), linked);
        Ok(changed)
    }

    fn update(
        &mut self,
        who: &Identity,
        identity: &Identity,
        change: impl FnOnce(&mut IdentityContext),
    ) -> Result<IdGraph, ErrorDetail> {
        if who == identity {
            return Err(stf_detail("PrimeIdentityImmutable"));
        }
        let context = self
            .graphs
            .get_mut(who)
            .and_then(|g| g.get_mut(identity))
            .ok_or_else(|| stf_detail("IdentityNotExist"))?;
        change(context);
        let updated = context.clone();
        Ok([(identity.clone(), updated)].into_iter().collect())
    }
}

/// Enclave double backed by in-memory state.
pub struct MockEnclave {
    shard: ShardId,
    enclave_key: ShieldingKey,
    ctx: Arc<dyn CryptoContext>,
    state: Mutex<MockState>,
}

impl std::fmt::Debug for MockEnclave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEnclave")
            .field("shard", &to_prefixed_hex(&self.shard))
            .finish_non_exhaustive()
    }
}

fn error_frame(msg: impl Display) -> WorkerRpcReturnValue {
    WorkerRpcReturnValue::error(msg.to_string().encode())
}

fn status_frame(value: Vec<u8>, do_watch: bool, status: TrustedOperationStatus, top_hash: H256) -> WorkerRpcReturnValue {
    WorkerRpcReturnValue {
        value,
        do_watch,
        status: DirectRequestStatus::TrustedOperationStatus(status, top_hash),
    }
}

impl MockEnclave {
    pub fn new(shard: ShardId) -> Self {
        Self::with_crypto(shard, Arc::new(OsCrypto))
    }

    pub fn with_crypto(shard: ShardId, ctx: Arc<dyn CryptoContext>) -> Self {
        Self {
            shard,
            enclave_key: ShieldingKey::generate(ctx.as_ref()),
            ctx,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Ship only the changed entries instead of the whole graph.
    pub fn ship_deltas(&self, enabled: bool) {
        self.state.lock().ship_deltas = enabled;
    }

    /// Flip a bit in the next shipped graph hash.
    pub fn corrupt_next_hash(&self) {
        self.state.lock().corrupt_next_hash = true;
    }

    /// Fail the next `send` with `err` before it reaches the enclave.
    pub fn fail_next(&self, err: TransportError) {
        self.state.lock().fail_next = Some(err);
    }

    pub fn id_graph(&self, who: &Identity) -> IdGraph {
        self.state.lock().graphs.get(who).cloned().unwrap_or_default()
    }

    pub fn nonce_of(&self, who: &Identity) -> Index {
        self.state.lock().nonce(who)
    }

    pub fn last_request(&self) -> Option<JsonRpcRequest> {
        self.state.lock().last_request.clone()
    }

    fn handle(&self, request: &JsonRpcRequest) -> Vec<JsonRpcResponse> {
        let id = request.id;
        let payload = match request.payload() {
            Ok(payload) => payload,
            Err(err) => return vec![JsonRpcResponse::error(id, RpcError::invalid_params(err.to_string()))],
        };
        let frames = match request.method {
            RpcMethod::ExecuteGetter => vec![self.execute_getter(&payload)],
            RpcMethod::SubmitAndWatch => self.submit(&payload),
            RpcMethod::RequestVc => self.request_vc(&payload),
        };
        frames.iter().map(|frame| JsonRpcResponse::success(id, frame)).collect()
    }

    fn execute_getter(&self, payload: &[u8]) -> WorkerRpcReturnValue {
        let request: Request = match decode_exact(payload, "Request") {
            Ok(request) => request,
            Err(err) => return error_frame(err),
        };
        if request.shard != self.shard {
            return error_frame("unknown shard");
        }
        let operation: TrustedOperation = match decode_exact(&request.payload, "TrustedOperation") {
            Ok(op) => op,
            Err(err) => return error_frame(err),
        };

        let state = self.state.lock();
        let value: Option<Vec<u8>> = match operation {
            TrustedOperation::get(Getter::public(PublicGetter::some_value(v))) => Some(v.encode()),
            TrustedOperation::get(Getter::public(PublicGetter::nonce(who))) => Some(state.nonce(&who).encode()),
            TrustedOperation::get(Getter::public(PublicGetter::id_graph_hash(who))) => {
                state.graphs.get(&who).map(|g| g.hash().encode())
            }
            TrustedOperation::get(Getter::trusted(signed)) => match signed.getter {
                TrustedGetter::id_graph(who) => state.graphs.get(&who).map(|g| g.encode()),
            },
            _ => return error_frame("not a getter"),
        };
        WorkerRpcReturnValue::ok(value.encode())
    }

    /// Unwrap the request key and open the sealed call.
    fn open_request(&self, payload: &[u8]) -> Result<(ShieldingKey, TrustedCallSigned), WorkerRpcReturnValue> {
        let request: AesRequest = decode_exact(payload, "AesRequest").map_err(error_frame)?;
        if request.shard != self.shard {
            return Err(error_frame("unknown shard"));
        }
        let wrapped: AesOutput = decode_exact(&request.key, "AesOutput").map_err(error_frame)?;
        let raw = self.enclave_key.open(&wrapped).map_err(error_frame)?;
        let key_bytes: RequestAesKey = raw
            .try_into()
            .map_err(|_| error_frame("request key has the wrong length"))?;
        let key = ShieldingKey::from_bytes(key_bytes);

        let cleartext = key.open(&request.payload).map_err(error_frame)?;
        let signed = match decode_exact::<TrustedOperation>(&cleartext, "TrustedOperation").map_err(error_frame)? {
            TrustedOperation::direct_call(signed) => signed,
            _ => return Err(error_frame("expected a direct call")),
        };
        if signed.call.request_key() != Some(&key_bytes) {
            return Err(error_frame("request key does not match the call"));
        }
        Ok((key, signed))
    }

    fn submit(&self, payload: &[u8]) -> Vec<WorkerRpcReturnValue> {
        let (key, signed) = match self.open_request(payload) {
            Ok(opened) => opened,
            Err(frame) => return vec![frame],
        };
        let top_hash = blake2_256(&signed.encode());
        let submitted = status_frame(vec![], true, TrustedOperationStatus::Submitted, top_hash);

        let mut state = self.state.lock();
        let signer = signed.call.signer().clone();
        let expected = state.nonce(&signer);
        if signed.index != expected {
            let err = StfError::InvalidNonce(expected, signed.index);
            return vec![submitted, status_frame(err.encode(), false, TrustedOperationStatus::Invalid, top_hash)];
        }

        let changed = match state.apply(&signed.call) {
            Ok(changed) => changed,
            Err(err) => {
                debug!(error = %err, "mock enclave rejected call");
                return vec![submitted, status_frame(err.encode(), false, TrustedOperationStatus::Invalid, top_hash)];
            }
        };
        state.nonces.insert(signer, expected + 1);

        let full = state.graphs.get(signed.call.who()).cloned().unwrap_or_default();
        let shipped = if state.ship_deltas { changed } else { full.clone() };
        let mut id_graph_hash = full.hash();
        if std::mem::take(&mut state.corrupt_next_hash) {
            id_graph_hash[0] ^= 0xff;
        }
        let block_hash = blake2_256(&state.block.encode());
        drop(state);

        let mutated_id_graph = match key.seal(self.ctx.as_ref(), &shipped.encode(), &[]) {
            Ok(sealed) => sealed,
            Err(err) => return vec![submitted, error_frame(err)],
        };
        let result = MutationResult {
            mutated_id_graph,
            id_graph_hash,
        };
        vec![
            submitted,
            status_frame(
                result.encode(),
                false,
                TrustedOperationStatus::InSidechainBlock(block_hash),
                top_hash,
            ),
        ]
    }

    fn request_vc(&self, payload: &[u8]) -> Vec<WorkerRpcReturnValue> {
        let (key, signed) = match self.open_request(payload) {
            Ok(opened) => opened,
            Err(frame) => return vec![frame],
        };
        let (who, assertions): (Identity, Vec<Assertion>) = match &signed.call {
            TrustedCall::RequestVc(_, who, assertion, ..) => (who.clone(), vec![assertion.clone()]),
            TrustedCall::RequestBatchVc(_, who, assertions, ..) => (who.clone(), assertions.as_slice().to_vec()),
            other => {
                return vec![WorkerRpcReturnValue::error(
                    StfError::Dispatch(format!("{} is not a vc request", other.kind())).encode(),
                )]
            }
        };

        let mut state = self.state.lock();
        let signer = signed.call.signer().clone();
        let expected = state.nonce(&signer);
        if signed.index != expected {
            return vec![WorkerRpcReturnValue::error(
                StfError::InvalidNonce(expected, signed.index).encode(),
            )];
        }
        state.nonces.insert(signer, expected + 1);

        // A requester without a graph gets one holding just itself.
        let existing = state.graphs.get(&who).filter(|g| !g.is_empty()).cloned();
        let (pre_graph, created) = match existing {
            Some(graph) => (graph, false),
            None => {
                let block = state.next_block();
                let graph: IdGraph = [(who.clone(), IdentityContext::new(block, who.default_web3networks()))]
                    .into_iter()
                    .collect();
                state.graphs.insert(who.clone(), graph.clone());
                (graph, true)
            }
        };
        drop(state);

        let pre_mutated_id_graph = if created {
            match key.seal(self.ctx.as_ref(), &pre_graph.encode(), &[]) {
                Ok(sealed) => sealed,
                Err(err) => return vec![error_frame(err)],
            }
        } else {
            AesOutput {
                ciphertext: vec![],
                aad: vec![],
                nonce: [0; 12],
            }
        };

        let len = assertions.len() as u8;
        let mut frames = Vec::with_capacity(assertions.len());
        // The mock finishes the last assertion first.
        for (idx, assertion) in assertions.iter().enumerate().rev() {
            let result = if assertions[..idx].contains(assertion) {
                Err(RequestVcErrorDetail::DuplicateAssertionRequest)
            } else {
                let document = json!({
                    "@context": ["https://www.w3.org/2018/credentials/v1"],
                    "type": ["VerifiableCredential"],
                    "issuer": to_prefixed_hex(&self.shard),
                    "credentialSubject": {
                        "id": who.to_did().unwrap_or_default(),
                        "assertion": assertion.to_string(),
                    },
                    "proof": { "requestHash": to_prefixed_hex(signed.call.hash()) },
                });
                match key.seal(self.ctx.as_ref(), document.to_string().as_bytes(), &[]) {
                    Ok(vc_payload) => Ok(RequestVcResult {
                        vc_payload,
                        pre_mutated_id_graph: pre_mutated_id_graph.clone(),
                        pre_id_graph_hash: pre_graph.hash(),
                    }
                    .encode()),
                    Err(err) => Err(RequestVcErrorDetail::UnexpectedCall(err.to_string())),
                }
            };
            let item = RequestVcResultOrError {
                result,
                idx: idx as u8,
                len,
            };
            frames.push(WorkerRpcReturnValue {
                value: item.encode(),
                do_watch: idx != 0,
                status: DirectRequestStatus::Ok,
            });
        }
        frames
    }
}

#[async_trait]
impl EnclaveTransport for MockEnclave {
    async fn get_shard(&self) -> Result<ShardId> {
        Ok(self.shard)
    }

    async fn wrap_request_key(&self, key: &RequestAesKey) -> Result<Vec<u8>> {
        Ok(self.enclave_key.seal(self.ctx.as_ref(), key, KEY_WRAP_AAD)?.encode())
    }

    async fn send(&self, request: JsonRpcRequest) -> Result<Vec<WorkerRpcReturnValue>> {
        let failure = {
            let mut state = self.state.lock();
            state.last_request = Some(request.clone());
            state.fail_next.take()
        };
        if let Some(err) = failure {
            return Err(err.into());
        }
        collect_frames(&request, self.handle(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::trusted_call::{link_identity_callback, LinkIdentityCallbackParams};
    use crate::call::MultiSignature;
    use crate::config::DecodeMode;
    use crate::crypto::SeededCrypto;
    use crate::error::{ClientError, ProtocolError};
    use crate::request::envelope::RequestEnvelope;
    use crate::response::decode_mutation_result;

    fn alice() -> Identity {
        Identity::Substrate([0xa1; 32])
    }

    fn mock() -> MockEnclave {
        MockEnclave::with_crypto([7; 32], Arc::new(SeededCrypto::new(11)))
    }

    async fn submit_callback(enclave: &MockEnclave, ctx: &SeededCrypto, nonce: Index) -> Result<WorkerRpcReturnValue> {
        let assembled = link_identity_callback(
            ctx,
            LinkIdentityCallbackParams {
                signer: alice(),
                who: alice(),
                identity: Identity::Evm([3; 20]),
                networks: vec![Web3Network::Ethereum],
                hash: [1; 32],
            },
        )?;
        let envelope = RequestEnvelope::new([7; 32], assembled.call, nonce, MultiSignature::Sr25519([0; 64]));
        let wrapped = enclave.wrap_request_key(&assembled.key.export()).await?;
        let sealed = envelope.seal(ctx, &assembled.key, wrapped)?;
        let frames = enclave
            .send(JsonRpcRequest::new(1, envelope.method(), &sealed.encode()))
            .await?;
        let frame = crate::response::final_frame(&frames)?.clone();
        decode_mutation_result(&frame, &assembled.key, None)?;
        Ok(frame)
    }

    #[tokio::test]
    async fn test_fresh_identity_has_nonce_zero() {
        let enclave = mock();
        assert_eq!(enclave.get_nonce(&alice(), DecodeMode::Strict).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_link_creates_graph_and_bumps_nonce() {
        let enclave = mock();
        let ctx = SeededCrypto::new(2);
        submit_callback(&enclave, &ctx, 0).await.unwrap();

        let graph = enclave.id_graph(&alice());
        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&Identity::Evm([3; 20])));
        assert_eq!(enclave.nonce_of(&alice()), 1);
        assert_eq!(enclave.get_nonce(&alice(), DecodeMode::Strict).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_nonce_is_rejected() {
        let enclave = mock();
        let ctx = SeededCrypto::new(2);
        let err = submit_callback(&enclave, &ctx, 5).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Protocol(ProtocolError::Stf(StfError::InvalidNonce(0, 5)))
        );
        assert!(enclave.id_graph(&alice()).is_empty());
    }

    #[tokio::test]
    async fn test_injected_transport_failure() {
        let enclave = mock();
        enclave.fail_next(TransportError::Closed);
        assert!(enclave.get_shard().await.is_ok());
        let err = enclave.get_nonce(&alice(), DecodeMode::Strict).await.unwrap_err();
        assert!(err.is_transport());
        assert!(enclave.get_nonce(&alice(), DecodeMode::Strict).await.is_ok());
    }
}
