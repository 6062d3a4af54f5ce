//! # Request Envelopes
//!
//! A signed call travels as `TrustedOperation::direct_call`, sealed under the
//! call's own shielding key into an [`AesRequest`]. The shielding key itself
//! rides along in `key`, wrapped for the enclave by the transport. Getters
//! travel in a plain [`Request`].

use parity_scale_codec::{Decode, Encode};
use tracing::debug;

use crate::call::{MultiSignature, TrustedCall, TrustedCallSigned, TrustedOperation};
use crate::config::CORRELATION_ID_LENGTH;
use crate::crypto::{random_bytes, AesOutput, CryptoContext, ShieldingKey};
use crate::error::CryptoError;
use crate::identity::Identity;
use crate::request::rpc::{JsonRpcRequest, RpcMethod};
use crate::{Index, ShardId, H256};

/// Unencrypted request, used for getters.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Request {
    pub shard: ShardId,
    /// Encoded [`TrustedOperation`].
    pub payload: Vec<u8>,
}

/// Encrypted request, used for every call.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AesRequest {
    pub shard: ShardId,
    /// Shielding key wrapped for the enclave.
    pub key: Vec<u8>,
    /// Encoded [`TrustedOperation`], sealed under the shielding key.
    pub payload: AesOutput,
}

/// Everything needed to submit one signed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub shard: ShardId,
    pub signer: Identity,
    pub signature: MultiSignature,
    pub call: TrustedCall,
    pub nonce: Index,
}

impl RequestEnvelope {
    pub fn new(shard: ShardId, call: TrustedCall, nonce: Index, signature: MultiSignature) -> Self {
        Self {
            shard,
            signer: call.signer().clone(),
            signature,
            call,
            nonce,
        }
    }

    pub fn signed_call(&self) -> TrustedCallSigned {
        TrustedCallSigned {
            call: self.call.clone(),
            index: self.nonce,
            signature: self.signature.clone(),
        }
    }

    pub fn operation(&self) -> TrustedOperation {
        TrustedOperation::direct(self.signed_call())
    }

    /// Seal the operation under `key`. `wrapped_key` is `key` as wrapped by
    /// the transport.
    pub fn seal(
        &self,
        ctx: &dyn CryptoContext,
        key: &ShieldingKey,
        wrapped_key: Vec<u8>,
    ) -> Result<AesRequest, CryptoError> {
        let payload = key.seal(ctx, &self.operation().encode(), &[])?;
        debug!(
            kind = %self.call.kind(),
            nonce = self.nonce,
            ciphertext_len = payload.ciphertext.len(),
            "sealed request envelope"
        );
        Ok(AesRequest {
            shard: self.shard,
            key: wrapped_key,
            payload,
        })
    }

    /// Method the sealed envelope is submitted with.
    pub fn method(&self) -> RpcMethod {
        if self.call.kind().mutates_id_graph() {
            RpcMethod::SubmitAndWatch
        } else {
            RpcMethod::RequestVc
        }
    }
}

/// Client-side correlation id. Never interpreted by the enclave beyond
/// being echoed in the call's `hash` slot.
pub fn generate_tx_hash(ctx: &dyn CryptoContext) -> H256 {
    random_bytes::<CORRELATION_ID_LENGTH>(ctx)
}

/// JSON-RPC request running `operation` as a getter.
pub fn getter_request(rpc_id: u32, shard: ShardId, operation: TrustedOperation) -> JsonRpcRequest {
    let request = Request {
        shard,
        payload: operation.encode(),
    };
    JsonRpcRequest::new(rpc_id, RpcMethod::ExecuteGetter, &request.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::trusted_call::{deactivate_identity, request_vc, IdentityStatusParams, RequestVcParams};
    use crate::call::{Assertion, PublicGetter};
    use crate::codec::decode_exact;
    use crate::crypto::SeededCrypto;

    fn alice() -> Identity {
        Identity::Substrate([0xa1; 32])
    }

    #[test]
    fn test_sealed_envelope_opens_to_direct_call() {
        let ctx = SeededCrypto::new(3);
        let assembled = deactivate_identity(
            &ctx,
            IdentityStatusParams {
                who: alice(),
                identity: Identity::Evm([2; 20]),
                hash: [5; 32],
            },
        )
        .unwrap();
        let envelope = RequestEnvelope::new([1; 32], assembled.call.clone(), 7, MultiSignature::Sr25519([9; 64]));
        assert_eq!(envelope.signer, alice());
        assert_eq!(envelope.method(), RpcMethod::SubmitAndWatch);

        let sealed = envelope.seal(&ctx, &assembled.key, vec![0xee]).unwrap();
        assert_eq!(sealed.shard, [1; 32]);
        assert_eq!(sealed.key, vec![0xee]);

        let opened = assembled.key.open(&sealed.payload).unwrap();
        let op: TrustedOperation = decode_exact(&opened, "TrustedOperation").unwrap();
        match op {
            TrustedOperation::direct_call(signed) => {
                assert_eq!(signed.index, 7);
                assert_eq!(signed.call, assembled.call);
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_vc_calls_use_request_vc() {
        let ctx = SeededCrypto::new(3);
        let assembled = request_vc(
            &ctx,
            RequestVcParams {
                who: alice(),
                assertion: Assertion::A1,
                hash: [0; 32],
            },
        )
        .unwrap();
        let envelope = RequestEnvelope::new([1; 32], assembled.call, 0, MultiSignature::Sr25519([0; 64]));
        assert_eq!(envelope.method(), RpcMethod::RequestVc);
    }

    #[test]
    fn test_tx_hashes_are_fresh() {
        let ctx = SeededCrypto::new(1);
        assert_ne!(generate_tx_hash(&ctx), generate_tx_hash(&ctx));
    }

    #[test]
    fn test_getter_request_is_unencrypted() {
        let op: TrustedOperation = PublicGetter::nonce(alice()).into();
        let req = getter_request(1, [4; 32], op.clone());
        assert_eq!(req.method, RpcMethod::ExecuteGetter);
        let request: Request = decode_exact(&req.payload().unwrap(), "Request").unwrap();
        assert_eq!(request.shard, [4; 32]);
        assert_eq!(request.payload, op.encode());
    }
}
