//! The seam between the client and whatever actually talks to the enclave.
//!
//! Implementations own the connection, the timeout and the watch semantics
//! ([`collect_frames`](crate::request::rpc::collect_frames) implements the
//! latter for raw JSON-RPC responses). The client never retries.

use async_trait::async_trait;

use crate::call::{PublicGetter, TrustedOperation};
use crate::config::{DecodeMode, DEFAULT_RPC_ID};
use crate::crypto::RequestAesKey;
use crate::error::Result;
use crate::identity::Identity;
use crate::request::envelope::getter_request;
use crate::request::rpc::JsonRpcRequest;
use crate::response::{decode_nonce, final_frame, WorkerRpcReturnValue};
use crate::{Index, ShardId};

#[async_trait]
pub trait EnclaveTransport: Send + Sync {
    /// Shard the enclave currently executes.
    async fn get_shard(&self) -> Result<ShardId>;

    /// Next nonce for `who`.
    ///
    /// The default runs the public `nonce` getter. An identity the enclave
    /// has never seen reads as `0` in lenient mode and as an error in strict
    /// mode.
    async fn get_nonce(&self, who: &Identity, mode: DecodeMode) -> Result<Index> {
        let shard = self.get_shard().await?;
        let frame = execute_getter(self, DEFAULT_RPC_ID, shard, PublicGetter::nonce(who.clone()).into()).await?;
        Ok(decode_nonce(&frame, mode)?.unwrap_or_default())
    }

    /// Wrap a shielding key so only the enclave can unwrap it.
    async fn wrap_request_key(&self, key: &RequestAesKey) -> Result<Vec<u8>>;

    /// Send a request and return its frames in arrival order.
    async fn send(&self, request: JsonRpcRequest) -> Result<Vec<WorkerRpcReturnValue>>;
}

/// Run a getter and return its single frame.
pub async fn execute_getter<T: EnclaveTransport + ?Sized>(
    transport: &T,
    rpc_id: u32,
    shard: ShardId,
    operation: TrustedOperation,
) -> Result<WorkerRpcReturnValue> {
    let frames = transport.send(getter_request(rpc_id, shard, operation)).await?;
    Ok(final_frame(&frames)?.clone())
}
