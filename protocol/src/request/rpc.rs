//! # JSON-RPC Definitions
//!
//! The enclave speaks JSON-RPC 2.0 over a one-shot connection. Every request
//! carries exactly one parameter: the `0x`-hex encoding of a SCALE value.
//! Every response carries a `0x`-hex encoded [`WorkerRpcReturnValue`].
//!
//! ## Method Index
//!
//! | Method                            | Payload       | Frames                  |
//! |-----------------------------------|---------------|-------------------------|
//! | `state_executeGetter`             | `Request`     | one                     |
//! | `author_submitAndWatchAesRequest` | `AesRequest`  | status frames, then one |
//! | `author_requestVc`                | `AesRequest`  | one per assertion       |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{decode_hex_exact, hex_bytes};
use crate::config::{JSONRPC_VERSION, METHOD_EXECUTE_GETTER, METHOD_REQUEST_VC, METHOD_SUBMIT_AND_WATCH};
use crate::crypto::to_prefixed_hex;
use crate::error::{DecodeError, ProtocolError, Result};
use crate::response::WorkerRpcReturnValue;

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Run a getter. Parameters: `(request: Request)`
    #[serde(rename = "state_executeGetter")]
    ExecuteGetter,
    /// Submit a mutating call and watch it. Parameters: `(request: AesRequest)`
    #[serde(rename = "author_submitAndWatchAesRequest")]
    SubmitAndWatch,
    /// Request verifiable credentials. Parameters: `(request: AesRequest)`
    #[serde(rename = "author_requestVc")]
    RequestVc,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecuteGetter => METHOD_EXECUTE_GETTER,
            Self::SubmitAndWatch => METHOD_SUBMIT_AND_WATCH,
            Self::RequestVc => METHOD_REQUEST_VC,
        }
    }

    /// Direct methods stream every frame back as a result; watched methods
    /// only deliver their last frame.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::RequestVc)
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Small integer. The transport correlates responses by it.
    pub id: u32,
    pub method: RpcMethod,
    pub params: Vec<String>,
}

impl JsonRpcRequest {
    /// Request carrying one encoded payload.
    pub fn new(id: u32, method: RpcMethod, payload: &[u8]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params: vec![to_prefixed_hex(payload)],
        }
    }

    /// The encoded payload back out of the first parameter.
    pub fn payload(&self) -> Result<Vec<u8>, DecodeError> {
        let raw = self.params.first().ok_or_else(|| DecodeError::Scale {
            type_name: "JsonRpcRequest",
            reason: "missing params".into(),
        })?;
        hex_bytes(raw, "JsonRpcRequest")
    }

    pub fn to_json(&self) -> String {
        // Plain strings and integers; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: u32, frame: &WorkerRpcReturnValue) -> Self {
        use parity_scale_codec::Encode;
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(to_prefixed_hex(&frame.encode())),
            error: None,
        }
    }

    pub fn error(id: u32, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Decode the frame in `result`, or surface `error`.
    pub fn into_frame(self) -> Result<WorkerRpcReturnValue> {
        if let Some(err) = self.error {
            return Err(ProtocolError::Rpc {
                code: err.code,
                message: err.message,
            }
            .into());
        }
        let raw = self.result.ok_or(ProtocolError::EmptyResponse)?;
        Ok(decode_hex_exact(&raw, "WorkerRpcReturnValue")?)
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: msg.into(),
        }
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("method not found: {}", method.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame collection
// ---------------------------------------------------------------------------

/// Reduce raw responses, in arrival order, to the frames the decoder sees.
///
/// Responses for other ids are ignored, as are empty frames that only ask to
/// keep watching. Direct methods keep every frame; watched methods keep the
/// final one. Stops at the first final frame.
pub fn collect_frames(
    request: &JsonRpcRequest,
    responses: impl IntoIterator<Item = JsonRpcResponse>,
) -> Result<Vec<WorkerRpcReturnValue>> {
    let mut frames = Vec::new();
    for response in responses {
        if response.id != request.id {
            debug!(id = response.id, expected = request.id, "skipping response for another id");
            continue;
        }
        let frame = response.into_frame()?;
        if frame.value.is_empty() && frame.do_watch {
            continue;
        }
        let done = frame.is_final();
        if request.method.is_direct() || done {
            frames.push(frame);
        }
        if done {
            break;
        }
    }
    debug!(method = %request.method, frames = frames.len(), "collected response frames");
    Ok(frames)
}
