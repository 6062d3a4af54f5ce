//! # Request Envelope Builder / Dispatcher
//!
//! From an assembled call to frames on the wire and back: envelopes, the
//! JSON-RPC framing, the transport seam, the per-request lifecycle, and the
//! [`EnclaveClient`] that ties them together.

pub mod client;
pub mod envelope;
pub mod lifecycle;
pub mod mock;
pub mod rpc;
pub mod transport;

pub use client::{CallOutcome, EnclaveClient, PreparedRequest};
pub use envelope::{generate_tx_hash, getter_request, AesRequest, Request, RequestEnvelope};
pub use lifecycle::{RequestLifecycle, RequestState};
pub use mock::MockEnclave;
pub use rpc::{collect_frames, JsonRpcRequest, JsonRpcResponse, RpcError, RpcMethod};
pub use transport::{execute_getter, EnclaveTransport};
