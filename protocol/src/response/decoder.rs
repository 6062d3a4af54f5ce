//! # Response Decoding
//!
//! Turns response frames into typed results. Everything here fails closed
//! except [`decode_id_graph_hash`], which reports an undecodable hash as
//! absent.

use parity_scale_codec::Decode;
use tracing::{debug, warn};

use crate::codec::decode_exact;
use crate::config::DecodeMode;
use crate::crypto::{to_prefixed_hex, AesOutput, ShieldingKey};
use crate::error::{ClientError, DecodeError, ProtocolError, Result};
use crate::identity::IdGraph;
use crate::response::option::decode_option;
use crate::response::types::{
    DirectRequestStatus, MutationResult, RequestVcResult, RequestVcResultOrError, StfError,
    TrustedOperationStatus, WorkerRpcReturnValue,
};
use crate::{Index, H256};

/// Reject frames that carry nothing or report a failure.
pub fn throw_if_empty_or_error(frame: &WorkerRpcReturnValue) -> Result<(), ProtocolError> {
    if frame.value.is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }

    match &frame.status {
        DirectRequestStatus::Ok => Ok(()),
        DirectRequestStatus::Error => Err(enclave_error(&frame.value)),
        DirectRequestStatus::TrustedOperationStatus(status, _) => match status {
            TrustedOperationStatus::Submitted | TrustedOperationStatus::InSidechainBlock(_) => {
                Ok(())
            }
            TrustedOperationStatus::Invalid => match decode_exact::<StfError>(&frame.value, "StfError") {
                Ok(err) => Err(ProtocolError::Stf(err)),
                Err(_) => Err(ProtocolError::InvalidOperation),
            },
            _ => match decode_exact::<StfError>(&frame.value, "StfError") {
                Ok(err) => Err(ProtocolError::Stf(err)),
                Err(_) => Ok(()),
            },
        },
    }
}

/// Best-effort reading of an error value: an `StfError`, then an encoded
/// string, then raw text.
fn enclave_error(value: &[u8]) -> ProtocolError {
    if let Ok(err) = decode_exact::<StfError>(value, "StfError") {
        return ProtocolError::Stf(err);
    }
    if let Ok(msg) = decode_exact::<String>(value, "String") {
        return ProtocolError::Enclave(msg);
    }
    ProtocolError::Enclave(String::from_utf8_lossy(value).into_owned())
}

/// The frame that carries the result of a watched call.
pub fn final_frame(frames: &[WorkerRpcReturnValue]) -> Result<&WorkerRpcReturnValue, ProtocolError> {
    let last = frames.last().ok_or(ProtocolError::NoFrames)?;
    if !last.is_final() {
        debug!(frames = frames.len(), "last frame still asks to be watched");
    }
    Ok(last)
}

// ---------------------------------------------------------------------------
// Getters
// ---------------------------------------------------------------------------

/// Getters answer with `Option<Bytes>`, the bytes holding an encoded `T`.
pub fn decode_getter_value<T: Decode>(
    frame: &WorkerRpcReturnValue,
    mode: DecodeMode,
    type_name: &'static str,
) -> Result<Option<T>> {
    throw_if_empty_or_error(frame)?;
    match decode_option::<Vec<u8>>(&frame.value, mode, type_name)? {
        Some(inner) => Ok(Some(decode_exact(&inner, type_name)?)),
        None => Ok(None),
    }
}

/// Nonce getter. `None` only in lenient mode.
pub fn decode_nonce(frame: &WorkerRpcReturnValue, mode: DecodeMode) -> Result<Option<Index>> {
    decode_getter_value(frame, mode, "Index")
}

/// ID-graph-hash getter. Any failure reads as "no hash".
pub fn decode_id_graph_hash(frame: &WorkerRpcReturnValue) -> Option<H256> {
    match decode_getter_value::<H256>(frame, DecodeMode::Lenient, "H256") {
        Ok(hash) => hash,
        Err(err) => {
            debug!(error = %err, "id graph hash unavailable");
            None
        }
    }
}

/// Trusted `id_graph` getter. An unknown identity has an empty graph.
pub fn decode_id_graph(frame: &WorkerRpcReturnValue) -> Result<IdGraph> {
    Ok(decode_getter_value::<IdGraph>(frame, DecodeMode::Lenient, "IdGraph")?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// What a mutating call hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// The graph entries shipped by the enclave, decrypted.
    pub mutated_identities: IdGraph,
    /// The verified graph hash.
    pub id_graph_hash: H256,
    /// The frame the result came from.
    pub response: WorkerRpcReturnValue,
}

fn open_graph(key: &ShieldingKey, sealed: &AesOutput) -> Result<IdGraph> {
    let cleartext = key.open(sealed)?;
    Ok(decode_exact(&cleartext, "IdGraph")?)
}

/// Decode, decrypt and verify a mutation result.
///
/// With `known` set, the shipped entries are merged into it before hashing,
/// for enclaves that ship only the changed entries. Without it the shipped
/// entries must hash to the shipped digest on their own.
pub fn decode_mutation_result(
    frame: &WorkerRpcReturnValue,
    key: &ShieldingKey,
    known: Option<&IdGraph>,
) -> Result<MutationOutcome> {
    throw_if_empty_or_error(frame)?;
    let result: MutationResult = decode_exact(&frame.value, "MutationResult")?;
    let mutated = open_graph(key, &result.mutated_id_graph)?;

    let computed = match known {
        Some(graph) => {
            let mut merged = graph.clone();
            merged.merge(&mutated);
            merged.hash()
        }
        None => mutated.hash(),
    };

    if computed != result.id_graph_hash {
        warn!(
            expected = %to_prefixed_hex(&result.id_graph_hash),
            computed = %to_prefixed_hex(&computed),
            "id graph hash mismatch"
        );
        return Err(ProtocolError::IdGraphHashMismatch {
            expected: to_prefixed_hex(&result.id_graph_hash),
            computed: to_prefixed_hex(&computed),
        }
        .into());
    }

    debug!(entries = mutated.len(), "mutation result verified");
    Ok(MutationOutcome {
        mutated_identities: mutated,
        id_graph_hash: result.id_graph_hash,
        response: frame.clone(),
    })
}

// ---------------------------------------------------------------------------
// Verifiable credentials
// ---------------------------------------------------------------------------

/// One issued credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedVc {
    /// Decrypted credential document.
    pub vc_payload: Vec<u8>,
    /// Graph created for the requester if it had none yet.
    pub pre_mutated_id_graph: Option<IdGraph>,
    pub pre_id_graph_hash: H256,
}

impl IssuedVc {
    /// The credential as text, when it is UTF-8 (it is JSON in practice).
    pub fn as_str(&self) -> Result<&str, DecodeError> {
        std::str::from_utf8(&self.vc_payload).map_err(|_| DecodeError::Utf8("vc_payload"))
    }
}

/// Result for one assertion of a VC request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcOutcome {
    pub idx: u8,
    pub len: u8,
    pub result: Result<IssuedVc, ProtocolError>,
}

fn decode_vc_frame(frame: &WorkerRpcReturnValue, key: &ShieldingKey) -> Result<VcOutcome> {
    throw_if_empty_or_error(frame)?;
    let RequestVcResultOrError { result, idx, len } = decode_exact(&frame.value, "RequestVcResultOrError")?;
    if idx >= len {
        return Err(ProtocolError::Enclave(format!("vc result index {idx} out of range {len}")).into());
    }

    let result = match result {
        Ok(bytes) => {
            let vc: RequestVcResult = decode_exact(&bytes, "RequestVcResult")?;
            let pre_mutated_id_graph = if vc.pre_mutated_id_graph.ciphertext.is_empty() {
                None
            } else {
                Some(open_graph(key, &vc.pre_mutated_id_graph)?)
            };
            Ok(IssuedVc {
                vc_payload: key.open(&vc.vc_payload)?,
                pre_mutated_id_graph,
                pre_id_graph_hash: vc.pre_id_graph_hash,
            })
        }
        Err(detail) => {
            debug!(idx, len, %detail, "vc request failed");
            Err(ProtocolError::VcRequestFailed {
                idx,
                len,
                detail: detail.to_string(),
            })
        }
    };
    Ok(VcOutcome { idx, len, result })
}

/// Decode every VC frame and order the outcomes by assertion index.
///
/// Per-assertion failures are reported inside each [`VcOutcome`]; a frame
/// that cannot be decoded or opened fails the whole batch.
pub fn decode_vc_results(frames: &[WorkerRpcReturnValue], key: &ShieldingKey) -> Result<Vec<VcOutcome>> {
    if frames.is_empty() {
        return Err(ProtocolError::NoFrames.into());
    }
    let mut outcomes = frames
        .iter()
        .map(|frame| decode_vc_frame(frame, key))
        .collect::<Result<Vec<_>>>()?;
    outcomes.sort_by_key(|o| o.idx);

    let expected = outcomes[0].len as usize;
    let complete = outcomes.len() == expected
        && outcomes.iter().enumerate().all(|(i, o)| o.idx as usize == i && o.len as usize == expected);
    if !complete {
        return Err(ClientError::Protocol(ProtocolError::Enclave(format!(
            "expected {expected} vc results, received {}",
            outcomes.len()
        ))));
    }
    Ok(outcomes)
}
