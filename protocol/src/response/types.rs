//! Wire types the enclave sends back.
//!
//! Index gaps in the error enums are reserved slots on the enclave side.

use std::fmt;

use parity_scale_codec::{Decode, Encode};

use crate::call::Assertion;
use crate::crypto::AesOutput;
use crate::identity::Identity;
use crate::{Index, H256};

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Progress of a submitted trusted operation.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum TrustedOperationStatus {
    #[codec(index = 0)]
    Submitted,
    #[codec(index = 1)]
    Future,
    #[codec(index = 2)]
    Ready,
    #[codec(index = 3)]
    Broadcast,
    #[codec(index = 4)]
    InSidechainBlock(H256),
    #[codec(index = 5)]
    Retracted,
    #[codec(index = 6)]
    FinalityTimeout,
    #[codec(index = 7)]
    Finalized,
    #[codec(index = 8)]
    Usurped,
    #[codec(index = 9)]
    Dropped,
    #[codec(index = 10)]
    Invalid,
    #[codec(index = 11)]
    TopExecuted(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum DirectRequestStatus {
    #[codec(index = 0)]
    Ok,
    /// Status plus the hash of the trusted operation it refers to.
    #[codec(index = 1)]
    TrustedOperationStatus(TrustedOperationStatus, H256),
    #[codec(index = 2)]
    Error,
}

/// One response frame.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WorkerRpcReturnValue {
    /// Encoded payload; its type depends on the method and status.
    pub value: Vec<u8>,
    /// More frames follow for this request.
    pub do_watch: bool,
    pub status: DirectRequestStatus,
}

impl WorkerRpcReturnValue {
    pub fn ok(value: Vec<u8>) -> Self {
        Self {
            value,
            do_watch: false,
            status: DirectRequestStatus::Ok,
        }
    }

    pub fn error(value: Vec<u8>) -> Self {
        Self {
            value,
            do_watch: false,
            status: DirectRequestStatus::Error,
        }
    }

    pub fn is_final(&self) -> bool {
        !self.do_watch
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Result of every call that changes an ID graph: link, set networks,
/// activate, deactivate.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MutationResult {
    /// The changed entries, sealed under the call's shielding key.
    pub mutated_id_graph: AesOutput,
    /// Hash of the whole graph after the mutation.
    pub id_graph_hash: H256,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RequestVcResult {
    pub vc_payload: AesOutput,
    /// Only meaningful when the caller's graph was empty before the request.
    pub pre_mutated_id_graph: AesOutput,
    pub pre_id_graph_hash: H256,
}

/// One frame of a VC request. `result` holds an encoded [`RequestVcResult`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RequestVcResultOrError {
    pub result: Result<Vec<u8>, RequestVcErrorDetail>,
    pub idx: u8,
    pub len: u8,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum ErrorDetail {
    #[codec(index = 0)]
    ImportError,
    #[codec(index = 1)]
    UnauthorizedSigner,
    #[codec(index = 2)]
    StfError(Vec<u8>),
    #[codec(index = 3)]
    SendStfRequestFailed,
    #[codec(index = 4)]
    ParseError,
    #[codec(index = 5)]
    DataProviderError(Vec<u8>),
    #[codec(index = 6)]
    InvalidIdentity,
    #[codec(index = 7)]
    WrongWeb2Handle,
    #[codec(index = 8)]
    UnexpectedMessage,
    #[codec(index = 10)]
    VerifyWeb3SignatureFailed,
    #[codec(index = 11)]
    NoEligibleIdentity,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StfError(msg) => write!(f, "StfError({})", String::from_utf8_lossy(msg)),
            Self::DataProviderError(msg) => {
                write!(f, "DataProviderError({})", String::from_utf8_lossy(msg))
            }
            other => write!(f, "{other:?}"),
        }
    }
}

/// State transition error reported by the enclave.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StfError {
    #[codec(index = 0)]
    LinkIdentityFailed(ErrorDetail),
    #[codec(index = 1)]
    DeactivateIdentityFailed(ErrorDetail),
    #[codec(index = 2)]
    ActivateIdentityFailed(ErrorDetail),
    #[codec(index = 3)]
    RequestVCFailed(Assertion, ErrorDetail),
    #[codec(index = 4)]
    SetScheduledMrEnclaveFailed,
    #[codec(index = 5)]
    SetIdentityNetworksFailed(ErrorDetail),
    #[codec(index = 6)]
    InvalidAccount,
    #[codec(index = 7)]
    UnclassifiedError,
    #[codec(index = 8)]
    RemoveIdentityFailed(ErrorDetail),
    #[codec(index = 9)]
    EmptyIDGraph,
    #[codec(index = 20)]
    MissingPrivileges(Identity),
    #[codec(index = 21)]
    RequireEnclaveSignerAccount,
    #[codec(index = 22)]
    Dispatch(String),
    #[codec(index = 23)]
    MissingFunds,
    /// `(expected, got)`
    #[codec(index = 24)]
    InvalidNonce(Index, Index),
    #[codec(index = 25)]
    StorageHashMismatch,
    #[codec(index = 26)]
    InvalidStorageDiff,
    #[codec(index = 27)]
    InvalidMetadata,
}

impl fmt::Display for StfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkIdentityFailed(d) => write!(f, "LinkIdentityFailed: {d}"),
            Self::DeactivateIdentityFailed(d) => write!(f, "DeactivateIdentityFailed: {d}"),
            Self::ActivateIdentityFailed(d) => write!(f, "ActivateIdentityFailed: {d}"),
            Self::RequestVCFailed(a, d) => write!(f, "RequestVCFailed: {a} {d}"),
            Self::SetIdentityNetworksFailed(d) => write!(f, "SetIdentityNetworksFailed: {d}"),
            Self::RemoveIdentityFailed(d) => write!(f, "RemoveIdentityFailed: {d}"),
            Self::Dispatch(msg) => write!(f, "Error dispatching runtime call. {msg}"),
            Self::InvalidNonce(expected, got) => write!(f, "Invalid Nonce {expected} != {got}"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum VcmpError {
    #[codec(index = 0)]
    RequestVCFailed(Assertion, ErrorDetail),
    #[codec(index = 1)]
    UnclassifiedError(ErrorDetail),
}

/// Why one assertion of a VC request failed.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum RequestVcErrorDetail {
    #[codec(index = 0)]
    UnexpectedCall(String),
    #[codec(index = 1)]
    DuplicateAssertionRequest,
    #[codec(index = 2)]
    ShieldingKeyRetrievalFailed(String),
    #[codec(index = 3)]
    RequestPayloadDecodingFailed,
    #[codec(index = 4)]
    SidechainDataRetrievalFailed(String),
    #[codec(index = 5)]
    IdentityAlreadyLinked,
    #[codec(index = 6)]
    NoEligibleIdentity,
    #[codec(index = 7)]
    InvalidSignerAccount,
    #[codec(index = 8)]
    UnauthorizedSigner,
    #[codec(index = 9)]
    AssertionBuildFailed(VcmpError),
    #[codec(index = 10)]
    MissingAesKey,
    #[codec(index = 11)]
    MrEnclaveRetrievalFailed,
    #[codec(index = 12)]
    EnclaveSignerRetrievalFailed,
    #[codec(index = 13)]
    SignatureVerificationFailed,
    #[codec(index = 14)]
    ConnectionHashNotFound(String),
    #[codec(index = 15)]
    MetadataRetrievalFailed(String),
    #[codec(index = 16)]
    InvalidMetadata(String),
    #[codec(index = 17)]
    TrustedCallSendingFailed(String),
    #[codec(index = 18)]
    CallSendingFailed(String),
    #[codec(index = 19)]
    ExtrinsicConstructionFailed(String),
    #[codec(index = 20)]
    ExtrinsicSendingFailed(String),
}

impl fmt::Display for RequestVcErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
