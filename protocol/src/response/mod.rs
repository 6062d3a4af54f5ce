//! # Response Decoder
//!
//! Wire types for enclave replies and the functions that turn them into
//! verified results.

pub mod decoder;
pub mod option;
pub mod types;

pub use decoder::{
    decode_getter_value, decode_id_graph, decode_id_graph_hash, decode_mutation_result,
    decode_nonce, decode_vc_results, final_frame, throw_if_empty_or_error, IssuedVc,
    MutationOutcome, VcOutcome,
};
pub use option::{decode_option, safely_decode_option};
pub use types::{
    DirectRequestStatus, ErrorDetail, MutationResult, RequestVcErrorDetail, RequestVcResult,
    RequestVcResultOrError, StfError, TrustedOperationStatus, VcmpError, WorkerRpcReturnValue,
};
