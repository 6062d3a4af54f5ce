//! # Trusted Calls
//!
//! Everything that ends up inside the encrypted request: the call variants
//! and their assembler, the ownership proofs and credential assertions they
//! carry, wallet signatures, and the operation wrappers.

pub mod assertion;
pub mod operation;
pub mod signature;
pub mod trusted_call;
pub mod validation;

pub use assertion::Assertion;
pub use operation::{
    Getter, PublicGetter, TrustedCallSigned, TrustedGetter, TrustedGetterSigned, TrustedOperation,
};
pub use signature::{decode_signature, decode_signature_as, MultiSignature, SignatureScheme};
pub use trusted_call::{
    AssembledCall, CallKind, IdentityStatusParams, LinkIdentityCallbackParams, LinkIdentityParams,
    RequestBatchVcParams, RequestVcParams, SetIdentityNetworksParams, TrustedCall,
};
pub use validation::ValidationData;
