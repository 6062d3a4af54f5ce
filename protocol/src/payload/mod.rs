//! # Payload-To-Sign Builder
//!
//! Derives what an external wallet signs: challenge codes for ownership
//! proofs, and prettified operation digests for calls and getters.

pub mod challenge;
pub mod signing;

pub use challenge::challenge_code;
pub use signing::{
    call_message_prefix, getter_payload_to_sign, payload_to_sign, PayloadEncoding, PayloadToSign,
};
