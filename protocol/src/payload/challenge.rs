//! Challenge codes.
//!
//! Before an identity can be linked, its owner proves control of it by
//! signing (or posting) a challenge code bound to the primary identity, the
//! identity being linked, and the primary identity's current nonce.

use parity_scale_codec::Encode;

use crate::config::TOKEN_PREFIX;
use crate::crypto::{blake2_256_concat, to_prefixed_hex};
use crate::identity::Identity;
use crate::Index;

/// `blake2_256(nonce ‖ signer ‖ target)` rendered for the wallet that signs
/// it, which is `target`'s.
///
/// Bitcoin wallets sign the bare 64 hex characters; every other class gets
/// `0x<digest>`. With `prettify` the result reads `Token: <digest>`, except
/// for web2 targets, which always get the plain `0x` digest.
pub fn challenge_code(signer: &Identity, target: &Identity, nonce: Index, prettify: bool) -> String {
    let digest = blake2_256_concat(&[&nonce.encode(), &signer.encode(), &target.encode()]);
    let code = match target {
        Identity::Bitcoin(_) => hex::encode(digest),
        _ => to_prefixed_hex(&digest),
    };
    if prettify && !target.is_web2() {
        format!("{TOKEN_PREFIX}{code}")
    } else {
        code
    }
}
