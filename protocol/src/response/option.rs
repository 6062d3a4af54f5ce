//! Optional values on the wire.
//!
//! Getters answer with an encoded `Option<T>`. The discriminant is checked
//! before anything else: `0x00` is absent, `0x01` is present, any other byte
//! is malformed. A malformed value is never read as "absent".

use parity_scale_codec::Decode;

use crate::codec::{decode_exact, hex_bytes};
use crate::config::DecodeMode;
use crate::error::DecodeError;

const NONE: u8 = 0x00;
const SOME: u8 = 0x01;

/// Decode an encoded `Option<T>` from raw bytes.
///
/// `None` becomes `Ok(None)` in [`DecodeMode::Lenient`] and
/// [`DecodeError::NoneValue`] in [`DecodeMode::Strict`].
pub fn decode_option<T: Decode>(
    bytes: &[u8],
    mode: DecodeMode,
    type_name: &'static str,
) -> Result<Option<T>, DecodeError> {
    let (discriminant, rest) = bytes.split_first().ok_or_else(|| DecodeError::Scale {
        type_name,
        reason: "empty input".into(),
    })?;

    match *discriminant {
        NONE if rest.is_empty() => match mode {
            DecodeMode::Lenient => Ok(None),
            DecodeMode::Strict => Err(DecodeError::NoneValue { type_name }),
        },
        NONE => Err(DecodeError::TrailingBytes {
            type_name,
            remaining: rest.len(),
        }),
        SOME => decode_exact(rest, type_name).map(Some),
        byte => Err(DecodeError::InvalidDiscriminant { type_name, byte }),
    }
}

/// [`decode_option`] over a hex string, with or without `0x`.
pub fn safely_decode_option<T: Decode>(
    raw_hex: &str,
    mode: DecodeMode,
    type_name: &'static str,
) -> Result<Option<T>, DecodeError> {
    decode_option(&hex_bytes(raw_hex, type_name)?, mode, type_name)
}
