//! Strict SCALE decoding helpers.
//!
//! Everything the client decodes goes through [`decode_exact`]: a value
//! that decodes but leaves bytes behind is an error, not a success.

use parity_scale_codec::{Decode, Encode, EncodeLike, Error as CodecError, Input, Output};

use crate::crypto::from_hex;
use crate::error::DecodeError;

/// A vector with a maximum length, encoded exactly like `Vec<T>`.
///
/// Decoding a longer vector fails, mirroring the enclave's bounded types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundedVec<T, const N: usize>(Vec<T>);

impl<T, const N: usize> BoundedVec<T, N> {
    pub const BOUND: usize = N;

    /// Wrap `items`, handing them back if there are more than `N`.
    pub fn try_new(items: Vec<T>) -> Result<Self, Vec<T>> {
        if items.len() > N {
            return Err(items);
        }
        Ok(Self(items))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T, const N: usize> Default for BoundedVec<T, N> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Encode, const N: usize> Encode for BoundedVec<T, N> {
    fn size_hint(&self) -> usize {
        self.0.size_hint()
    }

    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.encode_to(dest)
    }
}

impl<T: Encode, const N: usize> EncodeLike for BoundedVec<T, N> {}

impl<T: Decode, const N: usize> Decode for BoundedVec<T, N> {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let items = Vec::<T>::decode(input)?;
        if items.len() > N {
            return Err("BoundedVec exceeds its bound".into());
        }
        Ok(Self(items))
    }
}

/// Decode `T` from `bytes`, consuming every byte.
pub fn decode_exact<T: Decode>(bytes: &[u8], type_name: &'static str) -> Result<T, DecodeError> {
    let mut input = bytes;
    let value = T::decode(&mut input).map_err(|e| DecodeError::Scale {
        type_name,
        reason: e.to_string(),
    })?;
    if !input.is_empty() {
        return Err(DecodeError::TrailingBytes {
            type_name,
            remaining: input.len(),
        });
    }
    Ok(value)
}

/// Hex (with or without `0x`) into bytes, tagged with the requested type.
pub fn hex_bytes(raw: &str, type_name: &'static str) -> Result<Vec<u8>, DecodeError> {
    from_hex(raw).map_err(|e| DecodeError::Hex {
        type_name,
        reason: e.to_string(),
    })
}

/// [`decode_exact`] over a hex string.
pub fn decode_hex_exact<T: Decode>(raw: &str, type_name: &'static str) -> Result<T, DecodeError> {
    decode_exact(&hex_bytes(raw, type_name)?, type_name)
}
