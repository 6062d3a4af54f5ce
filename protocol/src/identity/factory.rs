//! # Identity Factory
//!
//! Turns an `(address or handle, kind)` descriptor into a canonical
//! [`Identity`], or decodes one from its wire encoding. Pure functions, no
//! I/O.

use crate::codec::{decode_exact, decode_hex_exact};
use crate::error::{DecodeError, InputError};
use crate::identity::address::{parse_bitcoin, parse_evm, parse_solana, parse_substrate};
use crate::identity::types::{Identity, IdentityKind, IdentityString};

/// Caller-side description of an identity. Both fields are required; they are
/// optional here so that missing input is reported as such rather than as a
/// type error at the call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityDescriptor<'a> {
    pub address_or_handle: Option<&'a str>,
    pub kind: Option<IdentityKind>,
}

impl<'a> IdentityDescriptor<'a> {
    pub fn new(address_or_handle: &'a str, kind: IdentityKind) -> Self {
        Self {
            address_or_handle: Some(address_or_handle),
            kind: Some(kind),
        }
    }
}

/// Build the canonical identity for a descriptor.
///
/// # Errors
///
/// - [`InputError::MissingField`] when either field is absent.
/// - [`InputError::InvalidAddress`] when the address does not decode for the
///   declared kind, or a web2 handle is longer than 64 bytes.
pub fn create_identity(descriptor: IdentityDescriptor<'_>) -> Result<Identity, InputError> {
    let address = descriptor
        .address_or_handle
        .ok_or(InputError::MissingField("address_or_handle"))?;
    let kind = descriptor.kind.ok_or(InputError::MissingField("kind"))?;

    let handle = || IdentityString::new(address.as_bytes().to_vec());

    let identity = match kind {
        IdentityKind::Twitter => Identity::Twitter(handle()?),
        IdentityKind::Discord => Identity::Discord(handle()?),
        IdentityKind::Github => Identity::Github(handle()?),
        IdentityKind::Email => Identity::Email(handle()?),
        IdentityKind::Substrate => Identity::Substrate(parse_substrate(address)?),
        IdentityKind::Evm => Identity::Evm(parse_evm(address)?),
        IdentityKind::Bitcoin => Identity::Bitcoin(parse_bitcoin(address)?),
        IdentityKind::Solana => Identity::Solana(parse_solana(address)?),
    };
    Ok(identity)
}

/// Decode a SCALE-encoded identity. Trailing bytes are an error.
pub fn identity_from_encoded(bytes: &[u8]) -> Result<Identity, DecodeError> {
    decode_exact(bytes, "Identity")
}

/// [`identity_from_encoded`] over hex input.
pub fn identity_from_hex(raw: &str) -> Result<Identity, DecodeError> {
    decode_hex_exact(raw, "Identity")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_scale_codec::Encode;

    #[test]
    fn test_missing_fields() {
        let no_kind = IdentityDescriptor {
            address_or_handle: Some("alice"),
            kind: None,
        };
        assert_eq!(create_identity(no_kind), Err(InputError::MissingField("kind")));

        let no_address = IdentityDescriptor {
            address_or_handle: None,
            kind: Some(IdentityKind::Twitter),
        };
        assert_eq!(
            create_identity(no_address),
            Err(InputError::MissingField("address_or_handle"))
        );
    }

    #[test]
    fn test_web2_handles() {
        let id = create_identity(IdentityDescriptor::new("mock_user", IdentityKind::Twitter)).unwrap();
        assert!(id.is_web2());
        assert_eq!(id.kind(), IdentityKind::Twitter);

        let long = "x".repeat(65);
        assert!(matches!(
            create_identity(IdentityDescriptor::new(&long, IdentityKind::Discord)),
            Err(InputError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_evm_identity() {
        let id = create_identity(IdentityDescriptor::new(
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            IdentityKind::Evm,
        ))
        .unwrap();
        assert!(id.is_evm());
        assert_eq!(id.encode().len(), 21);
    }

    #[test]
    fn test_bitcoin_first_byte_not_checked() {
        // Not a valid curve point prefix, accepted anyway.
        let raw = format!("07{}", "00".repeat(32));
        let id = create_identity(IdentityDescriptor::new(&raw, IdentityKind::Bitcoin)).unwrap();
        assert!(id.is_bitcoin());
    }

    #[test]
    fn test_bad_substrate_address() {
        assert!(matches!(
            create_identity(IdentityDescriptor::new("not-an-address", IdentityKind::Substrate)),
            Err(InputError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_from_encoded_round_trip_and_trailing() {
        let id = create_identity(IdentityDescriptor::new("octocat", IdentityKind::Github)).unwrap();
        let mut encoded = id.encode();
        assert_eq!(identity_from_encoded(&encoded).unwrap(), id);
        assert_eq!(
            identity_from_hex(&format!("0x{}", hex::encode(&encoded))).unwrap(),
            id
        );

        encoded.push(0xff);
        assert!(matches!(
            identity_from_encoded(&encoded),
            Err(DecodeError::TrailingBytes { .. })
        ));
    }

    #[test]
    fn test_unknown_discriminant() {
        assert!(identity_from_encoded(&[8, 0]).is_err());
    }
}
