//! Address parsing per identity kind.
//!
//! Substrate accounts arrive as SS58 strings or raw hex, EVM accounts as
//! hex, Solana accounts as base58, Bitcoin identities as a hex compressed
//! public key. All of them normalise to the fixed-width key bytes the
//! enclave stores.

use crate::config::{ADDRESS20_LENGTH, ADDRESS32_LENGTH, ADDRESS33_LENGTH, SS58_CHECKSUM_LENGTH, SS58_PREFIX};
use crate::crypto::{blake2_512, from_hex};
use crate::error::InputError;
use crate::identity::types::IdentityKind;

fn invalid(kind: IdentityKind, reason: impl Into<String>) -> InputError {
    InputError::InvalidAddress {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn fixed<const N: usize>(kind: IdentityKind, bytes: Vec<u8>) -> Result<[u8; N], InputError> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| invalid(kind, format!("expected {N} bytes, got {len}")))
}

fn hex_fixed<const N: usize>(kind: IdentityKind, s: &str) -> Result<[u8; N], InputError> {
    let bytes = from_hex(s).map_err(|e| invalid(kind, e.to_string()))?;
    fixed(kind, bytes)
}

// ---------------------------------------------------------------------------
// SS58
// ---------------------------------------------------------------------------

fn ss58_checksum(body: &[u8]) -> [u8; SS58_CHECKSUM_LENGTH] {
    let mut preimage = Vec::with_capacity(SS58_PREFIX.len() + body.len());
    preimage.extend_from_slice(SS58_PREFIX);
    preimage.extend_from_slice(body);
    let hash = blake2_512(&preimage);
    [hash[0], hash[1]]
}

/// Decode an SS58 address carrying a 32-byte account key.
///
/// Returns `(network_prefix, key)`. One-byte prefixes cover 0..=63, two-byte
/// prefixes cover 64..=16383.
pub fn ss58_decode(address: &str) -> Result<(u16, [u8; ADDRESS32_LENGTH]), InputError> {
    let kind = IdentityKind::Substrate;
    let data = bs58::decode(address)
        .into_vec()
        .map_err(|e| invalid(kind, e.to_string()))?;

    let first = *data.first().ok_or_else(|| invalid(kind, "empty address"))?;
    let (prefix, prefix_len) = match first {
        0..=63 => (first as u16, 1),
        64..=127 => {
            let second = *data.get(1).ok_or_else(|| invalid(kind, "truncated prefix"))?;
            let lower = ((first << 2) | (second >> 6)) as u16;
            let upper = (second & 0b0011_1111) as u16;
            (lower | (upper << 8), 2)
        }
        _ => return Err(invalid(kind, "reserved ss58 prefix")),
    };

    if data.len() != prefix_len + ADDRESS32_LENGTH + SS58_CHECKSUM_LENGTH {
        return Err(invalid(kind, format!("unexpected ss58 length {}", data.len())));
    }

    let (body, checksum) = data.split_at(data.len() - SS58_CHECKSUM_LENGTH);
    if ss58_checksum(body) != checksum {
        return Err(invalid(kind, "ss58 checksum mismatch"));
    }

    let key = fixed(kind, body[prefix_len..].to_vec())?;
    Ok((prefix, key))
}

/// Encode a 32-byte key under the given network prefix (0..=16383).
pub fn ss58_encode(prefix: u16, key: &[u8; ADDRESS32_LENGTH]) -> String {
    let prefix = prefix & 0b0011_1111_1111_1111;
    let mut body = match prefix {
        0..=63 => vec![prefix as u8],
        _ => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8 >> 2) | 0b0100_0000;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first, second]
        }
    };
    body.extend_from_slice(key);
    let checksum = ss58_checksum(&body);
    body.extend_from_slice(&checksum);
    bs58::encode(body).into_string()
}

// ---------------------------------------------------------------------------
// Per-kind parsers
// ---------------------------------------------------------------------------

/// SS58 or `0x` hex.
pub fn parse_substrate(s: &str) -> Result<[u8; ADDRESS32_LENGTH], InputError> {
    if s.starts_with("0x") {
        hex_fixed(IdentityKind::Substrate, s)
    } else {
        ss58_decode(s).map(|(_, key)| key)
    }
}

/// Hex, case-insensitive. Mixed-case checksums are not verified.
pub fn parse_evm(s: &str) -> Result<[u8; ADDRESS20_LENGTH], InputError> {
    hex_fixed(IdentityKind::Evm, s)
}

/// Compressed public key as hex, with or without `0x`.
pub fn parse_bitcoin(s: &str) -> Result<[u8; ADDRESS33_LENGTH], InputError> {
    hex_fixed(IdentityKind::Bitcoin, s)
}

/// Base58, or `0x` hex.
pub fn parse_solana(s: &str) -> Result<[u8; ADDRESS32_LENGTH], InputError> {
    let kind = IdentityKind::Solana;
    if s.starts_with("0x") {
        return hex_fixed(kind, s);
    }
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| invalid(kind, e.to_string()))?;
    fixed(kind, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known dev account //Alice.
    const ALICE_SS58: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    #[test]
    fn test_ss58_decodes_alice() {
        let (prefix, key) = ss58_decode(ALICE_SS58).unwrap();
        assert_eq!(prefix, 42);
        assert_eq!(format!("0x{}", hex::encode(key)), ALICE_HEX);
    }

    #[test]
    fn test_ss58_encode_matches_known_address() {
        let key = parse_substrate(ALICE_HEX).unwrap();
        assert_eq!(ss58_encode(42, &key), ALICE_SS58);
    }

    #[test]
    fn test_ss58_two_byte_prefix_round_trip() {
        let key = [0x11; 32];
        for prefix in [64u16, 255, 1000, 16383] {
            let address = ss58_encode(prefix, &key);
            assert_eq!(ss58_decode(&address).unwrap(), (prefix, key));
        }
    }

    #[test]
    fn test_ss58_bad_checksum() {
        let mut chars: Vec<char> = ALICE_SS58.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'Y' { 'Z' } else { 'Y' };
        let tampered: String = chars.into_iter().collect();
        assert!(ss58_decode(&tampered).is_err());
    }

    #[test]
    fn test_substrate_accepts_both_forms() {
        assert_eq!(
            parse_substrate(ALICE_SS58).unwrap(),
            parse_substrate(ALICE_HEX).unwrap()
        );
        assert!(parse_substrate("0x1234").is_err());
    }

    #[test]
    fn test_evm_case_insensitive() {
        let lower = parse_evm("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        let mixed = parse_evm("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        assert_eq!(lower, mixed);
        assert!(parse_evm("0xf39fd6").is_err());
    }

    #[test]
    fn test_bitcoin_without_prefix() {
        let raw = format!("02{}", "ab".repeat(32));
        let with = parse_bitcoin(&format!("0x{raw}")).unwrap();
        let without = parse_bitcoin(&raw).unwrap();
        assert_eq!(with, without);
        assert_eq!(with[0], 0x02);
    }

    #[test]
    fn test_bitcoin_rejects_uncompressed_length() {
        let raw = format!("04{}", "ab".repeat(64));
        assert!(parse_bitcoin(&raw).is_err());
    }

    #[test]
    fn test_solana_base58_and_hex() {
        let key = [7u8; 32];
        let b58 = bs58::encode(key).into_string();
        assert_eq!(parse_solana(&b58).unwrap(), key);
        assert_eq!(parse_solana(&format!("0x{}", hex::encode(key))).unwrap(), key);
        assert!(parse_solana("0OIl").is_err());
    }
}
