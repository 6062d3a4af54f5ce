//! # Payload To Sign
//!
//! The exact string a wallet signs for a call or a trusted getter. The
//! enclave rebuilds this string on its side and verifies the signature
//! against it, so the rules below are bit-exact:
//!
//! 1. Digest the operation. Calls use `blake2_256(call ‖ nonce ‖ shard ‖ shard)`,
//!    getters use `blake2_256(getter)`. The digest is rendered as `0x` hex.
//! 2. If the subject (`who`) is a web3 identity, prefix the digest with the
//!    sentence for the operation, ending in `Token: `. Web2 subjects get the
//!    bare digest.
//! 3. Encode for the subject's wallet. Bitcoin and Solana wallets sign UTF-8
//!    text, so they get the sentence as is. EVM and Substrate wallets get the
//!    sentence hex-encoded with a `0x` prefix.

use std::fmt;

use crate::call::{CallKind, TrustedCall, TrustedGetter};
use crate::config::{
    ID_GRAPH_GETTER_MESSAGE, LINK_IDENTITY_MESSAGE, TOKEN_PREFIX, VC_REASSURANCE_MESSAGE,
};
use crate::crypto::to_prefixed_hex;
use crate::identity::Identity;
use crate::{Index, ShardId, H256};

/// How the message is handed to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Plain UTF-8 text.
    Utf8,
    /// `0x` followed by the hex of the UTF-8 bytes.
    Hex,
}

/// Payload for an external signer, plus the digest it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadToSign {
    payload: String,
    message: String,
    digest: H256,
    encoding: PayloadEncoding,
}

impl PayloadToSign {
    /// The string to hand to the wallet.
    pub fn as_str(&self) -> &str {
        &self.payload
    }

    /// The human-readable message before wallet encoding.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The bytes the wallet ends up signing.
    pub fn message_bytes(&self) -> &[u8] {
        self.message.as_bytes()
    }

    pub fn digest(&self) -> &H256 {
        &self.digest
    }

    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }
}

impl fmt::Display for PayloadToSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

/// Sentence placed before the digest for a call kind.
pub fn call_message_prefix(kind: CallKind, credentials: usize) -> String {
    match kind {
        CallKind::LinkIdentity => format!("{LINK_IDENTITY_MESSAGE} {TOKEN_PREFIX}"),
        CallKind::RequestVc | CallKind::RequestBatchVc => {
            let noun = if credentials == 1 { "credential" } else { "credentials" };
            format!(
                "We are going to help you generate {credentials} secure {noun}. {VC_REASSURANCE_MESSAGE} {TOKEN_PREFIX}"
            )
        }
        _ => TOKEN_PREFIX.to_string(),
    }
}

/// Sentence placed before the digest for a trusted getter.
pub fn getter_message_prefix(getter: &TrustedGetter) -> String {
    match getter {
        TrustedGetter::id_graph(_) => format!("{ID_GRAPH_GETTER_MESSAGE} {TOKEN_PREFIX}"),
    }
}

fn render(who: &Identity, prefix: String, digest: H256) -> PayloadToSign {
    let digest_hex = to_prefixed_hex(&digest);
    if who.is_web2() {
        return PayloadToSign {
            payload: digest_hex.clone(),
            message: digest_hex,
            digest,
            encoding: PayloadEncoding::Utf8,
        };
    }

    let message = format!("{prefix}{digest_hex}");
    let (payload, encoding) = if who.is_bitcoin() || who.is_solana() {
        (message.clone(), PayloadEncoding::Utf8)
    } else {
        (to_prefixed_hex(message.as_bytes()), PayloadEncoding::Hex)
    };
    PayloadToSign {
        payload,
        message,
        digest,
        encoding,
    }
}

/// Payload for a trusted call, rendered for the call's subject.
pub fn payload_to_sign(call: &TrustedCall, nonce: Index, shard: &ShardId) -> PayloadToSign {
    let prefix = call_message_prefix(call.kind(), call.credential_count());
    render(call.who(), prefix, call.signing_digest(nonce, shard))
}

/// Payload for a trusted getter, rendered for the getter's sender.
pub fn getter_payload_to_sign(getter: &TrustedGetter) -> PayloadToSign {
    render(getter.sender(), getter_message_prefix(getter), getter.signing_digest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::trusted_call::{
        deactivate_identity, link_identity, request_batch_vc, request_vc, set_identity_networks,
        IdentityStatusParams, LinkIdentityParams, RequestBatchVcParams, RequestVcParams,
        SetIdentityNetworksParams,
    };
    use crate::call::validation::{TwitterValidationData, ValidationData, Web2ValidationData};
    use crate::call::Assertion;
    use crate::crypto::SeededCrypto;
    use crate::identity::{IdentityString, Web3Network};

    const SHARD: ShardId = [0x11; 32];

    fn evm() -> Identity {
        Identity::Evm([0xe0; 20])
    }

    fn substrate() -> Identity {
        Identity::Substrate([0x5b; 32])
    }

    fn bitcoin() -> Identity {
        Identity::Bitcoin([0x02; 33])
    }

    fn twitter() -> Identity {
        Identity::Twitter(IdentityString::new(b"mock_user".to_vec()).unwrap())
    }

    fn hex_to_text(payload: &str) -> String {
        let bytes = hex::decode(payload.strip_prefix("0x").unwrap()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn networks_call(who: Identity, seed: u64) -> TrustedCall {
        set_identity_networks(
            &SeededCrypto::new(seed),
            SetIdentityNetworksParams {
                who,
                identity: Identity::Evm([1; 20]),
                networks: vec![Web3Network::Ethereum],
                hash: [0; 32],
            },
        )
        .unwrap()
        .call
    }

    fn link_call(who: Identity) -> TrustedCall {
        link_identity(
            &SeededCrypto::new(9),
            LinkIdentityParams {
                who,
                identity: twitter(),
                validation: ValidationData::Web2(Web2ValidationData::Twitter(
                    TwitterValidationData::PublicTweet {
                        tweet_id: b"1".to_vec(),
                    },
                )),
                networks: vec![],
                hash: [0; 32],
            },
        )
        .unwrap()
        .call
    }

    fn batch_call(who: Identity, n: usize) -> TrustedCall {
        request_batch_vc(
            &SeededCrypto::new(10),
            RequestBatchVcParams {
                signer: who.clone(),
                who,
                assertions: vec![Assertion::A1; n],
                hash: [0; 32],
            },
        )
        .unwrap()
        .call
    }

    #[test]
    fn test_deterministic() {
        let call = networks_call(evm(), 1);
        assert_eq!(payload_to_sign(&call, 3, &SHARD), payload_to_sign(&call, 3, &SHARD));
        let again = networks_call(evm(), 1);
        assert_eq!(
            payload_to_sign(&call, 3, &SHARD).as_str(),
            payload_to_sign(&again, 3, &SHARD).as_str()
        );
    }

    #[test]
    fn test_class_asymmetry() {
        for who in [evm(), substrate()] {
            let p = payload_to_sign(&networks_call(who, 2), 0, &SHARD);
            assert!(p.as_str().starts_with("0x"));
            assert_eq!(p.encoding(), PayloadEncoding::Hex);
            assert_eq!(hex_to_text(p.as_str()), p.message());
        }
        for who in [bitcoin(), Identity::Solana([3; 32])] {
            let p = payload_to_sign(&networks_call(who, 2), 0, &SHARD);
            assert!(!p.as_str().starts_with("0x"));
            assert_eq!(p.as_str(), p.message());
        }
    }

    #[test]
    fn test_other_calls_get_token_only() {
        let call = networks_call(bitcoin(), 3);
        let p = payload_to_sign(&call, 0, &SHARD);
        assert_eq!(
            p.as_str(),
            format!("Token: {}", to_prefixed_hex(&call.signing_digest(0, &SHARD)))
        );

        let call = deactivate_identity(
            &SeededCrypto::new(4),
            IdentityStatusParams {
                who: bitcoin(),
                identity: twitter(),
                hash: [0; 32],
            },
        )
        .unwrap()
        .call;
        assert!(payload_to_sign(&call, 0, &SHARD).as_str().starts_with("Token: 0x"));
    }

    #[test]
    fn test_link_identity_sentence() {
        let call = link_call(bitcoin());
        let p = payload_to_sign(&call, 5, &SHARD);
        let digest = to_prefixed_hex(&call.signing_digest(5, &SHARD));
        assert_eq!(
            p.as_str(),
            format!("By linking your identity to our platform, you're taking a step towards a more integrated experience. Please be assured, this process is safe and involves no transactions of your assets. Token: {digest}")
        );
    }

    #[test]
    fn test_batch_vc_sentence_for_evm() {
        let call = batch_call(evm(), 3);
        let p = payload_to_sign(&call, 0, &SHARD);
        let digest = to_prefixed_hex(&call.signing_digest(0, &SHARD));
        assert_eq!(
            hex_to_text(p.as_str()),
            format!("We are going to help you generate 3 secure credentials. Please be assured, this process is safe and involves no transactions of your assets. Token: {digest}")
        );
    }

    #[test]
    fn test_single_credential_is_singular() {
        let single = request_vc(
            &SeededCrypto::new(11),
            RequestVcParams {
                who: bitcoin(),
                assertion: Assertion::A1,
                hash: [0; 32],
            },
        )
        .unwrap()
        .call;
        let p = payload_to_sign(&single, 0, &SHARD);
        assert!(p.as_str().starts_with("We are going to help you generate 1 secure credential. "));

        let batch_of_one = payload_to_sign(&batch_call(bitcoin(), 1), 0, &SHARD);
        assert!(batch_of_one.as_str().contains("1 secure credential. "));
    }

    #[test]
    fn test_web2_subject_gets_bare_digest() {
        let call = link_call(twitter());
        let p = payload_to_sign(&call, 0, &SHARD);
        assert_eq!(p.as_str(), to_prefixed_hex(&call.signing_digest(0, &SHARD)));
        assert!(!p.as_str().contains("Token"));
    }

    #[test]
    fn test_getter_payload() {
        let getter = TrustedGetter::id_graph(bitcoin());
        let p = getter_payload_to_sign(&getter);
        assert!(p.as_str().starts_with("Our team is ready to support you"));
        assert!(p
            .as_str()
            .ends_with(&format!("Token: {}", to_prefixed_hex(&getter.signing_digest()))));

        let evm_getter = getter_payload_to_sign(&TrustedGetter::id_graph(evm()));
        assert!(evm_getter.as_str().starts_with("0x"));
    }
}
