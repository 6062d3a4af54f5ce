//! End-to-end tests against the in-memory enclave.
//!
//! Each test drives the public client API the way an application would:
//! prepare a call, hand the payload to a "wallet", send the signature, and
//! check the decoded result and the enclave's state. The mock enclave does
//! not verify signatures, so the wallet here returns fixed bytes of the
//! right length.

use std::sync::Arc;

use idgraph_protocol::call::{Assertion, MultiSignature, ValidationData};
use idgraph_protocol::config::{ClientConfig, DecodeMode};
use idgraph_protocol::crypto::{to_prefixed_hex, SeededCrypto};
use idgraph_protocol::error::{ClientError, InputError, ProtocolError, TransportError};
use idgraph_protocol::identity::{
    create_identity, IdGraph, Identity, IdentityDescriptor, IdentityKind, IdentityStatus,
    Web3Network,
};
use idgraph_protocol::payload::PayloadEncoding;
use idgraph_protocol::request::{
    CallOutcome, EnclaveClient, EnclaveTransport, MockEnclave, RequestState, RpcMethod,
};
use idgraph_protocol::response::StfError;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const SHARD: [u8; 32] = [0x5a; 32];
const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const BOB_EVM: &str = "0x90f79bf6eb2c4f870365e785982e1f101e93b906";

fn client() -> EnclaveClient<MockEnclave> {
    client_with(ClientConfig::default())
}

fn client_with(config: ClientConfig) -> EnclaveClient<MockEnclave> {
    let enclave = MockEnclave::with_crypto(SHARD, Arc::new(SeededCrypto::new(1)));
    EnclaveClient::with_crypto(enclave, config, Arc::new(SeededCrypto::new(2)))
}

fn alice() -> Identity {
    create_identity(IdentityDescriptor::new(ALICE, IdentityKind::Substrate)).unwrap()
}

fn bob() -> Identity {
    create_identity(IdentityDescriptor::new(BOB_EVM, IdentityKind::Evm)).unwrap()
}

/// sr25519-sized signature, as a wallet would hand it back.
fn substrate_signature() -> String {
    to_prefixed_hex(&[0x11; 64])
}

fn evm_proof(identity: &Identity) -> ValidationData {
    ValidationData::web3(identity, b"challenge".to_vec(), MultiSignature::Ethereum([0x22; 65])).unwrap()
}

async fn link_bob(client: &EnclaveClient<MockEnclave>) -> CallOutcome {
    let prepared = client
        .link_identity(&alice(), bob(), evm_proof(&bob()), Some(vec![Web3Network::Ethereum]))
        .await
        .unwrap();
    client.send(prepared, &substrate_signature()).await.unwrap()
}

// ---------------------------------------------------------------------------
// 1. Link Identity Round Trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn link_identity_round_trip() {
    let client = client();

    let prepared = client
        .link_identity(&alice(), bob(), evm_proof(&bob()), Some(vec![Web3Network::Ethereum]))
        .await
        .unwrap();
    assert_eq!(prepared.nonce(), 0);
    assert_eq!(prepared.shard(), &SHARD);
    assert_eq!(prepared.state(), RequestState::Constructed);
    assert!(prepared.tx_hash().starts_with("0x"));
    assert_eq!(prepared.tx_hash().len(), 66);

    // Substrate wallets get the sentence hex-encoded.
    let payload = prepared.payload_to_sign();
    assert_eq!(payload.encoding(), PayloadEncoding::Hex);
    assert!(payload.message().starts_with("By linking your identity"));
    assert!(payload.message().contains("Token: 0x"));

    let outcome = client
        .send(prepared, &substrate_signature())
        .await
        .unwrap()
        .into_mutation()
        .unwrap();

    let graph = client.transport().id_graph(&alice());
    assert_eq!(outcome.mutated_identities, graph);
    assert_eq!(outcome.id_graph_hash, graph.hash());
    assert!(graph.contains(&alice()));
    assert_eq!(
        graph.get(&bob()).unwrap().web3networks,
        vec![Web3Network::Ethereum]
    );

    let request = client.transport().last_request().unwrap();
    assert_eq!(request.method, RpcMethod::SubmitAndWatch);
    assert_eq!(request.id, 1);
}

// ---------------------------------------------------------------------------
// 2. Nonce Consumption
// ---------------------------------------------------------------------------

#[tokio::test]
async fn each_call_consumes_one_nonce() {
    let client = client();
    assert_eq!(client.nonce(&alice()).await.unwrap(), 0);

    link_bob(&client).await;
    assert_eq!(client.nonce(&alice()).await.unwrap(), 1);

    let prepared = client.deactivate_identity(&alice(), bob()).await.unwrap();
    assert_eq!(prepared.nonce(), 1);
    client.send(prepared, &substrate_signature()).await.unwrap();
    assert_eq!(client.nonce(&alice()).await.unwrap(), 2);
}

#[tokio::test]
async fn stale_prepared_request_is_rejected() {
    let client = client();
    let first = client.deactivate_identity(&alice(), bob()).await.unwrap();
    let second = client.deactivate_identity(&alice(), bob()).await.unwrap();
    assert_eq!(first.nonce(), second.nonce());

    link_bob(&client).await;
    drop(first);

    let err = client.send(second, &substrate_signature()).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Protocol(ProtocolError::Stf(StfError::InvalidNonce(1, 0)))
    );
}

// ---------------------------------------------------------------------------
// 3. Activate / Deactivate / Set Networks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identity_status_and_networks() {
    let client = client();
    link_bob(&client).await;

    let prepared = client.deactivate_identity(&alice(), bob()).await.unwrap();
    let payload = prepared.payload_to_sign();
    assert_eq!(payload.message(), format!("Token: {}", to_prefixed_hex(payload.digest())));
    client.send(prepared, &substrate_signature()).await.unwrap();
    assert_eq!(
        client.transport().id_graph(&alice()).get(&bob()).unwrap().status,
        IdentityStatus::Inactive
    );

    let prepared = client.activate_identity(&alice(), bob()).await.unwrap();
    client.send(prepared, &substrate_signature()).await.unwrap();
    assert!(client.transport().id_graph(&alice()).get(&bob()).unwrap().is_active());

    let prepared = client
        .set_identity_networks(&alice(), bob(), vec![Web3Network::Bsc, Web3Network::Polygon])
        .await
        .unwrap();
    let outcome = client
        .send(prepared, &substrate_signature())
        .await
        .unwrap()
        .into_mutation()
        .unwrap();
    assert_eq!(
        outcome.mutated_identities.get(&bob()).unwrap().web3networks,
        vec![Web3Network::Bsc, Web3Network::Polygon]
    );
}

#[tokio::test]
async fn mismatched_networks_never_reach_the_enclave() {
    let client = client();
    let err = client
        .set_identity_networks(&alice(), bob(), vec![Web3Network::Polkadot])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Input(InputError::NetworkMismatch { .. })));
    assert!(client.transport().last_request().is_none());
}

#[tokio::test]
async fn unknown_identity_cannot_be_deactivated() {
    let client = client();
    let prepared = client.deactivate_identity(&alice(), bob()).await.unwrap();
    let err = client.send(prepared, &substrate_signature()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Protocol(ProtocolError::Stf(StfError::DeactivateIdentityFailed(_)))
    ));
}

// ---------------------------------------------------------------------------
// 4. Default Networks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn link_without_networks_uses_defaults() {
    let client = client();
    let prepared = client
        .link_identity(&alice(), bob(), evm_proof(&bob()), None)
        .await
        .unwrap();
    client.send(prepared, &substrate_signature()).await.unwrap();
    assert_eq!(
        client.transport().id_graph(&alice()).get(&bob()).unwrap().web3networks,
        bob().default_web3networks()
    );
}

#[tokio::test]
async fn link_without_networks_can_be_refused() {
    let config = ClientConfig {
        default_networks_on_link: false,
        ..ClientConfig::default()
    };
    let client = client_with(config);
    let err = client
        .link_identity(&alice(), bob(), evm_proof(&bob()), None)
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::Input(InputError::MissingField("networks")));
}

// ---------------------------------------------------------------------------
// 5. Graph Hash Integrity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tampered_hash_fails_closed() {
    let client = client();
    client.transport().corrupt_next_hash();

    let prepared = client
        .link_identity(&alice(), bob(), evm_proof(&bob()), Some(vec![Web3Network::Ethereum]))
        .await
        .unwrap();
    let err = client.send(prepared, &substrate_signature()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Protocol(ProtocolError::IdGraphHashMismatch { .. })
    ));
}

#[tokio::test]
async fn delta_results_verify_against_known_graph() {
    let client = client();
    link_bob(&client).await;
    client.transport().ship_deltas(true);

    let known: IdGraph = client.transport().id_graph(&alice());
    let prepared = client
        .set_identity_networks(&alice(), bob(), vec![Web3Network::Arbitrum])
        .await
        .unwrap()
        .with_known_graph(known);
    let outcome = client
        .send(prepared, &substrate_signature())
        .await
        .unwrap()
        .into_mutation()
        .unwrap();
    assert_eq!(outcome.mutated_identities.len(), 1);
    assert_eq!(outcome.id_graph_hash, client.transport().id_graph(&alice()).hash());

    // Without the known graph the delta alone does not match the full hash.
    let prepared = client.activate_identity(&alice(), bob()).await.unwrap();
    assert!(client.send(prepared, &substrate_signature()).await.is_err());
}

// ---------------------------------------------------------------------------
// 6. Getters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn id_graph_getters() {
    let client = client();
    assert_eq!(client.id_graph_hash(&alice()).await.unwrap(), None);

    link_bob(&client).await;
    let expected = client.transport().id_graph(&alice());
    assert_eq!(client.id_graph_hash(&alice()).await.unwrap(), Some(expected.hash()));

    let payload = client.id_graph_payload(&alice());
    assert!(payload.message().starts_with("Our team is ready to support you"));
    let graph = client.id_graph(&alice(), &substrate_signature()).await.unwrap();
    assert_eq!(graph, expected);
}

#[tokio::test]
async fn lenient_nonce_mode_is_configurable() {
    let config = ClientConfig {
        nonce_decode_mode: DecodeMode::Lenient,
        ..ClientConfig::default()
    };
    let client = client_with(config);
    assert_eq!(client.nonce(&bob()).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// 7. Verifiable Credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_vc_results_are_ordered() {
    let client = client();
    let assertions = vec![Assertion::A1, Assertion::A6, Assertion::A1];
    let prepared = client
        .request_batch_vc(&alice(), &alice(), assertions)
        .await
        .unwrap();
    assert!(prepared
        .payload_to_sign()
        .message()
        .starts_with("We are going to help you generate 3 secure credentials."));

    let outcomes = client
        .send(prepared, &substrate_signature())
        .await
        .unwrap()
        .into_credentials()
        .unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().map(|o| o.idx).collect::<Vec<_>>(), vec![0, 1, 2]);

    let first = outcomes[0].result.as_ref().unwrap();
    let doc: serde_json::Value = serde_json::from_str(first.as_str().unwrap()).unwrap();
    assert_eq!(doc["credentialSubject"]["assertion"], "a1");
    assert!(first.pre_mutated_id_graph.is_some());

    // The third entry repeats the first.
    assert!(matches!(
        outcomes[2].result,
        Err(ProtocolError::VcRequestFailed { idx: 2, len: 3, .. })
    ));
    assert_eq!(client.transport().last_request().unwrap().method, RpcMethod::RequestVc);
}

#[tokio::test]
async fn single_vc_request() {
    let client = client();
    link_bob(&client).await;

    let prepared = client.request_vc(&alice(), Assertion::A14).await.unwrap();
    assert!(prepared
        .payload_to_sign()
        .message()
        .starts_with("We are going to help you generate 1 secure credential."));
    let outcomes = client
        .send(prepared, &substrate_signature())
        .await
        .unwrap()
        .into_credentials()
        .unwrap();
    let issued = outcomes[0].result.as_ref().unwrap();
    assert_eq!(issued.pre_mutated_id_graph, None);
    assert_eq!(issued.pre_id_graph_hash, client.transport().id_graph(&alice()).hash());
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let client = client();
    let err = client
        .request_batch_vc(&alice(), &alice(), vec![Assertion::A1; 129])
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::Input(InputError::InvalidAssertionCount(129)));
}

// ---------------------------------------------------------------------------
// 8. Transport Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transport_timeout_is_reported_once() {
    let client = client();
    let prepared = client
        .link_identity(&alice(), bob(), evm_proof(&bob()), Some(vec![Web3Network::Ethereum]))
        .await
        .unwrap();
    client.transport().fail_next(TransportError::Timeout { elapsed_ms: 30_000 });

    let err = client.send(prepared, &substrate_signature()).await.unwrap_err();
    assert!(err.is_transport());
    // No retry: the enclave never saw the call.
    assert!(client.transport().id_graph(&alice()).is_empty());
    assert_eq!(client.transport().nonce_of(&alice()), 0);
}

#[tokio::test]
async fn wrong_signature_length_is_rejected_before_sending() {
    let client = client();
    let prepared = client.deactivate_identity(&alice(), bob()).await.unwrap();
    let before = client.transport().last_request();
    let err = client.send(prepared, "0x1234").await.unwrap_err();
    assert!(matches!(err, ClientError::Input(InputError::InvalidSignature(_))));
    assert_eq!(client.transport().last_request(), before);
}

#[tokio::test]
async fn shard_comes_from_the_transport() {
    let client = client();
    assert_eq!(client.transport().get_shard().await.unwrap(), SHARD);
}
