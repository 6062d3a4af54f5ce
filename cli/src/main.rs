// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # IdGraph CLI
//!
//! Entry point for the `idgraph` binary. Parses arguments, initializes
//! logging, loads the client configuration and dispatches:
//!
//! - `identity`  normalize an identity, print its encoding and DID
//! - `challenge` derive the ownership challenge code
//! - `payload`   assemble a call and print the payload to sign
//! - `demo`      round trip against the in-process mock enclave
//! - `version`   print build version information
//!
//! Results go to stdout as JSON; logs go to stderr.

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use parity_scale_codec::Encode;
use serde_json::{json, Value};

use idgraph_protocol::call::{
    decode_signature, trusted_call, Assertion, AssembledCall, IdentityStatusParams,
    LinkIdentityParams, MultiSignature, RequestBatchVcParams, RequestVcParams,
    SetIdentityNetworksParams, ValidationData,
};
use idgraph_protocol::config::{ClientConfig, JSONRPC_VERSION};
use idgraph_protocol::crypto::{from_hex, to_prefixed_hex, CryptoContext, OsCrypto};
use idgraph_protocol::identity::IdentityDescriptor;
use idgraph_protocol::payload::{challenge_code, payload_to_sign};
use idgraph_protocol::request::{generate_tx_hash, MockEnclave};
use idgraph_protocol::{create_identity, EnclaveClient, Identity, IdentityKind, ShardId};

use cli::{CallChoice, Commands, IdGraphCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = IdGraphCli::parse();
    logging::init_logging("idgraph=info,idgraph_protocol=info", cli.log_format);

    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    let output = match cli.command {
        Commands::Identity(args) => describe_identity(args)?,
        Commands::Challenge(args) => challenge(args)?,
        Commands::Payload(args) => build_payload(args, &config)?,
        Commands::Demo => run_demo(config).await?,
        Commands::Version => {
            print_version();
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_identity(address: &str, kind: IdentityKind) -> Result<Identity> {
    create_identity(IdentityDescriptor::new(address, kind))
        .with_context(|| format!("invalid {kind} identity {address:?}"))
}

fn describe_identity(args: cli::IdentityArgs) -> Result<Value> {
    let identity = parse_identity(&args.address, args.kind)?;
    let networks: Vec<String> = identity
        .default_web3networks()
        .iter()
        .map(|n| n.to_string())
        .collect();
    Ok(json!({
        "kind": identity.kind().as_str(),
        "encoded": to_prefixed_hex(&identity.encode()),
        "did": identity.to_did()?,
        "hash": to_prefixed_hex(&identity.hash()),
        "default_networks": networks,
    }))
}

fn challenge(args: cli::ChallengeArgs) -> Result<Value> {
    let signer = parse_identity(&args.signer, args.signer_kind)?;
    let target = parse_identity(&args.target, args.target_kind)?;
    let code = challenge_code(&signer, &target, args.nonce, !args.raw);
    Ok(json!({
        "nonce": args.nonce,
        "challenge_code": code,
    }))
}

fn parse_shard(raw: &str) -> Result<ShardId> {
    let bytes = from_hex(raw).context("shard is not valid hex")?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("shard must be 32 bytes, got {len}"))
}

fn build_payload(args: cli::PayloadArgs, config: &ClientConfig) -> Result<Value> {
    let shard = parse_shard(&args.shard)?;
    let who = parse_identity(&args.who, args.who_kind)?;
    let ctx = OsCrypto;
    let hash = generate_tx_hash(&ctx);

    let target = || -> Result<Identity> {
        match (&args.identity, args.identity_kind) {
            (Some(address), Some(kind)) => parse_identity(address, kind),
            _ => bail!("--identity and --identity-kind are required for {:?}", args.call),
        }
    };

    let assembled: AssembledCall = match args.call {
        CallChoice::LinkIdentity => {
            let identity = target()?;
            let (Some(message), Some(signature)) = (&args.proof_message, &args.proof_signature)
            else {
                bail!("--proof-message and --proof-signature are required to link an identity");
            };
            let signature = decode_signature(&identity, signature)
                .context("proof signature does not fit the linked identity")?;
            let validation =
                ValidationData::web3(&identity, message.as_bytes().to_vec(), signature)?;
            let networks = if !args.networks.is_empty() {
                args.networks.clone()
            } else if config.default_networks_on_link {
                identity.default_web3networks()
            } else {
                bail!("--networks is required when default networks are disabled");
            };
            trusted_call::link_identity(
                &ctx,
                LinkIdentityParams {
                    who: who.clone(),
                    identity,
                    validation,
                    networks,
                    hash,
                },
            )?
        }
        CallChoice::DeactivateIdentity | CallChoice::ActivateIdentity => {
            let params = IdentityStatusParams {
                who: who.clone(),
                identity: target()?,
                hash,
            };
            if args.call == CallChoice::ActivateIdentity {
                trusted_call::activate_identity(&ctx, params)?
            } else {
                trusted_call::deactivate_identity(&ctx, params)?
            }
        }
        CallChoice::SetIdentityNetworks => trusted_call::set_identity_networks(
            &ctx,
            SetIdentityNetworksParams {
                who: who.clone(),
                identity: target()?,
                networks: args.networks.clone(),
                hash,
            },
        )?,
        CallChoice::RequestVc => {
            let [assertion] = args.assertions.as_slice() else {
                bail!("request-vc takes exactly one --assertion");
            };
            trusted_call::request_vc(
                &ctx,
                RequestVcParams {
                    who: who.clone(),
                    assertion: assertion.clone(),
                    hash,
                },
            )?
        }
        CallChoice::RequestBatchVc => trusted_call::request_batch_vc(
            &ctx,
            RequestBatchVcParams {
                signer: who.clone(),
                who: who.clone(),
                assertions: args.assertions.clone(),
                hash,
            },
        )?,
    };

    let call = &assembled.call;
    let payload = payload_to_sign(call, args.nonce, &shard);
    tracing::info!(kind = %call.kind(), nonce = args.nonce, "payload assembled");

    Ok(json!({
        "kind": call.kind().as_str(),
        "nonce": args.nonce,
        "shard": to_prefixed_hex(&shard),
        "tx_hash": to_prefixed_hex(&hash),
        "call": to_prefixed_hex(&call.encode()),
        "digest": to_prefixed_hex(payload.digest()),
        "payload_to_sign": payload.as_str(),
    }))
}

/// Drives a link and a credential request through the mock enclave. The
/// mock does not check signatures, so both are placeholders.
async fn run_demo(config: ClientConfig) -> Result<Value> {
    let ctx: Arc<dyn CryptoContext> = Arc::new(OsCrypto);
    let shard: ShardId = idgraph_protocol::crypto::random_bytes::<32>(ctx.as_ref());
    let client = EnclaveClient::with_crypto(MockEnclave::new(shard), config, ctx);

    let alice = parse_identity(
        "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
        IdentityKind::Substrate,
    )?;
    let bob = parse_identity(
        "0x90f79bf6eb2c4f870365e785982e1f101e93b906",
        IdentityKind::Evm,
    )?;
    let placeholder_sig = to_prefixed_hex(&[0u8; 64]);

    let nonce = client.nonce(&alice).await?;
    let code = challenge_code(&alice, &bob, nonce, true);
    let validation = ValidationData::web3(
        &bob,
        code.clone().into_bytes(),
        MultiSignature::Ethereum([0; 65]),
    )?;

    let prepared = client.link_identity(&alice, bob, validation, None).await?;
    tracing::info!(tx_hash = %prepared.tx_hash(), "link prepared");
    let linked = client
        .send(prepared, &placeholder_sig)
        .await
        .context("link_identity failed")?
        .into_mutation()
        .ok_or_else(|| anyhow!("link_identity returned credentials"))?;

    let prepared = client.request_vc(&alice, Assertion::A1).await?;
    let credentials = client
        .send(prepared, &placeholder_sig)
        .await
        .context("request_vc failed")?
        .into_credentials()
        .ok_or_else(|| anyhow!("request_vc returned a mutation"))?;

    let mut vcs = Vec::with_capacity(credentials.len());
    for outcome in credentials {
        let issued = outcome.result?;
        let document: Value = serde_json::from_str(issued.as_str()?)
            .context("credential is not a JSON document")?;
        vcs.push(document);
    }

    let graph: Vec<String> = linked
        .mutated_identities
        .identities()
        .map(Identity::to_did)
        .collect::<Result<_, _>>()?;
    Ok(json!({
        "challenge_code": code,
        "linked": graph,
        "id_graph_hash": to_prefixed_hex(&linked.id_graph_hash),
        "nonce_after": client.nonce(&alice).await?,
        "credentials": vcs,
    }))
}

fn print_version() {
    println!("idgraph   {}", env!("CARGO_PKG_VERSION"));
    println!("json-rpc  {}", JSONRPC_VERSION);
}
