//! # CLI Interface
//!
//! Command-line structure for `idgraph` using `clap` derive. Every command
//! is offline except `demo`, which drives a full round trip against the
//! in-process mock enclave.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use idgraph_protocol::call::Assertion;
use idgraph_protocol::{IdentityKind, Web3Network};

use crate::logging::LogFormat;

/// IdGraph enclave client.
///
/// Normalizes identities, derives challenge codes and builds the exact
/// payload a wallet has to sign for a trusted call.
#[derive(Parser, Debug)]
#[command(
    name = "idgraph",
    about = "IdGraph enclave client",
    version,
    propagate_version = true
)]
pub struct IdGraphCli {
    /// Log format on stderr: pretty or json.
    #[arg(long, global = true, env = "IDGRAPH_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Client configuration file (JSON). Defaults apply when omitted.
    #[arg(long, short = 'c', global = true, env = "IDGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize an address or handle and print its encoding and DID.
    Identity(IdentityArgs),
    /// Print the challenge code a wallet signs to prove ownership.
    Challenge(ChallengeArgs),
    /// Assemble a trusted call and print what the wallet must sign.
    Payload(PayloadArgs),
    /// Link an identity and request a credential against a mock enclave.
    Demo,
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct IdentityArgs {
    /// Identity kind: twitter, discord, github, email, substrate, evm,
    /// bitcoin or solana.
    #[arg(long, short = 'k')]
    pub kind: IdentityKind,

    /// Address (web3) or handle (web2).
    pub address: String,
}

#[derive(Parser, Debug)]
pub struct ChallengeArgs {
    #[arg(long)]
    pub signer_kind: IdentityKind,

    /// Identity that will send the link request.
    #[arg(long)]
    pub signer: String,

    #[arg(long)]
    pub target_kind: IdentityKind,

    /// Identity being linked.
    #[arg(long)]
    pub target: String,

    /// Current enclave nonce of the signer.
    #[arg(long, default_value_t = 0)]
    pub nonce: u32,

    /// Print the digest without the `Token: ` marker.
    #[arg(long)]
    pub raw: bool,
}

/// Trusted call to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallChoice {
    LinkIdentity,
    DeactivateIdentity,
    ActivateIdentity,
    SetIdentityNetworks,
    RequestVc,
    RequestBatchVc,
}

#[derive(Parser, Debug)]
pub struct PayloadArgs {
    #[arg(long, value_enum)]
    pub call: CallChoice,

    #[arg(long)]
    pub who_kind: IdentityKind,

    /// Primary identity of the graph; also the signer.
    #[arg(long)]
    pub who: String,

    #[arg(long)]
    pub identity_kind: Option<IdentityKind>,

    /// Identity the call acts on. Required for link, activate, deactivate
    /// and set-identity-networks.
    #[arg(long)]
    pub identity: Option<String>,

    /// Comma-separated networks. Link falls back to the identity's defaults.
    #[arg(long, value_delimiter = ',')]
    pub networks: Vec<Web3Network>,

    /// Assertion such as `a1` or `a7:10`. Repeat for batch requests.
    #[arg(long = "assertion")]
    pub assertions: Vec<Assertion>,

    /// Enclave nonce of the signer.
    #[arg(long, default_value_t = 0)]
    pub nonce: u32,

    /// Hex-encoded 32-byte shard identifier.
    #[arg(long, env = "IDGRAPH_SHARD")]
    pub shard: String,

    /// Message the linked wallet signed (link only).
    #[arg(long)]
    pub proof_message: Option<String>,

    /// Signature of the linked wallet over `proof_message` (link only).
    #[arg(long)]
    pub proof_signature: Option<String>,
}
