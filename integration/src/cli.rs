//! Definition of the CLI arguments for integration tests

use std::path::PathBuf;

use clap::Parser;
use scripts::constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_PROXY_ARTIFACT};

use crate::constants::{DEFAULT_DEPLOYMENTS_PATH, DEFAULT_DEVNET_HOSTPORT, DEFAULT_DEVNET_PKEY};

/// CLI tool for running integration tests against a running devnet node.
///
/// Assumes that the contracts have been compiled, the tests deploy them.
#[derive(Parser)]
pub(crate) struct Cli {
    /// Test to run, all tests are run if omitted
    #[arg(short, long)]
    pub(crate) test: Option<String>,

    /// Directory holding the Hardhat compilation artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub(crate) artifacts: PathBuf,

    /// Path to the compilation artifact of the ERC1967 proxy
    #[arg(long, default_value = DEFAULT_PROXY_ARTIFACT)]
    pub(crate) proxy_artifact: PathBuf,

    /// Path to the file in which the tests record deployed addresses
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub(crate) deployments: PathBuf,

    /// Devnet private key, defaults to the first Anvil account
    #[arg(short, long, default_value = DEFAULT_DEVNET_PKEY)]
    pub(crate) priv_key: String,

    /// Devnet RPC URL
    #[arg(short, long, default_value = DEFAULT_DEVNET_HOSTPORT)]
    pub(crate) rpc_url: String,
}
