//! The context shared by every command: the deployer's client, the network,
//! and the locations of artifacts and deployments

use std::path::PathBuf;

use alloy::{primitives::Address, providers::Provider};
use tracing::{info, warn};

use crate::{
    errors::ScriptError,
    utils::{is_local_chain, setup_client, Client},
    verify::EtherscanVerifier,
};

/// The state a command runs against
pub struct ScriptContext {
    /// The client carrying the deployer's wallet
    pub client: Client,
    /// The address of the deployer
    pub deployer: Address,
    /// The chain the client is connected to
    pub chain_id: u64,
    /// The directory holding the Hardhat compilation artifacts
    pub artifacts_dir: PathBuf,
    /// The path of the ERC1967 proxy artifact
    pub proxy_artifact: PathBuf,
    /// The path of the deployments file
    pub deployments_path: PathBuf,
    /// The source verification client, absent when verification is disabled
    pub verifier: Option<EtherscanVerifier>,
}

/// The configuration from which a [`ScriptContext`] is built
pub struct ContextConfig {
    /// Private key of the deployer
    pub priv_key: String,
    /// Network RPC URL
    pub rpc_url: String,
    /// The directory holding the Hardhat compilation artifacts
    pub artifacts_dir: PathBuf,
    /// The path of the ERC1967 proxy artifact
    pub proxy_artifact: PathBuf,
    /// The path of the deployments file
    pub deployments_path: PathBuf,
    /// The block explorer API key
    pub etherscan_api_key: Option<String>,
    /// The block explorer API endpoint
    pub etherscan_api_url: String,
}

impl ScriptContext {
    /// Connect to the network and set up the verification client
    pub async fn new(config: ContextConfig) -> Result<Self, ScriptError> {
        let (client, deployer) = setup_client(&config.priv_key, &config.rpc_url)?;
        let chain_id = client
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        info!("Deploying from {deployer:#x} on chain {chain_id}");

        let verifier = match config.etherscan_api_key {
            _ if is_local_chain(chain_id) => {
                warn!("Connected to a local node, source verification is disabled");
                None
            }
            Some(api_key) => Some(
                EtherscanVerifier::new(&config.etherscan_api_url, &api_key, chain_id)
                    .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?,
            ),
            None => {
                warn!("No block explorer API key configured, source verification is disabled");
                None
            }
        };

        Ok(Self {
            client,
            deployer,
            chain_id,
            artifacts_dir: config.artifacts_dir,
            proxy_artifact: config.proxy_artifact,
            deployments_path: config.deployments_path,
            verifier,
        })
    }
}
