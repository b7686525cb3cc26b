//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use alloy::primitives::{Address, Bytes};
use clap::{Args, Parser, Subcommand};

use crate::{
    artifacts::load_artifact,
    calldata::{constructor_calldata, parse_calldata},
    commands::{
        deploy_contract, deploy_proxy, deploy_public_sale, deploy_simple, grant_role,
        print_implementation, resolve_deployed_code, update_public_sale, upgrade_proxy,
        verify_contract,
    },
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_ETHERSCAN_API_URL,
        DEFAULT_PROXY_ARTIFACT, NUM_UPGRADE_CONFIRMATIONS,
    },
    context::{ContextConfig, ScriptContext},
    errors::ScriptError,
    types::{DeployableContract, Role},
};

/// Scripts for deploying, upgrading, and verifying the public sale contracts
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: String,

    /// Directory holding the Hardhat compilation artifacts
    #[arg(long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Path to the compilation artifact of the ERC1967 proxy
    #[arg(long, env = "PROXY_ARTIFACT", default_value = DEFAULT_PROXY_ARTIFACT)]
    pub proxy_artifact: PathBuf,

    /// Path to the file in which deployed addresses are recorded
    #[arg(short, long, env = "DEPLOYMENTS_PATH", default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments: PathBuf,

    /// Block explorer API key, verification is skipped without one
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Block explorer API endpoint
    #[arg(long, env = "ETHERSCAN_API_URL", default_value = DEFAULT_ETHERSCAN_API_URL)]
    pub etherscan_api_url: String,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Split the CLI into the context configuration and the command to run
    pub fn into_parts(self) -> (ContextConfig, Command) {
        let config = ContextConfig {
            priv_key: self.priv_key,
            rpc_url: self.rpc_url,
            artifacts_dir: self.artifacts,
            proxy_artifact: self.proxy_artifact,
            deployments_path: self.deployments,
            etherscan_api_key: self.etherscan_api_key,
            etherscan_api_url: self.etherscan_api_url,
        };

        (config, self.command)
    }
}

/// The scripts that can be run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract without a proxy
    Deploy(DeployArgs),
    /// Deploy a contract behind a UUPS proxy
    DeployProxy(DeployArgs),
    /// Upgrade a UUPS proxy to a new implementation
    Upgrade(UpgradeArgs),
    /// Verify the source code of a deployed contract
    Verify(VerifyArgs),
    /// Print the implementation behind a proxy
    Implementation(ImplementationArgs),
    /// Grant an access control role
    GrantRole(GrantRoleArgs),
    /// Deploy the public sale behind a proxy
    DeployPublicSale(DeployPublicSaleArgs),
    /// Upgrade the public sale proxy
    UpdatePublicSale,
    /// Deploy the NFT collection
    DeployNft,
    /// Deploy the token
    DeployMiPrimerToken,
    /// Deploy the USDC stablecoin
    DeployUsdc,
}

impl Command {
    /// Run the script against the given context
    pub async fn run(self, ctx: &ScriptContext) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => {
                let confirmations = args
                    .confirmations
                    .unwrap_or_else(|| args.contract.deploy_confirmations());
                deploy_contract(ctx, args.contract, &args.args, confirmations, !args.skip_verify)
                    .await?;
            }
            Command::DeployProxy(args) => {
                let confirmations = args
                    .confirmations
                    .unwrap_or_else(|| args.contract.deploy_confirmations());
                deploy_proxy(ctx, args.contract, &args.args, confirmations, !args.skip_verify)
                    .await?;
            }
            Command::Upgrade(args) => {
                let calldata = parse_calldata(args.calldata.as_deref())?;
                upgrade_proxy(
                    ctx,
                    args.contract,
                    args.proxy,
                    calldata,
                    args.confirmations,
                    !args.skip_verify,
                )
                .await?;
            }
            Command::Verify(args) => {
                if ctx.verifier.is_none() {
                    return Err(ScriptError::Verification(
                        "verification is disabled on this network or without an API key"
                            .to_string(),
                    ));
                }

                let address =
                    resolve_deployed_code(&ctx.deployments_path, args.contract, args.address)?;
                let artifact = load_artifact(&ctx.artifacts_dir, args.contract.artifact_name())?;
                let constructor_args =
                    Bytes::from(constructor_calldata(&artifact.abi, &args.args)?);
                verify_contract(ctx, &artifact, address, constructor_args).await?;
            }
            Command::Implementation(args) => {
                print_implementation(ctx, &args.name, args.proxy).await?;
            }
            Command::GrantRole(args) => {
                grant_role(ctx, args.contract, args.role, args.account).await?;
            }
            Command::DeployPublicSale(args) => deploy_public_sale(ctx, args.token).await?,
            Command::UpdatePublicSale => update_public_sale(ctx).await?,
            Command::DeployNft => deploy_simple(ctx, DeployableContract::MiPrimerNft).await?,
            Command::DeployMiPrimerToken => {
                deploy_simple(ctx, DeployableContract::MiPrimerToken).await?
            }
            Command::DeployUsdc => deploy_simple(ctx, DeployableContract::UsdCoin).await?,
        }

        Ok(())
    }
}

/// Deploy a contract, either directly or behind a proxy
#[derive(Args)]
pub struct DeployArgs {
    /// The contract to deploy
    #[arg(short, long)]
    pub contract: DeployableContract,

    /// Constructor arguments, or initializer arguments when deploying
    /// behind a proxy
    #[arg(short, long, num_args = 0..)]
    pub args: Vec<String>,

    /// Number of confirmations to wait for, defaults to the contract's
    #[arg(long)]
    pub confirmations: Option<u64>,

    /// Don't verify the source code after deploying
    #[arg(long)]
    pub skip_verify: bool,
}

/// Upgrade a UUPS proxy.
///
/// A new implementation is deployed from the current artifacts and installed
/// through the `upgradeTo`/`upgradeToAndCall` methods of the old implementation.
#[derive(Args)]
pub struct UpgradeArgs {
    /// The contract to upgrade
    #[arg(short, long)]
    pub contract: DeployableContract,

    /// Address of the proxy contract, defaults to the recorded deployment
    #[arg(short, long)]
    pub proxy: Option<Address>,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(long)]
    pub calldata: Option<String>,

    /// Number of confirmations to wait for
    #[arg(long, default_value_t = NUM_UPGRADE_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Don't verify the source code after upgrading
    #[arg(long)]
    pub skip_verify: bool,
}

/// Verify a deployed contract
#[derive(Args)]
pub struct VerifyArgs {
    /// The contract to verify
    #[arg(short, long)]
    pub contract: DeployableContract,

    /// Address of the deployed contract, defaults to the recorded deployment
    /// and then to the published one
    #[arg(short = 'A', long)]
    pub address: Option<Address>,

    /// Constructor arguments the contract was deployed with
    #[arg(short, long, num_args = 0..)]
    pub args: Vec<String>,
}

/// Print the implementation behind a proxy
#[derive(Args)]
pub struct ImplementationArgs {
    /// Address of the proxy contract
    #[arg(short, long)]
    pub proxy: Address,

    /// Name to print the addresses under
    #[arg(short, long, default_value = "Contract")]
    pub name: String,
}

/// Grant an access control role
#[derive(Args)]
pub struct GrantRoleArgs {
    /// Address of the contract on which to grant the role
    #[arg(short, long)]
    pub contract: Address,

    /// The role to grant
    #[arg(short, long)]
    pub role: Role,

    /// The account receiving the role
    #[arg(short, long)]
    pub account: Address,
}

/// Deploy the public sale behind a proxy
#[derive(Args)]
pub struct DeployPublicSaleArgs {
    /// Address of a token on which to grant the public sale the minter role
    #[arg(short, long)]
    pub token: Option<Address>,
}
