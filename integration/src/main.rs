//! Integration tests for the deploy scripts. These assume that a devnet is
//! already running locally and that the contracts have been compiled.

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use eyre::Result;
use scripts::context::{ContextConfig, ScriptContext};
use test_inventory::{IntegrationTest, TestArgs};

mod abis;
mod cli;
mod constants;
mod test_inventory;
mod tests;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let Cli {
        test,
        artifacts,
        proxy_artifact,
        deployments,
        priv_key,
        rpc_url,
    } = Cli::parse();

    tracing_subscriber::fmt().init();

    let ctx = ScriptContext::new(ContextConfig {
        priv_key,
        rpc_url,
        artifacts_dir: artifacts,
        proxy_artifact,
        deployments_path: deployments,
        etherscan_api_key: None,
        etherscan_api_url: String::new(),
    })
    .await?;
    let args = TestArgs { ctx: Arc::new(ctx) };

    let mut failures = 0;
    for IntegrationTest { name, test_fn } in inventory::iter::<IntegrationTest> {
        if test.as_deref().is_some_and(|t| t != *name) {
            continue;
        }

        match test_fn(args.clone()).await {
            Ok(()) => println!("{} {}", "PASS".green().bold(), name),
            Err(e) => {
                println!("{} {}: {:?}", "FAIL".red().bold(), name, e);
                failures += 1;
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
