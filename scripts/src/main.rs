use std::process::ExitCode;

use clap::Parser;
use scripts::{cli::Cli, context::ScriptContext};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Network and account configuration may live in a `.env` file
    dotenvy::dotenv().ok();

    let (config, command) = Cli::parse().into_parts();

    tracing_subscriber::fmt().pretty().init();

    let res = match ScriptContext::new(config).await {
        Ok(ctx) => command.run(&ctx).await,
        Err(e) => Err(e),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
