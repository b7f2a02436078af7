use std::process::ExitCode;

use anyhow::Result;
use commands::IsogeoArgs;
use tracing::{debug, error};

mod commands;
mod config;
mod logger;

async fn run(args: IsogeoArgs) -> Result<()> {
    let config = config::Config::parse()?;
    debug!(platform = %config.platform, "config loaded");
    args.handle(config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // initialize logger with "best guess" defaults
    logger::init_logger(None);

    let args = commands::isogeo_args().run();
    logger::init_logger(Some(args.verbosity));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("❌ ERROR: {e:#}");
            ExitCode::FAILURE
        },
    }
}
