//! Pipewatch CLI entry point.

use anyhow::Result;
use clap::Parser;

use pipewatch::cli::{commands, Cli, Commands};
use pipewatch::infrastructure::config::ConfigLoader;
use pipewatch::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        pipewatch::cli::handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref())?;

    let log_config = LogConfig::from(&config.logging).with_level(cli.log_level.as_deref());
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Watch(args) => commands::watch::execute(args, config, cli.json).await,
        Commands::Snapshot(args) => commands::snapshot::execute(args, config, cli.json).await,
        Commands::Config => commands::config::execute(config, cli.json),
    }
}
