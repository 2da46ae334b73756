//! mdbatch CLI - Main entry point

use anyhow::Context;
use clap::Parser;
use mdbatch_cli::{commands, Cli, Commands, StoreCommand};
use mdbatch_common::logging::{init_logging, LogConfig};
use std::process;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    // Verbose mode logs debug events, otherwise warnings only
    let log_config = LogConfig::for_cli(cli.verbose);

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging, so a failed init is not fatal
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Check { input, host_version } => {
            commands::check::run(input, host_version.as_deref())
                .with_context(|| format!("checking '{}'", input.input.display()))
        },

        Commands::Prepare { input, all } => commands::prepare::run(input, *all)
            .with_context(|| format!("preparing '{}'", input.input.display())),

        Commands::Store { command } => match command {
            StoreCommand::Map {
                config,
                local_id,
                remote_id,
                parent_id,
                fingerprint,
            } => Ok(commands::store::map(
                config,
                local_id,
                remote_id,
                parent_id.as_deref(),
                fingerprint.as_deref(),
            )?),
            StoreCommand::Unmap { config, local_id } => {
                Ok(commands::store::unmap(config, local_id)?)
            },
            StoreCommand::Show { config, local_id } => Ok(commands::store::show(config, local_id)?),
            StoreCommand::Clear { config } => Ok(commands::store::clear(config)?),
        },
    }
}
