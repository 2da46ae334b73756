//! mdbatch CLI library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line front end for preparing metadata batches:
//!
//! - **Checking**: validate a configuration and CSV input (`mdbatch check`)
//! - **Preparing**: emit changed rows as JSON lines for the remote client (`mdbatch prepare`)
//! - **State**: inspect and maintain the local state store (`mdbatch store ...`)

pub mod commands;
pub mod error;
pub mod input;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mdbatch - metadata batch preparation
#[derive(Parser, Debug)]
#[command(name = "mdbatch")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Input options shared by `check` and `prepare`
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Batch configuration file (YAML)
    #[arg(short, long, env = "MDBATCH_CONFIG")]
    pub config: PathBuf,

    /// CSV input file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Field delimiter, a single character or "tab"
    #[arg(short, long, default_value = ",")]
    pub delimiter: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check configuration and input without changing anything
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Version of the target host, checked against minimum_host_version
        #[arg(long)]
        host_version: Option<String>,
    },

    /// Prepare changed rows and write them to stdout as JSON lines
    Prepare {
        #[command(flatten)]
        input: InputArgs,

        /// Also emit rows unchanged since their last recorded write-back
        #[arg(long)]
        all: bool,
    },

    /// Manage the local state store
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
}

/// Local state store subcommands
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Record the remote id created for a local row
    Map {
        /// Batch configuration file (YAML)
        #[arg(short, long, env = "MDBATCH_CONFIG")]
        config: PathBuf,

        /// Local row id
        local_id: String,

        /// Remote id returned by the host
        remote_id: String,

        /// Local id of the row's parent
        #[arg(long)]
        parent_id: Option<String>,

        /// Fingerprint of the row as written, from the prepared JSON line
        #[arg(long)]
        fingerprint: Option<String>,
    },

    /// Forget the remote id of a local row
    Unmap {
        /// Batch configuration file (YAML)
        #[arg(short, long, env = "MDBATCH_CONFIG")]
        config: PathBuf,

        /// Local row id
        local_id: String,
    },

    /// Show the remote id recorded for a local row
    Show {
        /// Batch configuration file (YAML)
        #[arg(short, long, env = "MDBATCH_CONFIG")]
        config: PathBuf,

        /// Local row id
        local_id: String,
    },

    /// Remove every id mapping and cached fingerprint
    Clear {
        /// Batch configuration file (YAML)
        #[arg(short, long, env = "MDBATCH_CONFIG")]
        config: PathBuf,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "mdbatch",
            "check",
            "-c",
            "batch.yml",
            "-i",
            "rows.tsv",
            "-d",
            "tab",
            "--host-version",
            "9.5",
        ])
        .unwrap();
        let Commands::Check { input, host_version } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(input.config, PathBuf::from("batch.yml"));
        assert_eq!(input.delimiter, "tab");
        assert_eq!(host_version.as_deref(), Some("9.5"));
    }

    #[test]
    fn test_parse_store_map() {
        let cli = Cli::try_parse_from([
            "mdbatch",
            "-v",
            "store",
            "map",
            "--config",
            "b.yml",
            "c1",
            "node/7",
            "--parent-id",
            "p1",
            "--fingerprint",
            "d41d8cd98f00b204e9800998ecf8427e",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Store {
            command: StoreCommand::Map { parent_id, fingerprint, .. },
        } = cli.command
        else {
            panic!("expected store map");
        };
        assert_eq!(parent_id.as_deref(), Some("p1"));
        assert_eq!(fingerprint.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    }
}
