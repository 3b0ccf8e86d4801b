//! CLI command definitions for the `legacychain` binary.

pub mod config;
pub mod history;
pub mod will;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Time-locked digital wills on a public ledger.
#[derive(Parser)]
#[command(name = "legacychain", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host`).
        #[arg(long)]
        host: Option<String>,
    },

    /// Show a will as recorded by the registry.
    Show {
        /// Owner account address.
        owner: String,
    },

    /// Execute an unlocked will, disbursing to its beneficiaries.
    Execute {
        /// Owner account address.
        owner: String,
    },

    /// Show the audit history of one will, or the latest entries overall.
    History {
        /// Owner account address; omit for all wills.
        owner: Option<String>,

        /// Maximum entries when listing all wills.
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Print the effective configuration (secrets redacted).
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_with_limit() {
        let cli = Cli::try_parse_from(["legacychain", "history", "--limit", "5", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::History { owner, limit } => {
                assert!(owner.is_none());
                assert_eq!(limit, 5);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["legacychain", "-vv", "serve", "--port", "8080"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(8080));
                assert!(host.is_none());
            }
            _ => panic!("expected serve"),
        }
    }
}
