//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Live prototype and spec-graph synchronization server
#[derive(Parser, Debug)]
#[command(name = "livespec")]
#[command(about = "Serve an HTML prototype and its spec graph with live reload and two-way messaging")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "FILE", global = true, env = "LIVESPEC_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands for livespec
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a project and run the transport and content servers
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Parse and validate a graph file
    Check(CheckArgs),

    /// Connect to a running transport as a guest and print what it would do
    Listen(ListenArgs),

    /// Manage livespec configuration
    Config(ConfigArgs),
}

// ============================================
// Serve Subcommand
// ============================================

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Transport (WebSocket) port; 0 picks a free port
    #[arg(long, value_name = "PORT")]
    pub ws_port: Option<u16>,

    /// Content server (HTTP) port; 0 picks a free port
    #[arg(long, value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Disable the directory watcher
    #[arg(long)]
    pub no_watch: bool,

    /// Write host events to stdout as JSON Lines
    #[arg(long)]
    pub emit_events: bool,
}

// ============================================
// Check Subcommand
// ============================================

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Graph file, or a project directory containing one
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the laid-out graph as JSON
    #[arg(long)]
    pub layout: bool,
}

// ============================================
// Listen Subcommand
// ============================================

/// Arguments for the listen command
#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Transport port to connect to (default: configured ws_port)
    #[arg(long, value_name = "PORT")]
    pub ws_port: Option<u16>,

    /// Transport host (default: configured host)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Page URL reported in the HELLO message
    #[arg(long, value_name = "URL", default_value = "livespec://listen")]
    pub url: String,

    /// Origin attributed to host commands read from stdin, checked against
    /// `bridge.allowed_origins`
    #[arg(long, value_name = "ORIGIN", default_value = "livespec://host")]
    pub origin: String,
}

// ============================================
// Config Subcommand
// ============================================

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config operation: show, get, set, reset
    #[command(subcommand)]
    pub operation: ConfigOperation,
}

/// Config subcommand operations
#[derive(Subcommand, Debug)]
pub enum ConfigOperation {
    /// Show current configuration
    Show,

    /// Print a single configuration value
    Get {
        /// Configuration key (e.g., server.ws_port, logging.level)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., server.ws_port, logging.level)
        key: String,
        /// Value to set
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "livespec",
            "serve",
            "./proto",
            "--ws-port",
            "0",
            "--no-watch",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.path, Some(PathBuf::from("./proto")));
                assert_eq!(args.ws_port, Some(0));
                assert_eq!(args.http_port, None);
                assert!(args.no_watch);
                assert!(!args.emit_events);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["livespec", "config", "set", "server.ws_port", "4000"])
            .unwrap();
        match cli.command {
            Commands::Config(ConfigArgs {
                operation: ConfigOperation::Set { key, value },
            }) => {
                assert_eq!(key, "server.ws_port");
                assert_eq!(value, "4000");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
