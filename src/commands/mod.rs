//! Command modules for the livespec CLI
//!
//! Each command module implements a single top-level command:
//! - `serve` - open a project and run the live servers until Ctrl-C
//! - `check` - parse and validate a graph file
//! - `listen` - run the native bridge client against a transport
//! - `config` - manage the configuration file
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext` carrying the loaded configuration.

pub mod check;
pub mod config;
pub mod listen;
pub mod serve;

pub use check::run_check;
pub use config::run_config;
pub use listen::run_listen;
pub use serve::run_serve;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::LiveSpecConfig;
use crate::error::{LiveSpecError, Result};

/// Shared context passed to all command handlers
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Show verbose output
    pub verbose: bool,
    /// Configuration loaded for this invocation
    pub config: LiveSpecConfig,
    /// Where `config` was loaded from, if anywhere
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Create a new CommandContext from CLI args, loading the configuration
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().or_else(LiveSpecConfig::default_path);
        let config = match &config_path {
            Some(path) => LiveSpecConfig::load_from(path)?,
            None => LiveSpecConfig::default(),
        };
        Ok(Self {
            verbose: cli.verbose,
            config,
            config_path,
        })
    }

    /// Log level for this run; `-v` forces debug
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.config.logging.level
        }
    }

    /// Path config writes go to
    pub fn require_config_path(&self) -> Result<PathBuf> {
        self.config_path.clone().ok_or_else(|| LiveSpecError::ConfigError {
            message: "No configuration directory available; pass --config".to_string(),
        })
    }
}

/// Initialize tracing to stderr. `RUST_LOG` directives still apply; a
/// second call is a no-op.
pub fn init_tracing(level: &str) {
    let mut filter = EnvFilter::from_default_env();
    match format!("livespec={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log level {:?}: {}", level, e),
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Create the tokio runtime command handlers block on
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| LiveSpecError::ConfigError {
        message: format!("Failed to create tokio runtime: {}", e),
    })
}
