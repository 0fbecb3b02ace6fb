//! Error types and exit codes for livespec

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for livespec operations
#[derive(Error, Debug)]
pub enum LiveSpecError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error at {path}: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("Failed to parse graph file {path}: {message}")]
    GraphParse { path: PathBuf, message: String },

    #[error("Invalid graph structure: {message}")]
    InvalidGraph { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error: {message}")]
    Watcher { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("No project open")]
    NoProject,

    #[error("Rejected cross-context message: {message}")]
    RejectedMessage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LiveSpecError {
    /// Convert error to a process exit code:
    /// - 1: File not found / IO error
    /// - 2: Graph parse or validation failure
    /// - 3: Configuration error
    /// - 4: Server (bind, watcher, transport) failure
    /// - 5: No project / rejected input
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } | Self::IoError { .. } | Self::Io(_) => ExitCode::from(1),
            Self::GraphParse { .. } | Self::InvalidGraph { .. } | Self::Json(_) => {
                ExitCode::from(2)
            }
            Self::ConfigError { .. } => ExitCode::from(3),
            Self::Bind { .. } | Self::Watcher { .. } | Self::Transport { .. } => ExitCode::from(4),
            Self::NoProject | Self::RejectedMessage { .. } => ExitCode::from(5),
        }
    }

    /// Whether this error came from a port already being in use
    pub fn is_addr_in_use(&self) -> bool {
        matches!(self, Self::Bind { source, .. } if source.kind() == std::io::ErrorKind::AddrInUse)
    }
}

/// Result type alias for livespec operations
pub type Result<T> = std::result::Result<T, LiveSpecError>;
