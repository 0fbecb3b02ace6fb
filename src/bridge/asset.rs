//! Bridge script location and loading
//!
//! The packaged location comes from configuration (`bridge.script_path`).
//! When it is unset or missing, a short list of development locations is
//! tried in order.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Route the content server exposes the script on
pub const BRIDGE_SCRIPT_ROUTE: &str = "/__livespec/client.js";

/// Script file name
pub const BRIDGE_SCRIPT_NAME: &str = "client.js";

/// Outcome of reading the script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLoad {
    Found { path: PathBuf, source: String },
    NotFound { tried: Vec<PathBuf> },
    ReadFailed { path: PathBuf, message: String },
}

/// Resolves the bridge script on disk
#[derive(Debug, Clone)]
pub struct BridgeAsset {
    candidates: Vec<PathBuf>,
}

impl BridgeAsset {
    /// Configured path first, then development candidates
    pub fn new(configured: Option<PathBuf>) -> Self {
        let mut candidates: Vec<PathBuf> = configured.into_iter().collect();
        candidates.extend(development_candidates());
        Self { candidates }
    }

    /// Exactly these locations, in order
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists
    pub fn resolve(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .find(|p| p.is_file())
            .map(PathBuf::as_path)
    }

    pub async fn load(&self) -> ScriptLoad {
        let Some(path) = self.resolve() else {
            return ScriptLoad::NotFound {
                tried: self.candidates.clone(),
            };
        };
        match tokio::fs::read_to_string(path).await {
            Ok(source) => ScriptLoad::Found {
                path: path.to_path_buf(),
                source,
            },
            Err(e) => ScriptLoad::ReadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        }
    }
}

impl Default for BridgeAsset {
    fn default() -> Self {
        Self::new(None)
    }
}

fn development_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(BRIDGE_SCRIPT_NAME)];
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("assets").join(BRIDGE_SCRIPT_NAME));
        candidates.push(exe_dir.join(BRIDGE_SCRIPT_NAME));
    }
    candidates
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServedConfig<'a> {
    ws_port: u16,
    reconnect_delay: u64,
    max_reconnect_attempts: u32,
    allowed_origins: &'a [String],
}

/// Runtime settings for the served script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSettings {
    pub ws_port: u16,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub allowed_origins: Vec<String>,
}

impl ScriptSettings {
    /// Statement prepended to the script so it can find the transport when
    /// the page carries no port meta tag
    pub fn prelude(&self) -> String {
        let config = ServedConfig {
            ws_port: self.ws_port,
            reconnect_delay: self.reconnect_delay_ms,
            max_reconnect_attempts: self.max_reconnect_attempts,
            allowed_origins: &self.allowed_origins,
        };
        let json = serde_json::to_string(&config).unwrap_or_else(|_| "{}".to_string());
        format!("window.__LIVESPEC_CONFIG__ = {};\n", json)
    }
}
