//! Content Server
//!
//! Serves the project's static files and rewrites outgoing HTML so every
//! page loads the bridge script.
//!
//! # Module Structure
//!
//! - `handlers` - `/health` and the bridge script endpoint
//! - `inject` - HTML rewrite and the response middleware applying it
//!
//! Layering, innermost first: static files (fallback) and the dynamic
//! routes, then the rewrite middleware, then CORS. The rewrite therefore
//! sees the final body of every response.

pub mod handlers;
pub mod inject;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::bridge::{BridgeAsset, ScriptSettings, BRIDGE_SCRIPT_ROUTE};
use crate::config::LiveSpecConfig;
use crate::error::{LiveSpecError, Result};
use crate::paths;

/// How long `stop` waits for in-flight requests before aborting
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// =============================================================================
// Application State
// =============================================================================

/// Shared state for the handlers
pub struct AppState {
    /// Project root, reported by `/health`
    pub root_path: PathBuf,
    /// Directory static files are served from
    pub static_root: PathBuf,
    pub asset: BridgeAsset,
    pub script: ScriptSettings,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Settings that outlive a single start/stop cycle
#[derive(Debug, Clone)]
pub struct ContentServerOptions {
    pub host: String,
    pub asset: BridgeAsset,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub allowed_origins: Vec<String>,
}

impl Default for ContentServerOptions {
    fn default() -> Self {
        Self::from(&LiveSpecConfig::default())
    }
}

impl From<&LiveSpecConfig> for ContentServerOptions {
    fn from(config: &LiveSpecConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            asset: BridgeAsset::new(config.bridge.script_path.clone()),
            reconnect_delay_ms: config.bridge.reconnect_delay_ms,
            max_reconnect_attempts: config.bridge.max_reconnect_attempts,
            allowed_origins: config.bridge.allowed_origins.clone(),
        }
    }
}

/// Build the router for one project
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(BRIDGE_SCRIPT_ROUTE, get(handlers::bridge_script))
        .fallback_service(ServeDir::new(&state.static_root))
        .layer(middleware::from_fn(inject::inject_bridge_middleware))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

// =============================================================================
// Lifecycle
// =============================================================================

struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owned HTTP server; at most one instance listening
pub struct ContentServer {
    options: ContentServerOptions,
    running: Mutex<Option<RunningServer>>,
}

impl ContentServer {
    pub fn new(options: ContentServerOptions) -> Self {
        Self {
            options,
            running: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub fn port(&self) -> Option<u16> {
        self.running.lock().as_ref().map(|r| r.addr.port())
    }

    /// Serve `root` on `port`, resolving once the listener is bound.
    ///
    /// `ws_port` is handed to bridge scripts so they can find the transport.
    /// Port 0 binds an ephemeral port; the bound port is returned.
    pub async fn start(&self, root: &Path, port: u16, ws_port: u16) -> Result<u16> {
        if self.is_running() {
            tracing::info!("[HTTP] Already running, restarting");
            self.stop().await;
        }

        let state = Arc::new(AppState {
            root_path: root.to_path_buf(),
            static_root: paths::static_root(root),
            asset: self.options.asset.clone(),
            script: ScriptSettings {
                ws_port,
                reconnect_delay_ms: self.options.reconnect_delay_ms,
                max_reconnect_attempts: self.options.max_reconnect_attempts,
                allowed_origins: self.options.allowed_origins.clone(),
            },
        });
        let static_root = state.static_root.clone();
        let app = build_router(state);

        let bind_addr = format!("{}:{}", self.options.host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| LiveSpecError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| LiveSpecError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("[HTTP] Server error: {}", e);
            }
        });

        *self.running.lock() = Some(RunningServer {
            addr,
            shutdown_tx,
            task,
        });
        tracing::info!(
            "[HTTP] Serving {} on http://{}",
            static_root.display(),
            addr
        );
        Ok(addr.port())
    }

    /// Stop serving. A no-op when not running; returns once the listener
    /// is released.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        let _ = running.shutdown_tx.send(());
        let mut task = running.task;
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
            tracing::warn!("[HTTP] Graceful shutdown timed out, aborting");
            task.abort();
            let _ = task.await;
        }
        tracing::info!("[HTTP] Stopped ({})", running.addr);
    }
}

impl Default for ContentServer {
    fn default() -> Self {
        Self::new(ContentServerOptions::default())
    }
}
