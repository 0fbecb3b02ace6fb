//! Project session controller
//!
//! Owns the three live services (watcher, transport, content server) and the
//! project state. Host-facing operations map onto the methods here:
//!
//! - open-project → [`ProjectSession::open_project`]
//! - start-server → [`ProjectSession::start_server`]
//! - stop-server → [`ProjectSession::stop_server`]
//!
//! Opening a project or starting the servers tears down whatever is running
//! first, so no port or path is ever held twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::{LiveSpecConfig, DEFAULT_HTTP_PORT, DEFAULT_WS_PORT};
use crate::graph::{find_graph_file, load_graph_async, SpecGraphData};
use crate::http_server::{ContentServer, ContentServerOptions};
use crate::paths;
use crate::server::events::{EventBus, HostEvent};
use crate::server::state::{ProjectState, SharedProjectState};
use crate::server::sync::SyncContext;
use crate::server::watcher::{ProjectWatcher, WatcherConfig};
use crate::socket_server::BroadcastTransport;

/// Result of start-server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStartResult {
    pub success: bool,
    pub ws_port: u16,
    pub http_port: u16,
}

impl ServerStartResult {
    fn failed() -> Self {
        Self {
            success: false,
            ws_port: 0,
            http_port: 0,
        }
    }
}

/// Result of stop-server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStopResult {
    pub success: bool,
}

/// Session construction settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: String,
    /// Start the directory watcher when a project opens
    pub watch: bool,
    pub watcher: WatcherConfig,
    pub content: ContentServerOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&LiveSpecConfig::default())
    }
}

impl From<&LiveSpecConfig> for SessionOptions {
    fn from(config: &LiveSpecConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            watch: true,
            watcher: WatcherConfig::from(&config.watcher),
            content: ContentServerOptions::from(config),
        }
    }
}

/// The single live project of a host
pub struct ProjectSession {
    options: SessionOptions,
    state: Arc<SharedProjectState>,
    events: Arc<EventBus>,
    transport: Arc<BroadcastTransport>,
    content: ContentServer,
    watcher: ProjectWatcher,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl ProjectSession {
    pub fn new(options: SessionOptions, events: Arc<EventBus>) -> Self {
        Self {
            content: ContentServer::new(options.content.clone()),
            watcher: ProjectWatcher::new(options.watcher.clone()),
            options,
            state: Arc::new(SharedProjectState::new()),
            events,
            transport: Arc::new(BroadcastTransport::new()),
            forwarder: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProjectState {
        self.state.snapshot()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn transport(&self) -> &Arc<BroadcastTransport> {
        &self.transport
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_running()
    }

    /// Open a project directory.
    ///
    /// `None` means the selection was canceled. An invalid selection is
    /// logged and reported as canceled. Returns the normalized root.
    pub async fn open_project(&self, selection: Option<&Path>) -> Option<PathBuf> {
        let Some(selection) = selection else {
            tracing::info!("[SESSION] Project selection canceled");
            return None;
        };
        let root = match paths::normalize_project_selection(selection) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("[SESSION] Cannot open {}: {}", selection.display(), e);
                return None;
            }
        };
        tracing::info!("[SESSION] Opening project {}", root.display());

        self.stop_all().await;

        let graph = match find_graph_file(&root) {
            Some(path) => match load_graph_async(&path).await {
                Ok(graph) => {
                    tracing::info!(
                        "[SESSION] Graph loaded: {} nodes, {} edges",
                        graph.nodes.len(),
                        graph.edges.len()
                    );
                    Some(graph)
                }
                Err(e) => {
                    tracing::warn!("[SESSION] {}", e);
                    None
                }
            },
            None => {
                tracing::info!("[SESSION] No graph file in {}", root.display());
                None
            }
        };

        match graph {
            Some(graph) => {
                self.transport.set_graph_id(Some(graph.graph_id().to_string()));
                self.state.open(root.clone(), graph.clone());
                self.events.emit(HostEvent::GraphUpdate { graph });
            }
            None => {
                self.transport.set_graph_id(None);
                self.state.open(root.clone(), SpecGraphData::untitled());
            }
        }

        if self.options.watch {
            self.start_watching(&root);
        }

        Some(root)
    }

    /// Start the content server, then the transport.
    ///
    /// Missing ports default to 3899 (transport) and 3900 (HTTP). Any failure
    /// leaves both stopped and yields `success: false` with zero ports.
    pub async fn start_server(&self, ws_port: Option<u16>, http_port: Option<u16>) -> ServerStartResult {
        let ws_port = ws_port.unwrap_or(DEFAULT_WS_PORT);
        let http_port = http_port.unwrap_or(DEFAULT_HTTP_PORT);

        let Some(root) = self.state.root_path() else {
            tracing::error!("[SESSION] Cannot start servers: no project open");
            return ServerStartResult::failed();
        };

        self.stop_servers().await;

        // Transport first so the bridge script can be told its real port
        let bound_ws = match self.transport.start(&self.options.host, ws_port).await {
            Ok(port) => port,
            Err(e) => {
                tracing::error!("[SESSION] Failed to start transport: {}", e);
                return ServerStartResult::failed();
            }
        };
        let bound_http = match self.content.start(&root, http_port, bound_ws).await {
            Ok(port) => port,
            Err(e) => {
                tracing::error!("[SESSION] Failed to start content server: {}", e);
                self.transport.stop().await;
                return ServerStartResult::failed();
            }
        };

        self.state.set_server_running(bound_ws, bound_http);
        self.events.emit(HostEvent::ServerReady {
            ws_port: bound_ws,
            http_port: bound_http,
        });
        tracing::info!(
            "[SESSION] Servers ready (ws {}, http {})",
            bound_ws,
            bound_http
        );
        ServerStartResult {
            success: true,
            ws_port: bound_ws,
            http_port: bound_http,
        }
    }

    /// Stop the transport and content server. The watcher keeps running.
    pub async fn stop_server(&self) -> ServerStopResult {
        self.stop_servers().await;
        self.events.emit(HostEvent::ServerStatusChanged { running: false });
        ServerStopResult { success: true }
    }

    /// Stop everything; used on process exit
    pub async fn shutdown(&self) {
        self.stop_all().await;
        tracing::info!("[SESSION] Shut down");
    }

    fn start_watching(&self, root: &Path) {
        match self.watcher.start(root) {
            Ok(rx) => {
                let ctx = SyncContext {
                    state: Arc::clone(&self.state),
                    transport: Arc::clone(&self.transport),
                    events: Arc::clone(&self.events),
                };
                let handle = tokio::spawn(ctx.run(rx));
                if let Some(previous) = self.forwarder.lock().replace(handle) {
                    previous.abort();
                }
            }
            Err(e) => {
                tracing::error!("[SESSION] Watcher setup failed: {}", e);
            }
        }
    }

    async fn stop_servers(&self) {
        self.transport.stop().await;
        self.content.stop().await;
        self.state.set_server_stopped();
    }

    async fn stop_all(&self) {
        self.stop_servers().await;
        self.watcher.shutdown().await;
        let forwarder = self.forwarder.lock().take();
        if let Some(handle) = forwarder {
            // The watcher dropped its sender, so the forwarder drains and exits
            let _ = handle.await;
        }
    }
}
