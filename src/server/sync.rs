//! Change forwarding
//!
//! Turns classified watch events into project state updates, host events
//! and transport broadcasts. This is the only path by which background
//! changes reach `ProjectState`.
//!
//! A graph broadcast is sent only after the file read it depends on has
//! completed. A graph file that fails to read or parse is logged and
//! skipped; the previously held graph stays in place.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::graph::{self, load_graph_async};
use crate::server::events::{EventBus, HostEvent};
use crate::server::state::SharedProjectState;
use crate::server::watcher::WatchEvent;
use crate::socket_server::{
    BroadcastTransport, FileChangedPayload, GraphSyncPayload, MessageType, WsMessage,
};

/// What the forwarder did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Graph re-read, stored and broadcast
    GraphReloaded {
        nodes: usize,
        edges: usize,
        dropped_edges: usize,
        clients: usize,
    },
    /// Graph unreadable or malformed; previous graph retained
    GraphSkipped { reason: String },
    /// Reload notice broadcast
    FileNotified { clients: usize },
}

/// Collaborators the forwarder drives
#[derive(Clone)]
pub struct SyncContext {
    pub state: Arc<SharedProjectState>,
    pub transport: Arc<BroadcastTransport>,
    pub events: Arc<EventBus>,
}

impl SyncContext {
    /// Apply one classified change
    pub async fn handle(&self, event: WatchEvent) -> SyncOutcome {
        match event {
            WatchEvent::GraphChanged { path, .. } => {
                let graph = match load_graph_async(&path).await {
                    Ok(graph) => graph,
                    Err(e) => {
                        tracing::warn!("[SYNC] Skipping graph reload: {}", e);
                        return SyncOutcome::GraphSkipped {
                            reason: e.to_string(),
                        };
                    }
                };

                let dropped_edges = graph::partition_edges(&graph.nodes, &graph.edges).dropped;
                if dropped_edges > 0 {
                    tracing::warn!(
                        "[SYNC] Graph has {} edges referencing missing nodes",
                        dropped_edges
                    );
                }
                tracing::info!(
                    "[SYNC] Graph loaded: {} ({} nodes, {} edges)",
                    graph.meta.name,
                    graph.nodes.len(),
                    graph.edges.len()
                );

                let nodes = graph.nodes.len();
                let edges = graph.edges.len();
                self.state.replace_graph(graph.clone());
                self.transport
                    .set_graph_id(Some(graph.graph_id().to_string()));
                self.events.emit(HostEvent::GraphUpdate {
                    graph: graph.clone(),
                });

                let message = WsMessage::new(
                    MessageType::GraphSync,
                    GraphSyncPayload {
                        graph,
                        full_sync: true,
                    },
                );
                let clients = self.transport.broadcast(&message);
                SyncOutcome::GraphReloaded {
                    nodes,
                    edges,
                    dropped_edges,
                    clients,
                }
            }
            WatchEvent::FileChanged { path, .. } => {
                let file_path = path.display().to_string();
                let message = WsMessage::new(
                    MessageType::FileChanged,
                    FileChangedPayload {
                        file_path: file_path.clone(),
                        content: String::new(),
                    },
                );
                let clients = self.transport.broadcast(&message);
                tracing::info!("[SYNC] {} changed, notified {} clients", file_path, clients);
                self.events.emit(HostEvent::FileChanged {
                    file_path,
                    content: String::new(),
                });
                SyncOutcome::FileNotified { clients }
            }
        }
    }

    /// Drain watch events until the watcher stops
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<WatchEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
        tracing::debug!("[SYNC] Watch channel closed, forwarder exiting");
    }
}
