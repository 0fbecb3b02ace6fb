//! Broadcast Transport lifecycle
//!
//! A single owned server instance: `start` stops any running instance before
//! binding, `stop` is a no-op when stopped and returns only after the
//! listener has been dropped.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{LiveSpecError, Result};
use crate::socket_server::connection::handle_connection;
use crate::socket_server::protocol::WsMessage;
use crate::socket_server::registry::ClientRegistry;

/// State shared between the transport handle and its connections
#[derive(Default)]
pub struct TransportShared {
    pub(crate) registry: ClientRegistry,
    graph_id: RwLock<Option<String>>,
}

impl TransportShared {
    pub fn graph_id(&self) -> Option<String> {
        self.graph_id.read().clone()
    }
}

struct RunningTransport {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

/// Local real-time pub/sub server
#[derive(Default)]
pub struct BroadcastTransport {
    shared: Arc<TransportShared>,
    running: Mutex<Option<RunningTransport>>,
}

impl BroadcastTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `host:port` and begin accepting. Port 0 binds an ephemeral port;
    /// the bound port is returned.
    pub async fn start(&self, host: &str, port: u16) -> Result<u16> {
        if self.is_running() {
            tracing::info!("[TRANSPORT] Already running, restarting");
            self.stop().await;
        }

        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| LiveSpecError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| LiveSpecError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let accept_task = tokio::spawn(accept_loop(listener, shared, shutdown_rx));

        *self.running.lock() = Some(RunningTransport {
            addr,
            shutdown_tx,
            accept_task,
        });
        tracing::info!("[TRANSPORT] Listening on ws://{}", addr);
        Ok(addr.port())
    }

    /// Stop accepting and close every connection
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.accept_task.await {
            tracing::warn!("[TRANSPORT] Accept loop ended abnormally: {}", e);
        }
        self.shared.registry.clear();
        tracing::info!("[TRANSPORT] Stopped ({})", running.addr);
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Bound port while running
    pub fn port(&self) -> Option<u16> {
        self.running.lock().as_ref().map(|r| r.addr.port())
    }

    /// Graph identifier announced in WELCOME
    pub fn set_graph_id(&self, graph_id: Option<String>) {
        *self.shared.graph_id.write() = graph_id;
    }

    pub fn graph_id(&self) -> Option<String> {
        self.shared.graph_id()
    }

    /// Serialize once and queue for every open connection.
    /// Returns the number of clients reached.
    pub fn broadcast<T: Serialize>(&self, message: &WsMessage<T>) -> usize {
        match message.to_json() {
            Ok(json) => {
                let delivered = self.shared.registry.broadcast_text(&json);
                tracing::debug!("[TRANSPORT] Broadcast {} to {} clients", message.kind, delivered);
                delivered
            }
            Err(e) => {
                tracing::error!("[TRANSPORT] Failed to serialize {}: {}", message.kind, e);
                0
            }
        }
    }

    /// Queue a message for one client
    pub fn send_to<T: Serialize>(&self, client_id: &str, message: &WsMessage<T>) -> bool {
        match message.to_json() {
            Ok(json) => self.shared.registry.send_to(client_id, Message::Text(json)),
            Err(e) => {
                tracing::error!("[TRANSPORT] Failed to serialize {}: {}", message.kind, e);
                false
            }
        }
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.shared.registry.client_ids()
    }

    pub fn client_count(&self) -> usize {
        self.shared.registry.len()
    }
}

async fn accept_loop(
    listener: TcpListener,
    shared: Arc<TransportShared>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let shared = Arc::clone(&shared);
                        let shutdown = shutdown_rx.clone();
                        tokio::spawn(handle_connection(stream, shared, shutdown));
                    }
                    Err(e) => tracing::warn!("[TRANSPORT] Failed to accept connection: {}", e),
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }
}
