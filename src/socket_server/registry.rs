//! Connected-client registry
//!
//! Each connection owns a writer task fed by an unbounded channel; the
//! registry keeps the sending half so any task can reach any client.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Sending half of a connection's outbound queue
pub type ClientSender = mpsc::UnboundedSender<Message>;

/// Registry of live connections, keyed by client id
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, ClientSender>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, client_id: String, sender: ClientSender) {
        self.clients.write().insert(client_id, sender);
    }

    /// Remove a client; returns whether it was registered
    pub fn unregister(&self, client_id: &str) -> bool {
        self.clients.write().remove(client_id).is_some()
    }

    /// Queue a frame for one client. Returns false if the client is gone.
    pub fn send_to(&self, client_id: &str, message: Message) -> bool {
        match self.clients.read().get(client_id) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Queue the same text frame for every open client.
    ///
    /// Connections whose writer has already shut down are skipped. Returns the
    /// number of clients the frame was queued for.
    pub fn broadcast_text(&self, text: &str) -> usize {
        let clients = self.clients.read();
        let mut delivered = 0;
        for (client_id, tx) in clients.iter() {
            if tx.is_closed() {
                tracing::debug!("[TRANSPORT] Skipping closed client {}", client_id);
                continue;
            }
            if tx.send(Message::Text(text.to_string())).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn client_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clients.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    pub fn clear(&self) {
        self.clients.write().clear();
    }
}
