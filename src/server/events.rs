//! Host push events
//!
//! Events the host pushes to its UI shell: `graph:update`, `file:changed`,
//! `server:ready` and `server:status-changed`. They are published on an
//! in-process broadcast bus and, when enabled, mirrored to stdout as JSON
//! Lines:
//!
//! ```json
//! {"type":"server:ready","wsPort":3899,"httpPort":3900}
//! ```

use std::io::{self, Write};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::graph::SpecGraphData;

/// Bus capacity; slow subscribers lag rather than block the host
const EVENT_CAPACITY: usize = 64;

/// Host-to-UI push event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    #[serde(rename = "graph:update")]
    GraphUpdate { graph: SpecGraphData },

    #[serde(rename = "file:changed", rename_all = "camelCase")]
    FileChanged { file_path: String, content: String },

    #[serde(rename = "server:ready", rename_all = "camelCase")]
    ServerReady { ws_port: u16, http_port: u16 },

    #[serde(rename = "server:status-changed")]
    ServerStatusChanged { running: bool },
}

impl HostEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GraphUpdate { .. } => "graph:update",
            Self::FileChanged { .. } => "file:changed",
            Self::ServerReady { .. } => "server:ready",
            Self::ServerStatusChanged { .. } => "server:status-changed",
        }
    }
}

/// Event emitter for sending JSON events to stdout
pub struct EventEmitter {
    enabled: bool,
}

impl EventEmitter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Emit an event to stdout as one JSON line
    pub fn emit(&self, event: &HostEvent) {
        if !self.enabled {
            return;
        }
        match serde_json::to_string(event) {
            Ok(json) => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                // Ignore write errors (reader may have closed)
                let _ = writeln!(handle, "{}", json);
                let _ = handle.flush();
            }
            Err(e) => tracing::warn!("[EVENTS] Failed to serialize {}: {}", event.event_type(), e),
        }
    }
}

/// In-process fan-out of host events
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
    emitter: EventEmitter,
}

impl EventBus {
    /// `mirror_stdout` enables the JSON Lines mirror
    pub fn new(mirror_stdout: bool) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tx,
            emitter: EventEmitter::new(mirror_stdout),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: HostEvent) {
        tracing::debug!("[EVENTS] {}", event.event_type());
        self.emitter.emit(&event);
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(false)
    }
}
