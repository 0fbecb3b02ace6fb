//! Native bridge client
//!
//! The same connection lifecycle the injected script runs, usable from Rust:
//! a pure state machine deciding when to reconnect, plus an async client that
//! drives it over a real transport connection and reports what a guest page
//! would do with each message.
//!
//! ```text
//! DISCONNECTED ──connect──> CONNECTING ──open──> CONNECTED
//!      ^                         │                   │
//!      └────── close (retry after delay) ◄───────────┘
//!      └────── disconnect (manual, terminal)
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::bridge::messages::{GuestMessage, HostCommand, OriginPolicy};
use crate::config::BridgeConfig;
use crate::socket_server::protocol::{
    FileChangedPayload, HelloPayload, InboundMessage, MessageType, WsMessage, PROTOCOL_VERSION,
};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Reconnect settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    /// 0 means unlimited
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&BridgeConfig::default())
    }
}

impl From<&BridgeConfig> for ReconnectPolicy {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.reconnect_delay_ms),
            max_attempts: config.max_reconnect_attempts,
        }
    }
}

/// Reconnect bookkeeping, free of I/O
#[derive(Debug, Clone)]
pub struct BridgeStateMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
    manual_close: bool,
}

impl BridgeStateMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
            manual_close: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnects scheduled since the last successful open
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_manually_closed(&self) -> bool {
        self.manual_close
    }

    /// Begin a connection attempt. Refused after a manual disconnect or
    /// while already connecting or connected.
    pub fn begin_connect(&mut self) -> bool {
        if self.manual_close || self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
    }

    /// Connection closed or failed. Returns the delay before the next
    /// attempt, or `None` when no further attempt should be made.
    pub fn on_close(&mut self) -> Option<Duration> {
        self.state = ConnectionState::Disconnected;
        if self.manual_close {
            return None;
        }
        if self.policy.max_attempts > 0 && self.attempts >= self.policy.max_attempts {
            tracing::info!("[BRIDGE] Giving up after {} attempts", self.attempts);
            return None;
        }
        self.attempts += 1;
        Some(self.policy.delay)
    }

    /// Manual disconnect; suppresses every later reconnect
    pub fn disconnect(&mut self) {
        self.manual_close = true;
        self.state = ConnectionState::Disconnected;
    }
}

/// What a guest page does in response to a transport message
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeAction {
    /// Full page reload
    Reload { file_path: String },
    /// Forward to the enclosing frame
    Relay(GuestMessage),
    /// Carry out a command from the enclosing frame
    Command(HostCommand),
}

/// Map one transport frame to a guest action. Malformed frames and other
/// message types yield `None`.
pub fn dispatch(text: &str) -> Option<BridgeAction> {
    let inbound = match InboundMessage::parse(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::debug!("[BRIDGE] Ignoring malformed message: {}", e);
            return None;
        }
    };
    match inbound.kind() {
        Some(MessageType::FileChanged) => {
            let file_path = serde_json::from_value::<FileChangedPayload>(inbound.payload)
                .map(|p| p.file_path)
                .unwrap_or_default();
            Some(BridgeAction::Reload { file_path })
        }
        Some(MessageType::GraphSync) => {
            let graph = inbound
                .payload
                .get("graph")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            Some(BridgeAction::Relay(GuestMessage::GraphUpdated { graph }))
        }
        Some(MessageType::Welcome) => {
            tracing::debug!("[BRIDGE] Welcome: {}", inbound.payload);
            None
        }
        _ => {
            tracing::debug!("[BRIDGE] Ignoring message type {:?}", inbound.raw_type);
            None
        }
    }
}

/// Map one cross-context message from the enclosing frame to a guest
/// action. Messages from origins outside `policy` and unknown commands
/// yield `None`.
pub fn apply_command(policy: &OriginPolicy, origin: &str, data: &str) -> Option<BridgeAction> {
    match policy.decode_command(origin, data) {
        Ok(command) => Some(BridgeAction::Command(command)),
        Err(e) => {
            tracing::debug!("[BRIDGE] Ignoring host command: {}", e);
            None
        }
    }
}

/// Reconnecting transport client that reports guest actions
pub struct BridgeClient {
    ws_url: String,
    page_url: String,
    client_id: String,
    machine: BridgeStateMachine,
}

impl BridgeClient {
    pub fn new(ws_url: impl Into<String>, page_url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            ws_url: ws_url.into(),
            page_url: page_url.into(),
            client_id: format!("guest_{}", uuid::Uuid::new_v4().simple()),
            machine: BridgeStateMachine::new(policy),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    /// Reconnects scheduled since the last successful open
    pub fn attempts(&self) -> u32 {
        self.machine.attempts()
    }

    /// Manual disconnect; a later `run` returns without connecting
    pub fn disconnect(&mut self) {
        self.machine.disconnect();
    }

    /// Connect, reconnecting per policy, until `shutdown` flips or retries
    /// run out. Actions are sent on `actions`.
    pub async fn run(
        &mut self,
        actions: mpsc::UnboundedSender<BridgeAction>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        while self.machine.begin_connect() {
            tracing::debug!("[BRIDGE] Connecting to {}", self.ws_url);
            let outcome = tokio::select! {
                result = self.session(&actions) => Some(result),
                _ = shutdown.changed() => None,
            };
            let Some(session) = outcome else {
                self.machine.disconnect();
                break;
            };
            if let Err(e) = session {
                tracing::debug!("[BRIDGE] Connection ended: {}", e);
            }

            let Some(delay) = self.machine.on_close() else {
                break;
            };
            tracing::info!(
                "[BRIDGE] Reconnecting in {:?} (attempt {})",
                delay,
                self.machine.attempts()
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    self.machine.disconnect();
                    break;
                }
            }
        }
    }

    async fn session(&mut self, actions: &mpsc::UnboundedSender<BridgeAction>) -> anyhow::Result<()> {
        let (ws, _) = connect_async(self.ws_url.as_str()).await?;
        self.machine.on_open();
        tracing::info!("[BRIDGE] Connected to {} as {}", self.ws_url, self.client_id);

        let (mut sink, mut source) = ws.split();
        let hello = WsMessage::new(
            MessageType::Hello,
            HelloPayload {
                client_id: self.client_id.clone(),
                client_type: "guest".to_string(),
                url: self.page_url.clone(),
                version: PROTOCOL_VERSION.to_string(),
            },
        );
        sink.send(Message::Text(hello.to_json()?)).await?;

        while let Some(msg) = source.next().await {
            match msg? {
                Message::Text(text) => {
                    if let Some(action) = dispatch(&text) {
                        if actions.send(action).is_err() {
                            self.machine.disconnect();
                            return Ok(());
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }
}
