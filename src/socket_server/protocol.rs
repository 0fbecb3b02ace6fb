//! Transport wire protocol
//!
//! Every frame is a JSON envelope `{type, timestamp, payload}` where `type`
//! comes from a closed set and `timestamp` is ISO-8601 UTC with milliseconds.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::SpecGraphData;

/// Identifier sent in every WELCOME
pub const SERVER_ID: &str = "livespec_server";

/// Protocol version sent in every WELCOME and HELLO
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Error code for frames that are not valid JSON
pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";

/// Closed set of envelope types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "graph:sync")]
    GraphSync,
    #[serde(rename = "file:changed")]
    FileChanged,
    #[serde(rename = "node:created")]
    NodeCreated,
    #[serde(rename = "node:updated")]
    NodeUpdated,
    #[serde(rename = "node:deleted")]
    NodeDeleted,
    #[serde(rename = "welcome")]
    Welcome,
    #[serde(rename = "hello")]
    Hello,
    #[serde(rename = "cursor:moved")]
    CursorMoved,
    #[serde(rename = "error")]
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GraphSync => "graph:sync",
            Self::FileChanged => "file:changed",
            Self::NodeCreated => "node:created",
            Self::NodeUpdated => "node:updated",
            Self::NodeDeleted => "node:deleted",
            Self::Welcome => "welcome",
            Self::Hello => "hello",
            Self::CursorMoved => "cursor:moved",
            Self::Error => "error",
        }
    }

    /// Parse a wire name; unknown names are `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "graph:sync" => Some(Self::GraphSync),
            "file:changed" => Some(Self::FileChanged),
            "node:created" => Some(Self::NodeCreated),
            "node:updated" => Some(Self::NodeUpdated),
            "node:deleted" => Some(Self::NodeDeleted),
            "welcome" => Some(Self::Welcome),
            "hello" => Some(Self::Hello),
            "cursor:moved" => Some(Self::CursorMoved),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsMessage<T = serde_json::Value> {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub timestamp: String,
    pub payload: T,
}

impl<T> WsMessage<T> {
    /// Wrap a payload, stamped with the current time
    pub fn new(kind: MessageType, payload: T) -> Self {
        Self {
            kind,
            timestamp: now_timestamp(),
            payload,
        }
    }
}

impl<T: Serialize> WsMessage<T> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Current time in the envelope's timestamp format
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Payload of `graph:sync`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSyncPayload {
    pub graph: SpecGraphData,
    pub full_sync: bool,
}

/// Payload of `file:changed`; content may be empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangedPayload {
    pub file_path: String,
    #[serde(default)]
    pub content: String,
}

/// Payload of `welcome`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomePayload {
    pub server_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
}

impl WelcomePayload {
    pub fn new(graph_id: Option<String>) -> Self {
        Self {
            server_id: SERVER_ID.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            graph_id,
        }
    }
}

/// Payload of `hello` as sent by guest bridges. The server accepts any payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloPayload {
    pub client_id: String,
    pub client_type: String,
    pub url: String,
    pub version: String,
}

/// Payload of `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorPayload {
    pub fn invalid_message() -> Self {
        Self {
            code: INVALID_MESSAGE.to_string(),
            message: "Failed to parse message".to_string(),
            details: None,
        }
    }
}

/// A frame received from a client, before dispatch.
///
/// Any JSON value is accepted; a missing or unknown `type` dispatches as
/// unrecognized rather than failing the parse.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub raw_type: Option<String>,
    pub payload: serde_json::Value,
}

impl InboundMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let raw_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_string);
        let payload = value
            .get("payload")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        Ok(Self { raw_type, payload })
    }

    pub fn kind(&self) -> Option<MessageType> {
        self.raw_type.as_deref().and_then(MessageType::parse)
    }
}
