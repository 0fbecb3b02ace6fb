//! Cross-context messages between the host frame and guest pages
//!
//! Closed unions per direction, tagged on `type`. Decoding goes through an
//! [`OriginPolicy`] so a message from an unexpected origin never reaches a
//! handler.

use serde::{Deserialize, Serialize};

use crate::error::{LiveSpecError, Result};

/// Guest page to host frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GuestMessage {
    /// An element carrying `data-node-id` was clicked
    #[serde(rename = "NODE_CLICKED", rename_all = "camelCase")]
    NodeClicked { node_id: String, url: String },

    /// Relay of a transport `graph:sync`
    #[serde(rename = "GRAPH_UPDATED")]
    GraphUpdated { graph: serde_json::Value },
}

/// Host frame to guest page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    #[serde(rename = "NAVIGATE_TO")]
    NavigateTo {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reload: Option<bool>,
    },

    #[serde(rename = "HIGHLIGHT_NODE", rename_all = "camelCase")]
    HighlightNode { node_id: String },
}

/// Origins allowed to exchange cross-context messages.
///
/// An empty list accepts any origin; `*` in the list does the same.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed
                .into_iter()
                .map(|o| o.into().trim_end_matches('/').to_string())
                .collect(),
        }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed
    }

    pub fn allows(&self, origin: &str) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        let origin = origin.trim_end_matches('/');
        self.allowed.iter().any(|o| o == "*" || o == origin)
    }

    /// Decode a guest message sent from `origin`
    pub fn decode_guest(&self, origin: &str, data: &str) -> Result<GuestMessage> {
        self.check(origin)?;
        decode(data)
    }

    /// Decode a host command sent from `origin`
    pub fn decode_command(&self, origin: &str, data: &str) -> Result<HostCommand> {
        self.check(origin)?;
        decode(data)
    }

    fn check(&self, origin: &str) -> Result<()> {
        if self.allows(origin) {
            Ok(())
        } else {
            tracing::warn!("[BRIDGE] Rejected message from origin {}", origin);
            Err(LiveSpecError::RejectedMessage {
                message: format!("origin {} is not allowed", origin),
            })
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| LiveSpecError::RejectedMessage {
        message: e.to_string(),
    })
}
