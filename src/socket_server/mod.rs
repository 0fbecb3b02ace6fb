//! Broadcast Transport
//!
//! A local WebSocket server accepting many transient clients (guest bridges
//! and host UIs). Each connection gets a generated `client_<uuid>` id and a
//! WELCOME on connect; traffic is JSON envelopes.
//!
//! ```text
//!   BroadcastTransport ──► accept loop ──► handle_connection (per client)
//!          │                                   │
//!          └──── ClientRegistry ◄──────────────┘
//!                 client_id ──► outbound queue ──► writer task
//! ```
//!
//! # Protocol
//!
//! ```json
//! // Server -> Client
//! {"type": "welcome", "timestamp": "...", "payload": {"serverId": "livespec_server", "version": "1.0.0"}}
//! {"type": "graph:sync", "timestamp": "...", "payload": {"graph": {...}, "fullSync": true}}
//! {"type": "file:changed", "timestamp": "...", "payload": {"filePath": "...", "content": ""}}
//!
//! // Client -> Server
//! {"type": "hello", "timestamp": "...", "payload": {...}}
//! {"type": "cursor:moved", "timestamp": "...", "payload": {...}}   // relayed to all
//! ```

pub mod connection;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use connection::handle_connection;
pub use protocol::{
    ErrorPayload, FileChangedPayload, GraphSyncPayload, HelloPayload, InboundMessage,
    MessageType, WelcomePayload, WsMessage,
};
pub use registry::ClientRegistry;
pub use transport::BroadcastTransport;
