//! Bridge between served pages and the host
//!
//! - `asset` - locating and serving the injected `client.js`
//! - `messages` - host/guest cross-context message unions and origin checks
//! - `client` - reconnect state machine and a native transport client

pub mod asset;
pub mod client;
pub mod messages;

pub use asset::{BridgeAsset, ScriptLoad, ScriptSettings, BRIDGE_SCRIPT_ROUTE};
pub use client::{
    apply_command, dispatch, BridgeAction, BridgeClient, BridgeStateMachine, ConnectionState,
    ReconnectPolicy,
};
pub use messages::{GuestMessage, HostCommand, OriginPolicy};
