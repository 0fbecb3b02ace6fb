//! LiveSpec - live synchronization for HTML prototypes and spec graphs
//!
//! Watches a project directory holding an HTML prototype and a
//! `spec_graph.json` specification graph, serves the prototype over HTTP with
//! an injected bridge script, and keeps every connected page and host UI in
//! sync over a local WebSocket transport.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use livespec::server::{EventBus, ProjectSession, SessionOptions};
//!
//! # async fn demo() {
//! let session = ProjectSession::new(SessionOptions::default(), Arc::new(EventBus::default()));
//! session.open_project(Some(std::path::Path::new("./my-prototype"))).await;
//! let started = session.start_server(None, None).await;
//! println!("ws {} / http {}", started.ws_port, started.http_port);
//! # }
//! ```

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod graph;
pub mod http_server;
pub mod paths;
pub mod server;
pub mod socket_server;

pub use cli::Cli;
pub use config::LiveSpecConfig;
pub use error::{LiveSpecError, Result};
pub use graph::{SpecEdge, SpecGraphData, SpecNode};
pub use server::{ProjectSession, SessionOptions};
