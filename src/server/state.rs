//! Project state
//!
//! One `ProjectState` is live per host. It is written only by the session
//! controller and its forwarding layer; everything else reads snapshots.
//!
//! Uses `parking_lot::RwLock`: concurrent reads, exclusive writes, no
//! poisoning. Guards are never held across I/O or `.await`.

use std::path::PathBuf;

use parking_lot::RwLock;
use serde::Serialize;

use crate::graph::SpecGraphData;

/// Snapshot of the open project
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub root_path: Option<PathBuf>,
    pub graph: Option<SpecGraphData>,
    pub server_running: bool,
    pub ws_port: u16,
    pub http_port: u16,
}

/// Lock-protected project state shared with the forwarding task
#[derive(Debug, Default)]
pub struct SharedProjectState {
    inner: RwLock<ProjectState>,
}

impl SharedProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProjectState {
        self.inner.read().clone()
    }

    pub fn root_path(&self) -> Option<PathBuf> {
        self.inner.read().root_path.clone()
    }

    pub fn graph(&self) -> Option<SpecGraphData> {
        self.inner.read().graph.clone()
    }

    pub fn is_server_running(&self) -> bool {
        self.inner.read().server_running
    }

    /// Replace the whole state for a newly opened project
    pub fn open(&self, root_path: PathBuf, graph: SpecGraphData) {
        *self.inner.write() = ProjectState {
            root_path: Some(root_path),
            graph: Some(graph),
            ..ProjectState::default()
        };
    }

    /// Swap in a freshly parsed graph
    pub fn replace_graph(&self, graph: SpecGraphData) {
        self.inner.write().graph = Some(graph);
    }

    pub fn set_server_running(&self, ws_port: u16, http_port: u16) {
        let mut state = self.inner.write();
        state.server_running = true;
        state.ws_port = ws_port;
        state.http_port = http_port;
    }

    pub fn set_server_stopped(&self) {
        let mut state = self.inner.write();
        state.server_running = false;
        state.ws_port = 0;
        state.http_port = 0;
    }
}
