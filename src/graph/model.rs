//! Spec graph data model
//!
//! These types are the exact on-disk shape of `spec_graph.json`. None of the
//! persisted types carries a screen position: coordinates only exist on the
//! runtime [`LayoutNode`] / [`LayoutEdge`] types and are recomputed on every
//! layout pass. Unknown fields in a loaded file (including stray `x`/`y` or
//! `points`) are dropped by deserialization and never written back.

use serde::{Deserialize, Serialize};

/// Node category, determines rendering and behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecNodeCategory {
    /// Container node, rendered as a cluster
    Group,
    /// Leaf node, rendered as a card
    Spec,
}

/// Node lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecNodeStatus {
    #[default]
    Pending,
    Verified,
    Broken,
    Approved,
}

/// Persisted graph vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecNode {
    pub id: String,
    pub category: SpecNodeCategory,
    pub label: String,
    #[serde(default)]
    pub status: SpecNodeStatus,
    /// Parent node id; `None` for roots. Always serialized (as `null` for roots).
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SpecNode {
    pub fn new(id: impl Into<String>, category: SpecNodeCategory, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            label: label.into(),
            status: SpecNodeStatus::Pending,
            parent_id: None,
            description: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_status(mut self, status: SpecNodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_group(&self) -> bool {
        self.category == SpecNodeCategory::Group
    }
}

/// Persisted directed relation between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SpecEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
        }
    }
}

/// Graph metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMeta {
    pub name: String,
    pub version: String,
}

/// The persisted unit, the exact structure of `spec_graph.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecGraphData {
    pub meta: GraphMeta,
    pub nodes: Vec<SpecNode>,
    pub edges: Vec<SpecEdge>,
}

impl SpecGraphData {
    /// Empty graph held when a project has no graph file yet
    pub fn untitled() -> Self {
        Self {
            meta: GraphMeta {
                name: "Untitled".to_string(),
                version: "1.0.0".to_string(),
            },
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Identifier advertised to transport clients
    pub fn graph_id(&self) -> &str {
        &self.meta.name
    }

    pub fn node(&self, id: &str) -> Option<&SpecNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Direct children of `parent_id`
    pub fn children_of<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a SpecNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(parent_id))
    }

    /// Edges with `node_id` on either end
    pub fn edges_touching<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a SpecEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.from == node_id || e.to == node_id)
    }

    /// Nodes sharing an edge with `node_id`, excluding the node itself
    pub fn connected_nodes(&self, node_id: &str) -> Vec<&SpecNode> {
        let mut ids: Vec<&str> = Vec::new();
        for edge in self.edges_touching(node_id) {
            for id in [edge.from.as_str(), edge.to.as_str()] {
                if id != node_id && !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        self.nodes
            .iter()
            .filter(|n| ids.contains(&n.id.as_str()))
            .collect()
    }

    pub fn group_nodes(&self) -> impl Iterator<Item = &SpecNode> {
        self.nodes.iter().filter(|n| n.is_group())
    }
}

/// 2D point on a rendered edge path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Runtime-only node with layout geometry. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    #[serde(flatten)]
    pub node: SpecNode,
    /// Center x
    pub x: f64,
    /// Center y
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Runtime-only edge with its rendered path. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    #[serde(flatten)]
    pub edge: SpecEdge,
    pub points: Vec<Point>,
}
