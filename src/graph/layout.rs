//! Layout collaborator contract
//!
//! Layout is a pure function: sized nodes, parent relationships and edges go
//! in, positioned nodes and edge point lists come out. Geometry is pluggable
//! through [`LayoutEngine`]; this module owns everything around it: node size
//! estimation, dropping edges whose endpoints do not exist, and mapping the
//! engine output back onto [`LayoutNode`] / [`LayoutEdge`].
//!
//! [`LayeredLayout`] is a small left-to-right ranking engine used when no
//! external engine is plugged in.

use std::collections::{HashMap, HashSet};

use super::model::{
    LayoutEdge, LayoutNode, Point, SpecEdge, SpecGraphData, SpecNode, SpecNodeCategory,
};

pub const NODE_WIDTH: f64 = 180.0;
pub const NODE_HEIGHT: f64 = 80.0;
pub const GROUP_WIDTH: f64 = 350.0;
pub const GROUP_HEIGHT: f64 = 250.0;

/// Spacing parameters for rank-based engines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal gap between ranks
    pub rank_sep: f64,
    /// Vertical gap between nodes in one rank
    pub node_sep: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_sep: 80.0,
            node_sep: 50.0,
            margin_x: 50.0,
            margin_y: 50.0,
        }
    }
}

/// Estimated rendered size for a node category
pub fn estimate_node_size(category: SpecNodeCategory) -> (f64, f64) {
    match category {
        SpecNodeCategory::Group => (GROUP_WIDTH, GROUP_HEIGHT),
        SpecNodeCategory::Spec => (NODE_WIDTH, NODE_HEIGHT),
    }
}

/// Node as handed to a layout engine
#[derive(Debug, Clone, PartialEq)]
pub struct SizedNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub parent: Option<String>,
}

/// Engine input. Every edge endpoint is guaranteed to exist in `nodes`.
#[derive(Debug, Clone, Default)]
pub struct LayoutInput {
    pub nodes: Vec<SizedNode>,
    pub edges: Vec<(String, String)>,
}

/// Position and size of one node, center-anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutOutput {
    pub nodes: HashMap<String, NodePlacement>,
    pub edges: HashMap<(String, String), Vec<Point>>,
}

/// External geometry collaborator
pub trait LayoutEngine {
    fn layout(&self, input: &LayoutInput) -> LayoutOutput;
}

/// Edges split by whether both endpoints resolve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePartition {
    pub valid: Vec<SpecEdge>,
    pub dropped: usize,
}

/// Drop edges pointing at nonexistent node ids
pub fn partition_edges(nodes: &[SpecNode], edges: &[SpecEdge]) -> EdgePartition {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut partition = EdgePartition::default();

    for edge in edges {
        let has_source = ids.contains(edge.from.as_str());
        let has_target = ids.contains(edge.to.as_str());
        if !has_source {
            tracing::debug!("[LAYOUT] Edge source not found: {}", edge.from);
        }
        if !has_target {
            tracing::debug!("[LAYOUT] Edge target not found: {}", edge.to);
        }
        if has_source && has_target {
            partition.valid.push(edge.clone());
        } else {
            partition.dropped += 1;
        }
    }

    partition
}

/// Result of a layout pass
#[derive(Debug, Clone, Default)]
pub struct GraphLayout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    /// Edges removed because an endpoint did not exist
    pub dropped_edges: usize,
}

/// Run a layout pass over a graph
pub fn compute_layout(graph: &SpecGraphData, engine: &dyn LayoutEngine) -> GraphLayout {
    if graph.nodes.is_empty() {
        return GraphLayout::default();
    }

    let partition = partition_edges(&graph.nodes, &graph.edges);
    if partition.dropped > 0 {
        tracing::warn!("[LAYOUT] Filtered {} invalid edges", partition.dropped);
    }

    let parents = super::tree::resolve_parents(&graph.nodes);
    let input = LayoutInput {
        nodes: graph
            .nodes
            .iter()
            .map(|n| {
                let (width, height) = estimate_node_size(n.category);
                SizedNode {
                    id: n.id.clone(),
                    width,
                    height,
                    parent: parents
                        .get(n.id.as_str())
                        .copied()
                        .flatten()
                        .map(str::to_string),
                }
            })
            .collect(),
        edges: partition
            .valid
            .iter()
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect(),
    };

    let output = engine.layout(&input);

    let nodes = graph
        .nodes
        .iter()
        .map(|node| match output.nodes.get(&node.id) {
            Some(p) => LayoutNode {
                node: node.clone(),
                x: p.x,
                y: p.y,
                width: p.width,
                height: p.height,
            },
            None => {
                tracing::warn!("[LAYOUT] Node {} missing from layout output", node.id);
                let (width, height) = estimate_node_size(node.category);
                LayoutNode {
                    node: node.clone(),
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                }
            }
        })
        .collect();

    let edges = partition
        .valid
        .into_iter()
        .map(|edge| {
            let points = output
                .edges
                .get(&(edge.from.clone(), edge.to.clone()))
                .cloned()
                .unwrap_or_default();
            LayoutEdge { edge, points }
        })
        .collect();

    GraphLayout {
        nodes,
        edges,
        dropped_edges: partition.dropped,
    }
}

/// Left-to-right longest-path ranking.
///
/// Parent relationships are not drawn as clusters; groups are simply larger
/// nodes.
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    pub config: LayoutConfig,
}

impl LayeredLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn ranks(input: &LayoutInput) -> HashMap<&str, usize> {
        let mut rank: HashMap<&str, usize> =
            input.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        let limit = input.nodes.len().saturating_sub(1);

        // Bounded relaxation: cycles stop growing at `limit`
        for _ in 0..input.nodes.len() {
            let mut changed = false;
            for (from, to) in &input.edges {
                let candidate = rank[from.as_str()] + 1;
                if candidate <= limit && candidate > rank[to.as_str()] {
                    rank.insert(to.as_str(), candidate);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        rank
    }
}

impl LayoutEngine for LayeredLayout {
    fn layout(&self, input: &LayoutInput) -> LayoutOutput {
        let cfg = self.config;
        let ranks = Self::ranks(input);
        let rank_count = ranks.values().copied().max().map_or(0, |r| r + 1);

        let mut columns: Vec<Vec<&SizedNode>> = vec![Vec::new(); rank_count];
        for node in &input.nodes {
            columns[ranks[node.id.as_str()]].push(node);
        }

        let mut output = LayoutOutput::default();
        let mut left = cfg.margin_x;
        for column in &columns {
            let col_width = column.iter().map(|n| n.width).fold(0.0, f64::max);
            let mut top = cfg.margin_y;
            for node in column {
                output.nodes.insert(
                    node.id.clone(),
                    NodePlacement {
                        x: left + col_width / 2.0,
                        y: top + node.height / 2.0,
                        width: node.width,
                        height: node.height,
                    },
                );
                top += node.height + cfg.node_sep;
            }
            left += col_width + cfg.rank_sep;
        }

        for (from, to) in &input.edges {
            let (Some(a), Some(b)) = (output.nodes.get(from), output.nodes.get(to)) else {
                continue;
            };
            let points = if b.x > a.x {
                vec![
                    Point { x: a.x + a.width / 2.0, y: a.y },
                    Point { x: b.x - b.width / 2.0, y: b.y },
                ]
            } else {
                vec![Point { x: a.x, y: a.y }, Point { x: b.x, y: b.y }]
            };
            output.edges.insert((from.clone(), to.clone()), points);
        }

        output
    }
}
