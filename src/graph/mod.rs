//! Spec graph: data model, file format, hierarchy and layout contract
//!
//! - `model` - persisted and runtime-only graph types
//! - `io` - `spec_graph.json` discovery, validation and atomic saves
//! - `tree` - parent/child forest with dangling-parent and cycle handling
//! - `layout` - layout collaborator trait, edge filtering, default engine

pub mod io;
pub mod layout;
pub mod model;
pub mod tree;

pub use io::{
    find_graph_file, is_graph_file, load_graph, load_graph_async, parse_graph, save_graph,
    GRAPH_FILE_NAME,
};
pub use layout::{
    compute_layout, partition_edges, EdgePartition, GraphLayout, LayeredLayout, LayoutConfig,
    LayoutEngine,
};
pub use model::{
    GraphMeta, LayoutEdge, LayoutNode, Point, SpecEdge, SpecGraphData, SpecNode,
    SpecNodeCategory, SpecNodeStatus,
};
pub use tree::{build_tree, find_node, TreeNode};
