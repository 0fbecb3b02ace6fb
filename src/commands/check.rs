//! Check command handler - parse, validate and optionally lay out a graph

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cli::CheckArgs;
use crate::commands::{init_tracing, CommandContext};
use crate::error::{LiveSpecError, Result};
use crate::graph::{
    build_tree, compute_layout, find_graph_file, load_graph, partition_edges, LayeredLayout,
    LayoutConfig, SpecGraphData, TreeNode,
};

/// Validate a graph file and report on it
pub fn run_check(args: &CheckArgs, ctx: &CommandContext) -> Result<String> {
    init_tracing(ctx.log_level());

    let path = graph_path(&args.file)?;
    let graph = load_graph(&path)?;

    if args.layout {
        return layout_json(&graph);
    }
    Ok(report(&path, &graph))
}

/// Accept either the graph file itself or a project directory
fn graph_path(input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        return find_graph_file(input).ok_or_else(|| LiveSpecError::FileNotFound {
            path: input.join(crate::graph::GRAPH_FILE_NAME).display().to_string(),
        });
    }
    if !input.exists() {
        return Err(LiveSpecError::FileNotFound {
            path: input.display().to_string(),
        });
    }
    Ok(input.to_path_buf())
}

/// Human-readable summary
pub fn report(path: &Path, graph: &SpecGraphData) -> String {
    let partition = partition_edges(&graph.nodes, &graph.edges);
    let roots = build_tree(&graph.nodes);

    let mut out = String::new();
    let _ = writeln!(out, "{}", path.display());
    let _ = writeln!(
        out,
        "  graph: {} (v{})",
        graph.meta.name, graph.meta.version
    );
    let _ = writeln!(
        out,
        "  nodes: {} ({} groups)",
        graph.nodes.len(),
        graph.group_nodes().count()
    );
    let _ = writeln!(out, "  edges: {}", graph.edges.len());
    if partition.dropped > 0 {
        let _ = writeln!(out, "  dropped edges: {} (dangling endpoint)", partition.dropped);
    }
    let _ = writeln!(out, "  roots: {}", roots.len());
    for root in &roots {
        write_tree(&mut out, root, 2);
    }
    out
}

fn write_tree(out: &mut String, node: &TreeNode, depth: usize) {
    let _ = writeln!(
        out,
        "{}- {} [{}]",
        "  ".repeat(depth),
        node.node.label,
        node.id()
    );
    for child in &node.children {
        write_tree(out, child, depth + 1);
    }
}

/// Laid-out graph as pretty JSON
fn layout_json(graph: &SpecGraphData) -> Result<String> {
    let engine = LayeredLayout::new(LayoutConfig::default());
    let layout = compute_layout(graph, &engine);
    let value = json!({
        "meta": graph.meta,
        "nodes": layout.nodes,
        "edges": layout.edges,
        "droppedEdges": layout.dropped_edges,
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
}
