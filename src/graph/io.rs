//! Graph file discovery, loading and saving

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LiveSpecError, Result};
use crate::fs_utils;
use crate::paths::DEDICATED_DIR_NAME;

use super::model::SpecGraphData;

/// Canonical graph file name
pub const GRAPH_FILE_NAME: &str = "spec_graph.json";

/// Locate the graph file for a project.
///
/// The project root takes precedence over the dedicated subdirectory when
/// both contain a graph file. Returns `None` if neither exists.
pub fn find_graph_file(root: &Path) -> Option<PathBuf> {
    let in_root = root.join(GRAPH_FILE_NAME);
    if in_root.is_file() {
        return Some(in_root);
    }
    let in_dedicated = root.join(DEDICATED_DIR_NAME).join(GRAPH_FILE_NAME);
    if in_dedicated.is_file() {
        tracing::debug!("[GRAPH] Using graph file in {} subdirectory", DEDICATED_DIR_NAME);
        return Some(in_dedicated);
    }
    None
}

/// Whether `path` names a graph file
pub fn is_graph_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name == GRAPH_FILE_NAME)
        .unwrap_or(false)
}

/// Parse and validate graph text.
///
/// The minimal shape check (`meta` present, `nodes` and `edges` arrays) runs
/// before typed deserialization so a truncated file is reported as a
/// structural problem rather than a field error.
pub fn parse_graph(content: &str) -> Result<SpecGraphData> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    let obj = value.as_object().ok_or_else(|| LiveSpecError::InvalidGraph {
        message: "graph root must be an object".to_string(),
    })?;
    if obj.get("meta").map_or(true, |m| m.is_null()) {
        return Err(LiveSpecError::InvalidGraph {
            message: "missing 'meta'".to_string(),
        });
    }
    for key in ["nodes", "edges"] {
        if !obj.get(key).map_or(false, |v| v.is_array()) {
            return Err(LiveSpecError::InvalidGraph {
                message: format!("'{}' must be an array", key),
            });
        }
    }

    serde_json::from_value(value).map_err(|e| LiveSpecError::InvalidGraph {
        message: e.to_string(),
    })
}

/// Read and parse a graph file
pub fn load_graph(path: &Path) -> Result<SpecGraphData> {
    let content = fs::read_to_string(path).map_err(|e| LiveSpecError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_graph(&content).map_err(|e| LiveSpecError::GraphParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Async variant used by the change-handling path
pub async fn load_graph_async(path: &Path) -> Result<SpecGraphData> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LiveSpecError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    parse_graph(&content).map_err(|e| LiveSpecError::GraphParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a graph file atomically (temp file, then rename)
pub fn save_graph(path: &Path, graph: &SpecGraphData) -> Result<()> {
    let content = serde_json::to_string_pretty(graph)?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(|e| LiveSpecError::IoError {
        path: temp_path.clone(),
        message: e.to_string(),
    })?;
    fs_utils::atomic_rename(&temp_path, path).map_err(|e| LiveSpecError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
