//! Project path resolution
//!
//! A project is a user-selected root directory, optionally containing a
//! dedicated `.LiveSpec` subdirectory. Two lookups prefer opposite locations:
//! the graph file is looked up in the root first (see
//! [`crate::graph::find_graph_file`]), while static files are served from the
//! dedicated subdirectory first ([`static_root`]).

use std::path::{Path, PathBuf};

use crate::fs_utils;
use crate::{LiveSpecError, Result};

/// Name of the dedicated project subdirectory
pub const DEDICATED_DIR_NAME: &str = ".LiveSpec";

/// Undotted variant some users create by hand
const DEDICATED_DIR_ALIAS: &str = "LiveSpec";

/// Resolve an optional path, defaulting to the current working directory.
/// Relative paths are joined onto the current working directory.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    let cwd = || {
        std::env::current_dir().map_err(|e| LiveSpecError::FileNotFound {
            path: format!("current directory: {}", e),
        })
    };
    match path {
        Some(p) if p.is_absolute() => Ok(p.to_path_buf()),
        Some(p) => Ok(cwd()?.join(p)),
        None => cwd(),
    }
}

/// Turn a user selection into a project root.
///
/// Selecting the dedicated subdirectory itself opens its parent. The result
/// is canonical; a selection that is not an existing directory is an error.
pub fn normalize_project_selection(selection: &Path) -> Result<PathBuf> {
    let resolved = resolve_path(Some(selection))?;
    let canonical = fs_utils::canonical(&resolved).map_err(|e| LiveSpecError::IoError {
        path: resolved.clone(),
        message: e.to_string(),
    })?;
    if !canonical.is_dir() {
        return Err(LiveSpecError::FileNotFound {
            path: format!("{} is not a directory", canonical.display()),
        });
    }

    let is_dedicated = canonical
        .file_name()
        .map(|name| name == DEDICATED_DIR_NAME || name == DEDICATED_DIR_ALIAS)
        .unwrap_or(false);
    if is_dedicated {
        if let Some(parent) = canonical.parent() {
            tracing::info!(
                "[SESSION] Selected {} subdirectory, using parent {}",
                DEDICATED_DIR_NAME,
                parent.display()
            );
            return Ok(parent.to_path_buf());
        }
    }
    Ok(canonical)
}

/// The dedicated subdirectory, if it exists
pub fn dedicated_dir(root: &Path) -> Option<PathBuf> {
    let dir = root.join(DEDICATED_DIR_NAME);
    dir.is_dir().then_some(dir)
}

/// Directory static files are served from
pub fn static_root(root: &Path) -> PathBuf {
    dedicated_dir(root).unwrap_or_else(|| root.to_path_buf())
}
