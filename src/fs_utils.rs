//! Cross-platform filesystem utilities
//!
//! - `normalize_path`: Strips Windows `\\?\` prefix from canonicalized paths
//! - `atomic_rename`: Handles atomic file replacement (Windows requires explicit delete)

use std::io;
use std::path::{Path, PathBuf};

/// Normalize Windows paths by removing the `\\?\` prefix if present.
///
/// On Windows, `Path::canonicalize()` returns paths with the extended-length
/// prefix, which breaks string comparison against paths reported by the file
/// watcher and confuses anyone reading the health endpoint. No-op on Unix.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use livespec::fs_utils::normalize_path;
///
/// let path = PathBuf::from("/home/user/project");
/// assert_eq!(normalize_path(&path), path);
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{}", stripped));
        }
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return PathBuf::from(stripped);
        }
    }
    path.to_path_buf()
}

/// Canonicalize and normalize in one step
pub fn canonical(path: &Path) -> io::Result<PathBuf> {
    path.canonicalize().map(|p| normalize_path(&p))
}

/// Cross-platform atomic rename that handles Windows file replacement.
///
/// On Unix, `fs::rename` atomically replaces the target if it exists.
/// On Windows, `fs::rename` fails if the target exists, so the target is
/// removed first.
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
    }
    std::fs::rename(src, dst)
}
