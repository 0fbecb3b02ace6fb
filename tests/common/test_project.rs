//! TestProject builder for prototype directories

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

/// Builder for a project directory holding HTML pages and a graph file
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create a new empty project
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Project root as created (not canonicalized)
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Canonical project root, the form the session reports
    pub fn canonical(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize project root")
    }

    /// Add a file with the given content
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    /// Add a minimal HTML page
    pub fn add_page(&self, relative_path: &str, title: &str) -> &Self {
        self.add_file(
            relative_path,
            &format!(
                "<!DOCTYPE html>\n<html>\n<head><title>{0}</title></head>\n<body>\n<h1 data-node-id=\"{0}\">{0}</h1>\n</body>\n</html>\n",
                title
            ),
        )
    }

    /// Write `spec_graph.json` at the project root
    pub fn with_graph(&self, name: &str) -> &Self {
        self.add_file("spec_graph.json", &sample_graph(name).to_string())
    }

    /// Write `.LiveSpec/spec_graph.json`
    pub fn with_dedicated_graph(&self, name: &str) -> &Self {
        self.add_file(".LiveSpec/spec_graph.json", &sample_graph(name).to_string())
    }

    /// Create a project with an index page and a root graph
    pub fn prototype(name: &str) -> Self {
        let project = Self::new();
        project.add_page("index.html", "Home").with_graph(name);
        project
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Three nodes under one group, plus one dangling edge
pub fn sample_graph(name: &str) -> serde_json::Value {
    json!({
        "meta": {"name": name, "version": "1.0.0"},
        "nodes": [
            {"id": "app", "category": "group", "label": "App", "status": "pending", "parentId": null},
            {"id": "home", "category": "spec", "label": "Home", "status": "verified", "parentId": "app"},
            {"id": "cart", "category": "spec", "label": "Cart", "status": "pending", "parentId": "app"}
        ],
        "edges": [
            {"from": "home", "to": "cart"},
            {"from": "cart", "to": "checkout"}
        ]
    })
}
