//! Hierarchical view of the flat node list
//!
//! A node whose `parentId` does not resolve is treated as a root. A parent
//! chain that loops back on itself is cut at the first node found to be its
//! own ancestor, which is then promoted to a root, so every node appears in
//! the tree exactly once.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::model::SpecNode;

/// A node together with its resolved children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: SpecNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Depth-first lookup in this subtree
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.node.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Effective parent of every node after dangling references and cycles are
/// resolved. Roots map to `None`.
pub fn resolve_parents(nodes: &[SpecNode]) -> HashMap<&str, Option<&str>> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut parents: HashMap<&str, Option<&str>> = nodes
        .iter()
        .map(|n| {
            let parent = n
                .parent_id
                .as_deref()
                .filter(|p| ids.contains(p) && *p != n.id.as_str());
            if n.parent_id.is_some() && parent.is_none() {
                tracing::debug!("[GRAPH] Node {} has unresolved parent, treating as root", n.id);
            }
            (n.id.as_str(), parent)
        })
        .collect();

    for node in nodes {
        let start = node.id.as_str();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(start);
        let mut current = parents.get(start).copied().flatten();
        while let Some(id) = current {
            if id == start {
                tracing::warn!("[GRAPH] Node {} is its own ancestor, promoting it to root", start);
                parents.insert(start, None);
                break;
            }
            if !seen.insert(id) {
                // Leads into a cycle `start` is not part of; cut when a member is visited
                break;
            }
            current = parents.get(id).copied().flatten();
        }
    }

    parents
}

/// Build the forest of roots, preserving input order among siblings
pub fn build_tree(nodes: &[SpecNode]) -> Vec<TreeNode> {
    let parents = resolve_parents(nodes);

    let mut children: HashMap<&str, Vec<&SpecNode>> = HashMap::new();
    let mut roots: Vec<&SpecNode> = Vec::new();
    for node in nodes {
        match parents.get(node.id.as_str()).copied().flatten() {
            Some(parent) => children.entry(parent).or_default().push(node),
            None => roots.push(node),
        }
    }

    fn assemble(node: &SpecNode, children: &HashMap<&str, Vec<&SpecNode>>) -> TreeNode {
        let kids = children
            .get(node.id.as_str())
            .map(|kids| kids.iter().map(|k| assemble(k, children)).collect())
            .unwrap_or_default();
        TreeNode {
            node: node.clone(),
            children: kids,
        }
    }

    roots.into_iter().map(|r| assemble(r, &children)).collect()
}

/// Find a node anywhere in a forest
pub fn find_node<'a>(roots: &'a [TreeNode], id: &str) -> Option<&'a TreeNode> {
    roots.iter().find_map(|root| root.find(id))
}
