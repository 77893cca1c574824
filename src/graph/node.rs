use std::collections::HashMap;

use sha2::{Digest, Sha256};

use super::reflection::ResolvedRelationship;

/// An index into a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One node of the resource graph: a distinct dotted path from the root. Two occurrences of
/// the same path (say, once from a relationship and once from an include) share one node, so
/// everything keyed by node, including the derived correlation name, is computed once per
/// path.
#[derive(Debug)]
pub struct ResourceNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// The singular entity name this node serializes
    pub entity: String,
    /// The dotted path from the root, e.g. `notes.user.notes`
    pub full_path: String,
    /// The relationship name under which this node hangs off its parent; for the root node,
    /// the root path itself
    pub name: String,
    /// How this node relates to its parent. `None` for the root.
    pub reflection: Option<ResolvedRelationship>,
    /// The statement-unique correlation name for this node's CTE
    pub cte_name: String,
}

/// Owns every [`ResourceNode`] of one compilation, memoized by full path.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<ResourceNode>,
    by_path: HashMap<String, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root node. Its CTE is always named `t`.
    pub fn insert_root(&mut self, entity: impl Into<String>, path: impl Into<String>) -> NodeId {
        let path = path.into();
        self.insert(None, entity.into(), path.clone(), path, None, "t".to_string())
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        entity: impl Into<String>,
        reflection: ResolvedRelationship,
    ) -> NodeId {
        let name = name.into();
        let full_path = format!("{}.{}", self.node(parent).full_path, name);
        let cte_name = correlation_name(&full_path);
        self.insert(
            Some(parent),
            entity.into(),
            full_path,
            name,
            Some(reflection),
            cte_name,
        )
    }

    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn node(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id.0]
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        entity: String,
        full_path: String,
        name: String,
        reflection: Option<ResolvedRelationship>,
        cte_name: String,
    ) -> NodeId {
        if let Some(existing) = self.by_path.get(&full_path) {
            return *existing;
        }
        let id = NodeId(self.nodes.len());
        self.by_path.insert(full_path.clone(), id);
        self.nodes.push(ResourceNode {
            id,
            parent,
            entity,
            full_path,
            name,
            reflection,
            cte_name,
        });
        id
    }
}

/// The correlation name for a non-root path: `cte_` followed by the first ten hex digits of
/// the path's SHA-256. Hashing keeps the name valid and unique regardless of how deep or
/// oddly-named the path is.
fn correlation_name(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    let hex: String = digest[..5].iter().map(|byte| format!("{byte:02x}")).collect();
    format!("cte_{hex}")
}
