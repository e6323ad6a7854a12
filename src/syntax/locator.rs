//! Structural paths of AST nodes.
//!
//! A path names a node by the features leading to it from the root:
//! `/elements@2/features@0`. The root's path is the empty string. Paths are
//! stable across reparses of the same text, which makes them usable as
//! cross-document node identities.

use super::ast::{AstTree, NodeId, Value};

/// Path of `node` inside `tree`.
pub fn node_path(tree: &AstTree, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = node;
    while let Some(link) = tree.node(current).container.as_ref() {
        segments.push(match link.index {
            Some(index) => format!("/{}@{}", link.feature, index),
            None => format!("/{}", link.feature),
        });
        current = link.node;
    }
    segments.reverse();
    segments.concat()
}

/// Resolve a path produced by [`node_path`].
pub fn node_at_path(tree: &AstTree, path: &str) -> Option<NodeId> {
    let mut current = tree.root();
    for segment in path.split('/').skip(1) {
        let (feature, index) = match segment.split_once('@') {
            Some((feature, index)) => (feature, Some(index.parse::<usize>().ok()?)),
            None => (segment, None),
        };
        let value = tree.node(current).feature(feature)?;
        current = match (value, index) {
            (Value::List(values), Some(index)) => values.get(index)?.as_node()?,
            (Value::Node(id), None) => *id,
            _ => return None,
        };
    }
    Some(current)
}
