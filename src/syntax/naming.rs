//! Naming of AST nodes.
//!
//! A node is named when it has a string `name` feature. The name range is
//! the source range recorded for that feature.

use smol_str::SmolStr;
use text_size::TextRange;

use super::ast::{AstTree, NodeId};

pub trait NameProvider: Send + Sync {
    fn name(&self, tree: &AstTree, node: NodeId) -> Option<SmolStr>;

    /// Range of the name in the source text.
    fn name_range(&self, tree: &AstTree, node: NodeId) -> Option<TextRange>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNameProvider;

impl NameProvider for DefaultNameProvider {
    fn name(&self, tree: &AstTree, node: NodeId) -> Option<SmolStr> {
        tree.node(node).string("name").map(SmolStr::new)
    }

    fn name_range(&self, tree: &AstTree, node: NodeId) -> Option<TextRange> {
        tree.node(node).feature_range("name")
    }
}

/// Joins the names of named containers with `.`: `outer.inner.Leaf`.
///
/// Only the containers' names take part; unnamed containers (the root,
/// usually) are skipped.
pub fn qualified_name(names: &dyn NameProvider, tree: &AstTree, node: NodeId) -> Option<SmolStr> {
    let own = names.name(tree, node)?;
    let mut segments: Vec<SmolStr> = tree
        .ancestors(node)
        .filter_map(|container| names.name(tree, container))
        .collect();
    segments.reverse();
    segments.push(own);
    Some(SmolStr::new(segments.join(".")))
}

/// Number of named containers between `node` and `ancestor`, `ancestor`
/// included. `None` when `ancestor` does not contain `node`.
pub fn qualifier_depth(
    names: &dyn NameProvider,
    tree: &AstTree,
    node: NodeId,
    ancestor: NodeId,
) -> Option<usize> {
    let mut depth = 0;
    for container in tree.ancestors(node) {
        if names.name(tree, container).is_some() {
            depth += 1;
        }
        if container == ancestor {
            return Some(depth);
        }
    }
    None
}
