//! Go-to-declaration implementation.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::DocumentUri;
use crate::hir::Workspace;

use super::target::find_target;

/// Result of a go-to-declaration request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoResult {
    /// The targets to jump to.
    pub targets: Vec<GotoTarget>,
}

impl GotoResult {
    /// Create an empty result (no targets found).
    pub fn empty() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    /// Create a result with a single target.
    pub fn single(target: GotoTarget) -> Self {
        Self {
            targets: vec![target],
        }
    }

    /// Check if any targets were found.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A target location for go-to-declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoTarget {
    pub uri: DocumentUri,
    /// The declaration's name, or the whole node when it has none.
    pub range: TextRange,
    /// Full range of the declaring node.
    pub full_range: TextRange,
    pub node_type: SmolStr,
    pub name: Option<SmolStr>,
}

/// Where the node under the cursor is declared.
pub fn goto_declaration(workspace: &Workspace, uri: &DocumentUri, offset: TextSize) -> GotoResult {
    let Some(target) = find_target(workspace, uri, offset) else {
        return GotoResult::empty();
    };
    let tree = target.document.ast();
    let node = tree.node(target.node);
    let names = workspace.names();
    GotoResult::single(GotoTarget {
        uri: target.uri().clone(),
        range: names.name_range(tree, target.node).unwrap_or(node.range),
        full_range: node.range,
        node_type: node.type_name.clone(),
        name: names.name(tree, target.node),
    })
}
