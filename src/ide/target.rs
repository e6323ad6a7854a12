//! Cursor → target node.

use text_size::{TextRange, TextSize};

use crate::base::DocumentUri;
use crate::hir::{Document, Workspace};
use crate::parser::CstToken;
use crate::syntax::{NodeId, node_at_path, node_path};

/// The node a cursor designates, in the document that declares it.
pub(crate) struct Target<'w> {
    pub document: &'w Document,
    pub node: NodeId,
    pub path: String,
}

impl Target<'_> {
    pub fn uri(&self) -> &DocumentUri {
        self.document.uri()
    }
}

/// The significant token under `offset`, preferring the one to the right.
pub(crate) fn leaf_token(
    workspace: &Workspace,
    document: &Document,
    offset: TextSize,
) -> Option<CstToken> {
    if offset > TextSize::of(document.text()) {
        return None;
    }
    let tokens = workspace.grammar().tokens();
    let root = document.parse_result().syntax();
    let mut candidates: Vec<CstToken> = root.token_at_offset(offset).collect();
    candidates.reverse();
    candidates.into_iter().find(|token| {
        token
            .kind()
            .as_token()
            .is_some_and(|id| !tokens.get(id).is_hidden())
    })
}

/// Resolve the cursor to a declaration: through the reference under it, or
/// the named node whose name it is on.
pub(crate) fn find_target<'w>(
    workspace: &'w Workspace,
    uri: &DocumentUri,
    offset: TextSize,
) -> Option<Target<'w>> {
    let document = workspace.document(uri)?;
    let token = leaf_token(workspace, document, offset)?;
    let range = token.text_range();
    let tree = document.ast();

    if let Some((id, _)) = tree
        .references()
        .find(|(_, reference)| reference.range.contains_range(range))
    {
        let target = document.link(id).target()?;
        let declaring = workspace.document(&target.document_uri)?;
        let node = node_at_path(declaring.ast(), &target.path)?;
        return Some(Target {
            document: declaring,
            node,
            path: target.path.clone(),
        });
    }

    let names = workspace.names();
    let innermost = tree.node_at_offset(range.start())?;
    std::iter::once(innermost)
        .chain(tree.ancestors(innermost))
        .find(|&node| {
            names
                .name_range(tree, node)
                .is_some_and(|name: TextRange| name.contains_range(range))
        })
        .map(|node| Target {
            document,
            node,
            path: node_path(tree, node),
        })
}
