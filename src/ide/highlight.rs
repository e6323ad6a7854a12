//! Document highlights: every occurrence of the target inside one document.

use text_size::{TextRange, TextSize};

use crate::base::DocumentUri;
use crate::hir::Workspace;

use super::target::find_target;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// The declaration's name.
    Write,
    /// A reference.
    Read,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentHighlight {
    pub range: TextRange,
    pub kind: HighlightKind,
}

/// Highlights in `uri` for the node under the cursor, in source order.
///
/// The declaration only shows up when it lives in the same document.
pub fn highlight(
    workspace: &Workspace,
    uri: &DocumentUri,
    offset: TextSize,
) -> Vec<DocumentHighlight> {
    let Some(target) = find_target(workspace, uri, offset) else {
        return Vec::new();
    };
    let mut highlights = Vec::new();
    if target.uri() == uri {
        if let Some(range) = workspace
            .names()
            .name_range(target.document.ast(), target.node)
        {
            highlights.push(DocumentHighlight {
                range,
                kind: HighlightKind::Write,
            });
        }
    }
    highlights.extend(
        workspace
            .find_references(target.uri(), &target.path, false)
            .into_iter()
            .filter(|edge| edge.source_uri == *uri)
            .map(|edge| DocumentHighlight {
                range: edge.segment,
                kind: HighlightKind::Read,
            }),
    );
    highlights.sort_by_key(|highlight| highlight.range.start());
    highlights
}
