//! Find references implementation.

use text_size::{TextRange, TextSize};

use crate::base::DocumentUri;
use crate::hir::Workspace;

use super::target::find_target;

/// Result of a find-references request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceResult {
    /// All references found, declaration first when included.
    pub references: Vec<ReferenceLocation>,
    /// Include the definition in the results.
    pub include_declaration: bool,
}

impl ReferenceResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            references: Vec::new(),
            include_declaration: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

/// One occurrence of the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceLocation {
    pub uri: DocumentUri,
    pub range: TextRange,
    /// The declaration's name rather than a reference.
    pub is_definition: bool,
}

/// Every occurrence of the node under the cursor across the workspace.
pub fn find_references(
    workspace: &Workspace,
    uri: &DocumentUri,
    offset: TextSize,
    include_declaration: bool,
) -> ReferenceResult {
    let Some(target) = find_target(workspace, uri, offset) else {
        return ReferenceResult::empty();
    };

    let mut references = Vec::new();
    if include_declaration {
        if let Some(range) = workspace
            .names()
            .name_range(target.document.ast(), target.node)
        {
            references.push(ReferenceLocation {
                uri: target.uri().clone(),
                range,
                is_definition: true,
            });
        }
    }
    references.extend(
        workspace
            .find_references(target.uri(), &target.path, false)
            .into_iter()
            .map(|edge| ReferenceLocation {
                uri: edge.source_uri,
                range: edge.segment,
                is_definition: false,
            }),
    );

    ReferenceResult {
        references,
        include_declaration,
    }
}
