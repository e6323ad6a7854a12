//! Rename with qualified-name propagation.
//!
//! Renaming `p` in
//!
//! ```text
//! package p { entity E {} }
//! entity F extends p.E {}
//! ```
//!
//! rewrites the declaration name and the `p` segment of `p.E`. In general:
//!
//! - references to the target change only their last segment, so a
//!   qualifier that happens to spell the old name is left alone
//! - references to nodes inside the target change the segment that names the
//!   target, found by counting named containers between the two
//!
//! Edits are deduplicated and grouped per document.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::base::DocumentUri;
use crate::hir::{ReferenceDescription, Workspace};
use crate::syntax::{node_path, qualifier_depth};

use super::edits::{TextEdit, WorkspaceEdit};
use super::target::find_target;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
    #[error("no renameable element at the cursor")]
    NoTarget,
    #[error("the element at the cursor has no name")]
    Unnamed,
}

/// Whether `name` is a plain identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || unicode_ident::is_xid_start(first))
        && chars.all(unicode_ident::is_xid_continue)
}

/// The edits renaming the node under the cursor to `new_name`.
pub fn rename(
    workspace: &Workspace,
    uri: &DocumentUri,
    offset: TextSize,
    new_name: &str,
) -> Result<WorkspaceEdit, RenameError> {
    if !is_valid_identifier(new_name) {
        return Err(RenameError::InvalidIdentifier(new_name.to_string()));
    }
    let target = find_target(workspace, uri, offset).ok_or(RenameError::NoTarget)?;
    let names = workspace.names();
    let tree = target.document.ast();
    let old_name = names.name(tree, target.node).ok_or(RenameError::Unnamed)?;

    let mut edit = WorkspaceEdit::default();
    if let Some(range) = names.name_range(tree, target.node) {
        edit.insert(target.uri().clone(), TextEdit::replace(range, new_name));
    }

    for reference in workspace.find_references(target.uri(), &target.path, false) {
        if let Some(range) = segment_range(workspace, &reference, &old_name, 0) {
            edit.insert(reference.source_uri, TextEdit::replace(range, new_name));
        }
    }

    for node in tree.descendants(target.node).into_iter().skip(1) {
        let Some(depth) = qualifier_depth(names, tree, node, target.node) else {
            continue;
        };
        let path = node_path(tree, node);
        for reference in workspace.find_references(target.uri(), &path, false) {
            if let Some(range) = segment_range(workspace, &reference, &old_name, depth) {
                edit.insert(reference.source_uri, TextEdit::replace(range, new_name));
            }
        }
    }

    edit.normalize();
    tracing::debug!(
        old = %old_name,
        new = new_name,
        edits = edit.edit_count(),
        "computed rename"
    );
    Ok(edit)
}

/// Range of the segment `depth` places before the last one in the source text
/// of `reference`, if that segment reads `expected`.
fn segment_range(
    workspace: &Workspace,
    reference: &ReferenceDescription,
    expected: &SmolStr,
    depth: usize,
) -> Option<TextRange> {
    let document = workspace.document(&reference.source_uri)?;
    let text = document.text().get(std::ops::Range::<usize>::from(reference.segment))?;
    let segments = segments(text);
    let index = segments.len().checked_sub(1 + depth)?;
    let (range, segment) = segments[index];
    (segment == expected.as_str()).then(|| range + reference.segment.start())
}

/// `.`-separated segments of a qualified name with their ranges relative to
/// the start of `text`. Whitespace around the separators is not part of any
/// segment.
fn segments(text: &str) -> Vec<(TextRange, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for piece in text.split('.') {
        let trimmed = piece.trim();
        let lead = piece.len() - piece.trim_start().len();
        let from = TextSize::try_from(start + lead).unwrap_or_default();
        out.push((TextRange::at(from, TextSize::of(trimmed)), trimmed));
        start += piece.len() + 1;
    }
    out
}
