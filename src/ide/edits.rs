//! Text edits and their application.

use indexmap::IndexMap;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::base::DocumentUri;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub range: TextRange,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(range: TextRange, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }
}

/// Edits grouped by document, each group sorted by position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkspaceEdit {
    pub changes: IndexMap<DocumentUri, Vec<TextEdit>>,
}

impl WorkspaceEdit {
    pub fn is_empty(&self) -> bool {
        self.changes.values().all(Vec::is_empty)
    }

    pub fn edit_count(&self) -> usize {
        self.changes.values().map(Vec::len).sum()
    }

    pub fn edits_for(&self, uri: &DocumentUri) -> &[TextEdit] {
        self.changes.get(uri).map(Vec::as_slice).unwrap_or_default()
    }

    /// Add an edit, dropping exact duplicates.
    pub fn insert(&mut self, uri: DocumentUri, edit: TextEdit) {
        let edits = self.changes.entry(uri).or_default();
        if !edits.contains(&edit) {
            edits.push(edit);
        }
    }

    /// Sort every group by position and the groups by URI.
    pub(crate) fn normalize(&mut self) {
        for edits in self.changes.values_mut() {
            edits.sort_by_key(|edit| (edit.range.start(), edit.range.end()));
        }
        self.changes.sort_keys();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit {range:?} is outside of a text of length {len:?}")]
    OutOfBounds { range: TextRange, len: TextSize },
    #[error("edit {range:?} does not fall on character boundaries")]
    NotCharBoundary { range: TextRange },
    #[error("edits {first:?} and {second:?} overlap")]
    Overlapping { first: TextRange, second: TextRange },
}

/// Apply non-overlapping edits to `text`.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let len = TextSize::of(text);
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| (edit.range.start(), edit.range.end()));

    for edit in &sorted {
        if edit.range.end() > len {
            return Err(EditError::OutOfBounds {
                range: edit.range,
                len,
            });
        }
        if !text.is_char_boundary(edit.range.start().into())
            || !text.is_char_boundary(edit.range.end().into())
        {
            return Err(EditError::NotCharBoundary { range: edit.range });
        }
    }
    for pair in sorted.windows(2) {
        if pair[0].range.end() > pair[1].range.start() {
            return Err(EditError::Overlapping {
                first: pair[0].range,
                second: pair[1].range,
            });
        }
    }

    let mut result = text.to_string();
    for edit in sorted.iter().rev() {
        result.replace_range(std::ops::Range::<usize>::from(edit.range), &edit.new_text);
    }
    Ok(result)
}
