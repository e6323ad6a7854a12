//! Workspace-wide index of exported names and reference edges.
//!
//! Each document owns one [`IndexEntry`]. Entries are immutable once
//! published; updating a document swaps in a new `Arc` under the write lock,
//! so readers holding an old entry never observe a half-updated one.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::DocumentUri;

use super::descriptions::{AstNodeDescription, ReferenceDescription};

/// What one document contributes to the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    pub exports: Vec<AstNodeDescription>,
    /// Resolved references whose source is this document.
    pub references: Vec<ReferenceDescription>,
}

#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    entries: RwLock<FxHashMap<DocumentUri, Arc<IndexEntry>>>,
}

impl Clone for WorkspaceIndex {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.entries.read().clone()),
        }
    }
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the exports of `uri`, keeping its references.
    pub fn set_exports(&self, uri: &DocumentUri, exports: Vec<AstNodeDescription>) {
        self.update(uri, |entry| entry.exports = exports);
    }

    /// Replace the reference edges of `uri`, keeping its exports.
    pub fn set_references(&self, uri: &DocumentUri, references: Vec<ReferenceDescription>) {
        self.update(uri, |entry| entry.references = references);
    }

    fn update(&self, uri: &DocumentUri, apply: impl FnOnce(&mut IndexEntry)) {
        let mut entries = self.entries.write();
        let mut entry = entries
            .get(uri)
            .map(|entry| IndexEntry::clone(entry))
            .unwrap_or_default();
        apply(&mut entry);
        entries.insert(uri.clone(), Arc::new(entry));
    }

    /// Drop everything `uri` contributed. Returns whether it had an entry.
    pub fn remove(&self, uri: &DocumentUri) -> bool {
        self.entries.write().remove(uri).is_some()
    }

    /// Swap in the entries of `other` wholesale.
    pub fn replace_with(&self, other: WorkspaceIndex) {
        *self.entries.write() = other.entries.into_inner();
    }

    pub fn entry(&self, uri: &DocumentUri) -> Option<Arc<IndexEntry>> {
        self.entries.read().get(uri).cloned()
    }

    pub fn contains(&self, uri: &DocumentUri) -> bool {
        self.entries.read().contains_key(uri)
    }

    /// Indexed documents, sorted.
    pub fn uris(&self) -> Vec<DocumentUri> {
        let mut uris: Vec<_> = self.entries.read().keys().cloned().collect();
        uris.sort();
        uris
    }

    /// Every exported description, grouped by document in URI order.
    pub fn all_exports(&self) -> Vec<AstNodeDescription> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(uri, entry)| (uri.clone(), Arc::clone(entry)))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
            .into_iter()
            .flat_map(|(_, entry)| entry.exports.clone())
            .collect()
    }

    /// Every reference edge into the node at `target_path` of `target_uri`.
    pub fn find_references(
        &self,
        target_uri: &DocumentUri,
        target_path: &str,
    ) -> Vec<ReferenceDescription> {
        let entries = self.entries.read();
        let mut found: Vec<_> = entries
            .values()
            .flat_map(|entry| entry.references.iter())
            .filter(|reference| {
                reference.target_uri == *target_uri && reference.target_path == target_path
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (&a.source_uri, a.segment.start()).cmp(&(&b.source_uri, b.segment.start()))
        });
        found
    }

    /// Documents holding at least one edge into `uri`, other than `uri` itself.
    pub fn documents_referencing(&self, uri: &DocumentUri) -> FxHashSet<DocumentUri> {
        self.entries
            .read()
            .iter()
            .filter(|(source, entry)| {
                *source != uri && entry.references.iter().any(|r| r.target_uri == *uri)
            })
            .map(|(source, _)| source.clone())
            .collect()
    }
}
