//! Linking: binding reference placeholders to node descriptions.

use tokio_util::sync::CancellationToken;

use crate::base::{OperationCancelled, check_cancelled};
use crate::grammar::AstReflection;
use crate::syntax::node_path;

use super::descriptions::{AstNodeDescription, ReferenceDescription};
use super::document::{Document, DocumentState, LinkState, LinkingError};
use super::scope::ScopeProvider;

#[derive(Clone, Copy)]
pub struct Linker<'a> {
    reflection: &'a AstReflection,
}

impl<'a> Linker<'a> {
    pub fn new(reflection: &'a AstReflection) -> Self {
        Self { reflection }
    }

    /// Resolve every unresolved reference of `document`.
    ///
    /// `global` is the workspace export list. A reference that finds no
    /// candidate gets a [`LinkingError`]; its siblings still resolve. On
    /// cancellation the document keeps its previous links.
    pub fn link(
        &self,
        document: &mut Document,
        global: &[AstNodeDescription],
        cancel: &CancellationToken,
    ) -> Result<(), OperationCancelled> {
        let tree = document.ast();
        let provider = ScopeProvider::new(self.reflection, tree, document.scopes(), global);
        let mut links = Vec::with_capacity(tree.reference_count());
        for (id, reference) in tree.references() {
            check_cancelled(cancel)?;
            let link = match document.link(id) {
                LinkState::Unresolved => match provider.resolve(reference) {
                    Some(target) => LinkState::Resolved(target.clone()),
                    None => {
                        tracing::trace!(
                            uri = %document.uri(),
                            ref_text = %reference.ref_text,
                            target_type = %reference.target_type,
                            "unresolved reference"
                        );
                        LinkState::Error(LinkingError {
                            ref_text: reference.ref_text.clone(),
                            target_type: reference.target_type.clone(),
                        })
                    }
                },
                done => done.clone(),
            };
            links.push(link);
        }
        document.links = links;
        document.state = document.state.max(DocumentState::Linked);
        Ok(())
    }

    /// Like [`link`](Self::link), but a document that is already linked is
    /// left alone.
    pub fn resolve(
        &self,
        document: &mut Document,
        global: &[AstNodeDescription],
        cancel: &CancellationToken,
    ) -> Result<(), OperationCancelled> {
        if document.state() >= DocumentState::Linked {
            return Ok(());
        }
        self.link(document, global, cancel)
    }

    /// Forget every resolution so the next [`link`](Self::link) starts over.
    pub fn unlink(&self, document: &mut Document) {
        document.links.fill(LinkState::Unresolved);
        document.diagnostics.clear();
        document.state = document.state.min(DocumentState::Indexed);
    }

    /// Reference edges for the resolved references of `document`.
    pub fn index_references(
        &self,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReferenceDescription>, OperationCancelled> {
        let tree = document.ast();
        let mut edges = Vec::new();
        for (id, reference) in tree.references() {
            check_cancelled(cancel)?;
            let Some(target) = document.link(id).target() else {
                continue;
            };
            edges.push(ReferenceDescription {
                source_uri: document.uri().clone(),
                source_path: node_path(tree, reference.container.node),
                target_uri: target.document_uri.clone(),
                target_path: target.path.clone(),
                segment: reference.range,
                local: target.document_uri == *document.uri(),
            });
        }
        Ok(edges)
    }
}
