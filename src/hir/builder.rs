//! Workspace: owns the documents and drives builds.
//!
//! Edits are recorded with [`Workspace::set_document`] and
//! [`Workspace::remove_document`]; nothing is parsed or linked until
//! [`Workspace::build`] runs. A build works on copies of the affected
//! documents and a staged copy of the index, and commits both only when every
//! phase finished. A cancelled build therefore leaves the workspace exactly as
//! it was, pending edits included, and the next build picks them up.
//!
//! ## Phases
//!
//! ```text
//! parse           changed documents (parallel)
//!     │
//!     ▼
//! index           exports + local scopes (parallel, all before any linking)
//!     │
//!     ▼
//! link            affected documents against the staged exports (parallel)
//!     │
//!     ▼
//! index refs      reference edges into the staged index
//!     │
//!     ▼
//! validate        diagnostics
//! ```
//!
//! Affected documents are the changed ones, the ones holding references into
//! a changed or removed document, and the ones with linking errors. The last
//! two kinds are relinked but never reparsed.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::base::{DocumentUri, OperationCancelled, check_cancelled};
use crate::parser::{CompiledGrammar, ParserConfig};
use crate::syntax::{DefaultNameProvider, NameProvider, node_at_path};

use super::descriptions::ReferenceDescription;
use super::document::{Document, DocumentState};
use super::index::WorkspaceIndex;
use super::linker::Linker;
use super::scope::{DefaultScopeComputation, ScopeComputation};
use super::validation::{Diagnostic, DocumentValidator, ValidationRegistry};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Run the per-document work of each phase on the rayon pool.
    pub parallel: bool,
    pub parser: ParserConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parser: ParserConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

/// What a build touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Documents that were (re)parsed and (re)indexed.
    pub indexed: Vec<DocumentUri>,
    /// Unchanged documents that were relinked.
    pub relinked: Vec<DocumentUri>,
    pub removed: Vec<DocumentUri>,
}

impl BuildReport {
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.relinked.is_empty() && self.removed.is_empty()
    }
}

// ============================================================================
// WORKSPACE
// ============================================================================

pub struct Workspace {
    grammar: Arc<CompiledGrammar>,
    config: WorkspaceConfig,
    documents: IndexMap<DocumentUri, Document>,
    index: WorkspaceIndex,
    names: Arc<dyn NameProvider>,
    scope_computation: Arc<dyn ScopeComputation>,
    validations: ValidationRegistry,
    /// Edits since the last successful build.
    pending: IndexMap<DocumentUri, Arc<str>>,
    removed: IndexSet<DocumentUri>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("grammar", &self.grammar.name)
            .field("documents", &self.documents.len())
            .field("pending", &self.pending.len())
            .field("removed", &self.removed.len())
            .finish()
    }
}

impl Workspace {
    pub fn new(grammar: Arc<CompiledGrammar>) -> Self {
        Self {
            grammar,
            config: WorkspaceConfig::default(),
            documents: IndexMap::new(),
            index: WorkspaceIndex::new(),
            names: Arc::new(DefaultNameProvider),
            scope_computation: Arc::new(DefaultScopeComputation),
            validations: ValidationRegistry::new(),
            pending: IndexMap::new(),
            removed: IndexSet::new(),
        }
    }

    pub fn with_config(mut self, config: WorkspaceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_name_provider(mut self, names: impl NameProvider + 'static) -> Self {
        self.names = Arc::new(names);
        self
    }

    pub fn with_scope_computation(mut self, scopes: impl ScopeComputation + 'static) -> Self {
        self.scope_computation = Arc::new(scopes);
        self
    }

    pub fn with_validations(mut self, validations: ValidationRegistry) -> Self {
        self.validations = validations;
        self
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn names(&self) -> &dyn NameProvider {
        self.names.as_ref()
    }

    pub fn index(&self) -> &WorkspaceIndex {
        &self.index
    }

    pub fn validations_mut(&mut self) -> &mut ValidationRegistry {
        &mut self.validations
    }

    // ------------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------------

    /// Add or replace a document. Takes effect on the next build.
    pub fn set_document(&mut self, uri: impl Into<DocumentUri>, text: impl Into<Arc<str>>) {
        let uri = uri.into();
        self.removed.shift_remove(&uri);
        self.pending.insert(uri, text.into());
    }

    /// Remove a document. Returns whether it was known. Takes effect on the
    /// next build.
    pub fn remove_document(&mut self, uri: &DocumentUri) -> bool {
        let pending = self.pending.shift_remove(uri).is_some();
        if self.documents.contains_key(uri) {
            self.removed.insert(uri.clone());
            return true;
        }
        pending
    }

    /// Whether edits are waiting for a build.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty() || !self.removed.is_empty()
    }

    /// Apply a batch of edits and build.
    pub fn update<C, R>(
        &mut self,
        changed: C,
        removed: R,
        cancel: &CancellationToken,
    ) -> Result<BuildReport, OperationCancelled>
    where
        C: IntoIterator<Item = (DocumentUri, String)>,
        R: IntoIterator<Item = DocumentUri>,
    {
        for uri in removed {
            self.remove_document(&uri);
        }
        for (uri, text) in changed {
            self.set_document(uri, text);
        }
        self.build(cancel)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// A built document.
    pub fn document(&self, uri: &DocumentUri) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn diagnostics(&self, uri: &DocumentUri) -> &[Diagnostic] {
        self.documents
            .get(uri)
            .map(Document::diagnostics)
            .unwrap_or_default()
    }

    /// Every reference edge into the node at `target_path` of `target_uri`.
    ///
    /// With `include_declaration`, the declaration itself comes first as a
    /// local edge covering the node's name.
    pub fn find_references(
        &self,
        target_uri: &DocumentUri,
        target_path: &str,
        include_declaration: bool,
    ) -> Vec<ReferenceDescription> {
        let mut found = Vec::new();
        if include_declaration {
            if let Some(declaration) = self.declaration(target_uri, target_path) {
                found.push(declaration);
            }
        }
        found.extend(self.index.find_references(target_uri, target_path));
        found
    }

    fn declaration(&self, uri: &DocumentUri, path: &str) -> Option<ReferenceDescription> {
        let document = self.documents.get(uri)?;
        let tree = document.ast();
        let node = node_at_path(tree, path)?;
        let segment = self.names.name_range(tree, node)?;
        Some(ReferenceDescription {
            source_uri: uri.clone(),
            source_path: path.to_string(),
            target_uri: uri.clone(),
            target_path: path.to_string(),
            segment,
            local: true,
        })
    }

    // ------------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------------

    /// Bring every document up to [`DocumentState::Validated`].
    pub fn build(&mut self, cancel: &CancellationToken) -> Result<BuildReport, OperationCancelled> {
        check_cancelled(cancel)?;
        let pending: Vec<(DocumentUri, Arc<str>)> = self
            .pending
            .iter()
            .map(|(uri, text)| (uri.clone(), Arc::clone(text)))
            .collect();
        let removed: Vec<DocumentUri> = self
            .removed
            .iter()
            .filter(|uri| !self.pending.contains_key(*uri))
            .cloned()
            .collect();

        // Parse
        let grammar = self.grammar.as_ref();
        let parser_config = &self.config.parser;
        let parse = |(uri, text): &(DocumentUri, Arc<str>)| {
            Document::parse(uri.clone(), Arc::clone(text), grammar, parser_config)
        };
        let parsed: Vec<Document> = if self.config.parallel {
            pending.par_iter().map(parse).collect()
        } else {
            pending.iter().map(parse).collect()
        };
        check_cancelled(cancel)?;
        tracing::debug!(documents = parsed.len(), "parse phase done");

        // Work set
        let staged = self.index.clone();
        let mut dependents = IndexSet::new();
        for uri in pending.iter().map(|(uri, _)| uri).chain(&removed) {
            dependents.extend(self.index.documents_referencing(uri));
            staged.remove(uri);
        }
        for (uri, document) in &self.documents {
            if document.has_linking_errors() || document.state() < DocumentState::Validated {
                dependents.insert(uri.clone());
            }
        }
        let changed: IndexSet<DocumentUri> =
            pending.iter().map(|(uri, _)| uri.clone()).collect();
        let relinked: Vec<DocumentUri> = dependents
            .into_iter()
            .filter(|uri| {
                !changed.contains(uri)
                    && !removed.contains(uri)
                    && self.documents.contains_key(uri)
            })
            .collect();

        let linker = Linker::new(self.grammar.reflection());
        let mut work = parsed;
        for uri in &relinked {
            if let Some(document) = self.documents.get(uri) {
                let mut document = document.clone();
                linker.unlink(&mut document);
                work.push(document);
            }
        }

        // Index
        let names = self.names.as_ref();
        let scopes = self.scope_computation.as_ref();
        self.run_phase(&mut work, |document| {
            if document.state() >= DocumentState::Indexed {
                return Ok(());
            }
            let tree = document.ast();
            let exports = scopes.compute_exports(names, document.uri(), tree, cancel)?;
            let local = scopes.compute_local_scopes(names, document.uri(), tree, cancel)?;
            staged.set_exports(document.uri(), exports);
            document.scopes = local;
            document.state = DocumentState::Indexed;
            Ok(())
        })?;
        tracing::debug!(documents = work.len(), "index phase done");

        // Link
        let global = staged.all_exports();
        self.run_phase(&mut work, |document| linker.link(document, &global, cancel))?;
        tracing::debug!(exports = global.len(), "link phase done");

        // Reference edges
        self.run_phase(&mut work, |document| {
            let edges = linker.index_references(document, cancel)?;
            staged.set_references(document.uri(), edges);
            document.state = DocumentState::ReferencesIndexed;
            Ok(())
        })?;

        // Validate
        let validator = DocumentValidator::new(self.grammar.reflection(), &self.validations);
        self.run_phase(&mut work, |document| {
            document.diagnostics = validator.validate(document, cancel)?;
            document.state = DocumentState::Validated;
            Ok(())
        })?;
        tracing::debug!(documents = work.len(), "validation phase done");

        // Commit
        self.index.replace_with(staged);
        for uri in &removed {
            self.documents.shift_remove(uri);
        }
        for document in work {
            self.documents.insert(document.uri().clone(), document);
        }
        self.pending.clear();
        self.removed.clear();

        let report = BuildReport {
            indexed: changed.into_iter().collect(),
            relinked,
            removed,
        };
        tracing::debug!(
            indexed = report.indexed.len(),
            relinked = report.relinked.len(),
            removed = report.removed.len(),
            "build committed"
        );
        Ok(report)
    }

    fn run_phase<F>(&self, work: &mut [Document], phase: F) -> Result<(), OperationCancelled>
    where
        F: Fn(&mut Document) -> Result<(), OperationCancelled> + Send + Sync,
    {
        if self.config.parallel {
            work.par_iter_mut().try_for_each(phase)
        } else {
            work.iter_mut().try_for_each(phase)
        }
    }
}
