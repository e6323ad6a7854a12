//! High-level IR (HIR): documents, scoping, linking and the workspace index.
//!
//! Everything here works on parsed [`Document`]s. Nothing in this layer
//! re-reads source text: scopes, links and diagnostics are caches derived
//! from the AST and can be thrown away and rebuilt at any time.
//!
//! ## Key Types
//!
//! - [`Workspace`]: Owns documents, runs builds, commits atomically
//! - [`WorkspaceIndex`]: Exports and reference edges per document
//! - [`ScopeComputation`]: Visibility policy (what is exported, what is local)
//! - [`ScopeProvider`]: Candidate lookup for one reference
//! - [`Linker`]: Binds references, indexes reference edges
//! - [`DocumentValidator`]: Turns recorded problems into [`Diagnostic`]s
//!
//! ## Build Layers
//!
//! ```text
//! Document::parse(text)        ← per document, no workspace access
//!     │
//!     ▼
//! compute_exports / scopes     ← per document, published to the index
//!     │
//!     ▼
//! Linker::link                 ← reads the whole index
//!     │
//!     ▼
//! Linker::index_references     ← reverse edges for find-references
//!     │
//!     ▼
//! DocumentValidator::validate  ← diagnostics
//! ```

mod builder;
mod descriptions;
mod document;
mod index;
mod linker;
mod scope;
mod validation;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use builder::{BuildReport, Workspace, WorkspaceConfig};
pub use descriptions::{AstNodeDescription, ReferenceDescription, describe_named_nodes};
pub use document::{Document, DocumentState, LinkState, LinkingError, PrecomputedScopes};
pub use index::{IndexEntry, WorkspaceIndex};
pub use linker::Linker;
pub use scope::{
    DefaultScopeComputation, QualifiedScopeComputation, ScopeComputation, ScopeProvider,
};
pub use validation::{
    Diagnostic, DocumentValidator, ValidationAcceptor, ValidationCheck, ValidationRegistry, codes,
};
