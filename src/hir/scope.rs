//! Scoping: which names are visible where.
//!
//! ## Two halves
//!
//! - [`ScopeComputation`] runs once per document and build. It decides what
//!   the document exports to the workspace and what each container sees
//!   locally ([`PrecomputedScopes`]).
//! - [`ScopeProvider`] answers "what may this reference bind to?" by walking
//!   the precomputed scopes from the reference's container outward and then
//!   falling back to the workspace exports.
//!
//! The visibility policy lives entirely in the `ScopeComputation`; swapping
//! it changes what resolves without touching the linker.

use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::base::{DocumentUri, OperationCancelled, check_cancelled};
use crate::grammar::AstReflection;
use crate::syntax::{AstTree, NameProvider, Reference, qualified_name};

use super::descriptions::{AstNodeDescription, describe_named_nodes};
use super::document::PrecomputedScopes;

pub trait ScopeComputation: Send + Sync {
    /// Descriptions other documents may bind to.
    fn compute_exports(
        &self,
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        cancel: &CancellationToken,
    ) -> Result<Vec<AstNodeDescription>, OperationCancelled>;

    /// Names visible inside each container of the document.
    fn compute_local_scopes(
        &self,
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        cancel: &CancellationToken,
    ) -> Result<PrecomputedScopes, OperationCancelled>;
}

/// Every named node is exported under its simple name and visible in its
/// container.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScopeComputation;

impl ScopeComputation for DefaultScopeComputation {
    fn compute_exports(
        &self,
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        cancel: &CancellationToken,
    ) -> Result<Vec<AstNodeDescription>, OperationCancelled> {
        describe_named_nodes(names, uri, tree, cancel)
    }

    fn compute_local_scopes(
        &self,
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        cancel: &CancellationToken,
    ) -> Result<PrecomputedScopes, OperationCancelled> {
        let mut scopes = PrecomputedScopes::default();
        for node in tree.descendants(tree.root()) {
            check_cancelled(cancel)?;
            let (Some(name), Some(link)) = (names.name(tree, node), &tree.node(node).container)
            else {
                continue;
            };
            scopes
                .entry(link.node)
                .or_default()
                .push(AstNodeDescription::new(names, uri, tree, node, name));
        }
        Ok(scopes)
    }
}

/// Nested containers qualify their members: a document exports `P.Q.E`
/// for an `E` inside packages `P` and `Q`, and inside `P` the same node is
/// also visible as `Q.E`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifiedScopeComputation;

impl ScopeComputation for QualifiedScopeComputation {
    fn compute_exports(
        &self,
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        cancel: &CancellationToken,
    ) -> Result<Vec<AstNodeDescription>, OperationCancelled> {
        let mut exports = Vec::new();
        for node in tree.descendants(tree.root()) {
            check_cancelled(cancel)?;
            if let Some(name) = qualified_name(names, tree, node) {
                exports.push(AstNodeDescription::new(names, uri, tree, node, name));
            }
        }
        Ok(exports)
    }

    fn compute_local_scopes(
        &self,
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        cancel: &CancellationToken,
    ) -> Result<PrecomputedScopes, OperationCancelled> {
        let mut scopes = PrecomputedScopes::default();
        // Children before containers, so a container can lift its named
        // children's scopes.
        let mut order = tree.descendants(tree.root());
        order.reverse();
        for container in order {
            check_cancelled(cancel)?;
            let mut local = Vec::new();
            for child in tree.children(container) {
                let Some(name) = names.name(tree, child) else {
                    continue;
                };
                local.push(AstNodeDescription::new(names, uri, tree, child, name.clone()));
                if let Some(nested) = scopes.get(&child) {
                    local.extend(nested.iter().map(|description| {
                        description.renamed(SmolStr::new(format!("{name}.{}", description.name)))
                    }));
                }
            }
            if !local.is_empty() {
                scopes.insert(container, local);
            }
        }
        Ok(scopes)
    }
}

/// Candidate lookup for one document.
pub struct ScopeProvider<'a> {
    reflection: &'a AstReflection,
    tree: &'a AstTree,
    scopes: &'a PrecomputedScopes,
    global: &'a [AstNodeDescription],
}

impl<'a> ScopeProvider<'a> {
    /// `global` is the workspace export list, already in a stable order.
    pub fn new(
        reflection: &'a AstReflection,
        tree: &'a AstTree,
        scopes: &'a PrecomputedScopes,
        global: &'a [AstNodeDescription],
    ) -> Self {
        Self {
            reflection,
            tree,
            scopes,
            global,
        }
    }

    /// Everything `reference` may bind to, nearest first.
    pub fn candidates(
        &self,
        reference: &'a Reference,
    ) -> impl Iterator<Item = &'a AstNodeDescription> + 'a {
        let reflection = self.reflection;
        let scopes = self.scopes;
        let container = reference.container.node;
        std::iter::once(container)
            .chain(self.tree.ancestors(container))
            .filter_map(move |node| scopes.get(&node))
            .flatten()
            .chain(self.global.iter())
            .filter(move |description| {
                reflection.is_subtype(&description.node_type, &reference.target_type)
            })
    }

    /// The first candidate named like the reference text.
    pub fn resolve(&self, reference: &'a Reference) -> Option<&'a AstNodeDescription> {
        self.candidates(reference)
            .find(|description| description.name == reference.ref_text)
    }
}
