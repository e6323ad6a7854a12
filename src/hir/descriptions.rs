//! Descriptions: the serializable face of AST nodes and references.
//!
//! Descriptions identify nodes by document URI and structural path instead
//! of by `NodeId`, so they stay meaningful outside the document that owns the
//! tree and can be cached in the workspace index.

use smol_str::SmolStr;
use text_size::TextRange;
use tokio_util::sync::CancellationToken;

use crate::base::{DocumentUri, OperationCancelled, check_cancelled};
use crate::syntax::{AstTree, NameProvider, NodeId, node_path};

/// A named node as seen from outside its document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AstNodeDescription {
    /// Name the node is visible under (simple or qualified).
    pub name: SmolStr,
    pub node_type: SmolStr,
    pub document_uri: DocumentUri,
    pub path: String,
    pub name_range: Option<TextRange>,
}

impl AstNodeDescription {
    pub fn new(
        names: &dyn NameProvider,
        uri: &DocumentUri,
        tree: &AstTree,
        node: NodeId,
        name: SmolStr,
    ) -> Self {
        Self {
            name,
            node_type: tree.node(node).type_name.clone(),
            document_uri: uri.clone(),
            path: node_path(tree, node),
            name_range: names.name_range(tree, node),
        }
    }

    /// Same node, visible under another name.
    pub fn renamed(&self, name: SmolStr) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }
}

/// A resolved reference edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceDescription {
    pub source_uri: DocumentUri,
    /// Path of the node holding the reference.
    pub source_path: String,
    pub target_uri: DocumentUri,
    pub target_path: String,
    /// Range of the reference text in the source document.
    pub segment: TextRange,
    /// Source and target live in the same document.
    pub local: bool,
}

/// Describe every named node of `tree`, root included, under its simple name.
pub fn describe_named_nodes(
    names: &dyn NameProvider,
    uri: &DocumentUri,
    tree: &AstTree,
    cancel: &CancellationToken,
) -> Result<Vec<AstNodeDescription>, OperationCancelled> {
    let mut descriptions = Vec::new();
    for node in tree.descendants(tree.root()) {
        check_cancelled(cancel)?;
        if let Some(name) = names.name(tree, node) {
            descriptions.push(AstNodeDescription::new(names, uri, tree, node, name));
        }
    }
    Ok(descriptions)
}
