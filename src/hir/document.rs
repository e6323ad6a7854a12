//! Workspace documents and their lifecycle.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{DocumentUri, LineIndex};
use crate::parser::{CompiledGrammar, ParseResult, ParserConfig};
use crate::syntax::{AstTree, NodeId, ReferenceId};

use super::descriptions::AstNodeDescription;
use super::validation::Diagnostic;

/// Build progress of a document. Every phase of a build moves the document
/// one step further; an edit starts it over at `Parsed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentState {
    Parsed,
    /// Exports are in the workspace index and local scopes are computed.
    Indexed,
    Linked,
    ReferencesIndexed,
    Validated,
}

/// A reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not resolve reference to {target_type} named '{ref_text}'")]
pub struct LinkingError {
    pub ref_text: SmolStr,
    pub target_type: SmolStr,
}

/// Resolution state of one reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Unresolved,
    Resolved(AstNodeDescription),
    Error(LinkingError),
}

impl LinkState {
    pub fn target(&self) -> Option<&AstNodeDescription> {
        match self {
            LinkState::Resolved(target) => Some(target),
            LinkState::Unresolved | LinkState::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&LinkingError> {
        match self {
            LinkState::Error(error) => Some(error),
            LinkState::Unresolved | LinkState::Resolved(_) => None,
        }
    }
}

/// Names visible inside each container, nearest declarations first.
pub type PrecomputedScopes = FxHashMap<NodeId, Vec<AstNodeDescription>>;

/// A parsed document plus everything derived from it.
///
/// The parse result is never mutated after construction. Scopes, links and
/// diagnostics are derived caches that a build may throw away and recompute.
#[derive(Debug, Clone)]
pub struct Document {
    uri: DocumentUri,
    text: Arc<str>,
    line_index: LineIndex,
    parse: ParseResult,
    pub(crate) scopes: PrecomputedScopes,
    /// One entry per reference of the AST, by `ReferenceId`.
    pub(crate) links: Vec<LinkState>,
    pub(crate) state: DocumentState,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn parse(
        uri: DocumentUri,
        text: impl Into<Arc<str>>,
        grammar: &CompiledGrammar,
        config: &ParserConfig,
    ) -> Self {
        let text = text.into();
        let parse = grammar.parse_with(&text, config);
        tracing::debug!(
            uri = %uri,
            references = parse.ast.reference_count(),
            errors = parse.lexer_errors.len() + parse.parser_errors.len(),
            "parsed document"
        );
        Self {
            line_index: LineIndex::new(&text),
            links: vec![LinkState::Unresolved; parse.ast.reference_count()],
            uri,
            text,
            parse,
            scopes: PrecomputedScopes::default(),
            state: DocumentState::Parsed,
            diagnostics: Vec::new(),
        }
    }

    pub fn uri(&self) -> &DocumentUri {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn parse_result(&self) -> &ParseResult {
        &self.parse
    }

    pub fn ast(&self) -> &AstTree {
        &self.parse.ast
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn scopes(&self) -> &PrecomputedScopes {
        &self.scopes
    }

    pub fn link(&self, reference: ReferenceId) -> &LinkState {
        static UNRESOLVED: LinkState = LinkState::Unresolved;
        self.links.get(reference.index()).unwrap_or(&UNRESOLVED)
    }

    pub fn links(&self) -> impl Iterator<Item = (ReferenceId, &LinkState)> {
        self.links
            .iter()
            .enumerate()
            .map(|(idx, link)| (ReferenceId(idx as u32), link))
    }

    pub fn has_linking_errors(&self) -> bool {
        self.links
            .iter()
            .any(|link| matches!(link, LinkState::Error(_)))
    }

    /// Whether any reference of this document resolved into `uri`.
    pub fn links_into(&self, uri: &DocumentUri) -> bool {
        self.links
            .iter()
            .filter_map(LinkState::target)
            .any(|target| target.document_uri == *uri)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
