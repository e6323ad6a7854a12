//! Document validation.
//!
//! Validation is the last build phase. It gathers the problems every earlier
//! phase recorded (lexer, parser, linker) and then runs the custom checks
//! registered for each AST type.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use text_size::TextRange;
use tokio_util::sync::CancellationToken;

use crate::base::{OperationCancelled, check_cancelled};
use crate::grammar::AstReflection;
use crate::parser::{Severity, SyntaxError};
use crate::syntax::NodeId;

use super::document::Document;

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// A problem found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Error code (e.g., "E0201").
    pub code: Option<SmolStr>,
    pub message: String,
    pub range: TextRange,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            range,
        }
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(Severity::Error, message, range)
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(Severity::Warning, message, range)
    }

    pub fn with_code(mut self, code: impl Into<SmolStr>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(error: &SyntaxError) -> Self {
        Diagnostic::new(error.severity, error.message.clone(), error.range)
            .with_code(error.code.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity.as_str(), code, self.message),
            None => write!(f, "{}: {}", self.severity.as_str(), self.message),
        }
    }
}

/// Diagnostic codes produced outside the parser.
pub mod codes {
    /// A cross-reference did not resolve.
    pub const UNRESOLVED_REFERENCE: &str = "E0301";
}

// ============================================================================
// CUSTOM CHECKS
// ============================================================================

/// Collects what a check reports.
#[derive(Debug)]
pub struct ValidationAcceptor<'a> {
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> ValidationAcceptor<'a> {
    pub fn new(diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn accept(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.accept(Diagnostic::error(message, range));
    }

    pub fn warning(&mut self, message: impl Into<String>, range: TextRange) {
        self.accept(Diagnostic::warning(message, range));
    }
}

/// A check run on every node of a registered type.
pub type ValidationCheck =
    Arc<dyn Fn(&Document, NodeId, &mut ValidationAcceptor<'_>) + Send + Sync>;

/// Custom checks by AST type.
///
/// A check registered for a type also runs on all of its subtypes. Checks run
/// in registration order.
#[derive(Clone, Default)]
pub struct ValidationRegistry {
    checks: IndexMap<SmolStr, Vec<ValidationCheck>>,
}

impl fmt::Debug for ValidationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.checks.iter().map(|(ty, checks)| (ty, checks.len())))
            .finish()
    }
}

impl ValidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: impl Into<SmolStr>, check: F)
    where
        F: Fn(&Document, NodeId, &mut ValidationAcceptor<'_>) + Send + Sync + 'static,
    {
        self.checks
            .entry(type_name.into())
            .or_default()
            .push(Arc::new(check));
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks that apply to nodes of `node_type`.
    pub fn checks_for<'a>(
        &'a self,
        reflection: &'a AstReflection,
        node_type: &'a str,
    ) -> impl Iterator<Item = &'a ValidationCheck> + 'a {
        self.checks
            .iter()
            .filter(move |(ty, _)| reflection.is_subtype(node_type, ty))
            .flat_map(|(_, checks)| checks.iter())
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

pub struct DocumentValidator<'a> {
    reflection: &'a AstReflection,
    registry: &'a ValidationRegistry,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(reflection: &'a AstReflection, registry: &'a ValidationRegistry) -> Self {
        Self {
            reflection,
            registry,
        }
    }

    /// All diagnostics of `document`: lexer and parser errors first, then
    /// linking errors, then custom checks in tree order.
    pub fn validate(
        &self,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, OperationCancelled> {
        let parse = document.parse_result();
        let mut diagnostics: Vec<Diagnostic> = parse
            .lexer_errors
            .iter()
            .chain(&parse.parser_errors)
            .map(Diagnostic::from)
            .collect();

        let tree = document.ast();
        for (id, link) in document.links() {
            if let Some(error) = link.error() {
                diagnostics.push(
                    Diagnostic::error(error.to_string(), tree.reference(id).range)
                        .with_code(codes::UNRESOLVED_REFERENCE),
                );
            }
        }

        if !self.registry.is_empty() {
            let mut acceptor = ValidationAcceptor::new(&mut diagnostics);
            for node in tree.descendants(tree.root()) {
                check_cancelled(cancel)?;
                let node_type = &tree.node(node).type_name;
                for check in self.registry.checks_for(self.reflection, node_type) {
                    check(document, node, &mut acceptor);
                }
            }
        }

        tracing::trace!(
            uri = %document.uri(),
            diagnostics = diagnostics.len(),
            "validated document"
        );
        Ok(diagnostics)
    }
}
