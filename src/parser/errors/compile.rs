//! Fatal grammar compilation errors.
//!
//! Every variant that concerns a grammar element names it by its element
//! path: the rule name, the child indices through enclosing groups and the
//! element kind, e.g. `Entity:2:0:Assignment`.

use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarCompileError {
    #[error("grammar `{grammar}` has no parser rule to start from")]
    NoEntryRule { grammar: SmolStr },

    #[error("{path}: reference to undefined rule `{rule}`")]
    UnknownRule { path: String, rule: SmolStr },

    #[error("{path}: no token registered for `{token}`")]
    MissingToken { path: String, token: SmolStr },

    #[error("{path}: cross-reference to unknown type `{type_name}`")]
    UnresolvedType { path: String, type_name: SmolStr },

    #[error("{path}: could not find a name assignment for type `{type_name}`")]
    MissingNameAssignment { path: String, type_name: SmolStr },

    #[error("{path}: cross-reference terminal must be a keyword or rule call")]
    UnsupportedCrossReferenceTerminal { path: String },

    #[error("{path}: guard refers to unknown parameter `{parameter}`")]
    UnknownParameter { path: String, parameter: SmolStr },

    #[error("{path}: rule `{rule}` takes {expected} argument(s), {found} given")]
    TooManyArguments {
        path: String,
        rule: SmolStr,
        expected: usize,
        found: usize,
    },

    #[error("terminal `{token}` has an invalid pattern: {message}")]
    InvalidTokenPattern { token: SmolStr, message: String },
}

impl GrammarCompileError {
    /// Element path of the offending grammar node, if the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownRule { path, .. }
            | Self::MissingToken { path, .. }
            | Self::UnresolvedType { path, .. }
            | Self::MissingNameAssignment { path, .. }
            | Self::UnsupportedCrossReferenceTerminal { path }
            | Self::UnknownParameter { path, .. }
            | Self::TooManyArguments { path, .. } => Some(path),
            Self::NoEntryRule { .. } | Self::InvalidTokenPattern { .. } => None,
        }
    }
}
