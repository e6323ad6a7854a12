//! Grammar-driven parser.
//!
//! A [`Grammar`](crate::grammar::Grammar) is compiled once into a
//! [`CompiledGrammar`], which then parses any number of documents:
//!
//! ```text
//! Grammar
//!     ↓
//! TokenRegistry (keywords + terminal rules) → Lexer
//!     ↓
//! compile() → one Procedure per reachable parser rule
//!     ↓
//! engine → GreenNode (lossless CST) + AstTree + SyntaxErrors
//! ```
//!
//! The CST is a rowan tree whose kinds are computed from the grammar (see
//! [`cst`]); the AST is the arena tree of [`crate::syntax`].

mod compiler;
pub mod convert;
pub mod cst;
mod engine;
pub mod errors;
mod lexer;
pub mod procedure;
mod tokens;

pub use compiler::{CompiledGrammar, compile};
pub use convert::{DefaultValueConverter, ValueConverter};
pub use cst::{CstElement, CstKind, CstNode, CstToken, GrammarLanguage};
pub use engine::{ParseResult, ParserConfig};
pub use errors::{ErrorCode, GrammarCompileError, Severity, SyntaxError};
pub use lexer::{LexResult, Lexer, Token, tokenize};
pub use procedure::{Op, Procedure, RuleId, RuleKind};
pub use tokens::{TokenId, TokenKind, TokenRegistry, TokenType};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
