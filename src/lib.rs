//! # grammarkit-base
//!
//! Grammar-to-parser compiler plus a cross-document linker and workspace
//! index for building language tooling from a declarative grammar.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → References, goto-declaration, highlight, rename
//!   ↓
//! hir       → Documents, scopes, linker, workspace index, validation
//!   ↓
//! syntax    → Arena AST, node paths, naming
//!   ↓
//! parser    → Token registry, lexer, rule compiler, parsing engine, CST
//!   ↓
//! grammar   → Grammar model, JSON loading, type reflection
//!   ↓
//! base      → Primitives (DocumentUri, TextRange, LineIndex, cancellation)
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → parser → syntax → hir → ide)
// ============================================================================

/// Foundation types: DocumentUri, TextRange, LineIndex, cancellation
pub mod base;

/// Grammar model: rules, elements, conditions, reflection
pub mod grammar;

/// Parser: tokenizer, rule compiler, parsing engine, lossless CST
pub mod parser;

/// Syntax: arena AST, node paths, naming
pub mod syntax;

/// High-level IR: documents, scoping, linking, workspace index
pub mod hir;

/// IDE features: find-references, goto-declaration, highlight, rename
pub mod ide;

// Re-export foundation types
pub use base::{
    CancellationToken, DocumentUri, LineCol, LineIndex, OperationCancelled, TextRange, TextSize,
};
pub use grammar::Grammar;
pub use hir::{Workspace, WorkspaceConfig};
pub use parser::{CompiledGrammar, ParseResult, ParserConfig, compile};
