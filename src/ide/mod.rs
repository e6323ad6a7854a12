//! IDE features: High-level APIs over a built [`Workspace`](crate::hir::Workspace).
//!
//! Each function corresponds to one editor request. Positions are byte
//! offsets into the document text; convert editor line/column positions with
//! the document's [`LineIndex`](crate::base::LineIndex).
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take a workspace snapshot in, return data out
//! 2. **No protocol types**: Results are our own types, converted at the
//!    protocol boundary
//! 3. **Composable**: Built on the workspace index and document links
//!
//! ## Usage
//!
//! ```ignore
//! use grammarkit::ide;
//!
//! workspace.build(&CancellationToken::new())?;
//! let edit = ide::rename(&workspace, &uri, offset, "NewName")?;
//! let text = ide::apply_edits(doc.text(), edit.edits_for(&uri))?;
//! ```

mod edits;
mod goto;
mod highlight;
mod references;
mod rename;
mod target;

pub use edits::{EditError, TextEdit, WorkspaceEdit, apply_edits};
pub use goto::{GotoResult, GotoTarget, goto_declaration};
pub use highlight::{DocumentHighlight, HighlightKind, highlight};
pub use references::{ReferenceLocation, ReferenceResult, find_references};
pub use rename::{RenameError, is_valid_identifier, rename};
