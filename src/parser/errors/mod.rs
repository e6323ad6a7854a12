//! Parser error handling module
//!
//! - [`GrammarCompileError`]: fatal, no parser is produced
//! - [`SyntaxError`]: recoverable, accumulated next to the best-effort tree
//! - [`ErrorCode`]: categorized codes for filtering and IDE integration

mod codes;
mod compile;
mod error;

pub use codes::ErrorCode;
pub use compile::GrammarCompileError;
pub use error::{Severity, SyntaxError};
