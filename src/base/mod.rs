//! Foundation types for the grammarkit toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`DocumentUri`] - Cheap-to-clone document identifiers
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`OperationCancelled`] - Cooperative cancellation outcome
//!
//! This module has NO dependencies on other grammarkit modules.

mod cancel;
mod span;
mod uri;

pub use cancel::{OperationCancelled, check_cancelled};
pub use span::{LineCol, LineIndex, LineRange, TextRange, TextSize};
pub use uri::DocumentUri;

// Re-export for callers that drive cancellation
pub use tokio_util::sync::CancellationToken;

// Re-export text-size types for convenience
pub use text_size;
