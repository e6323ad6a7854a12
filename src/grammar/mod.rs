//! Grammar model.
//!
//! A [`Grammar`] is a static rule tree: parser rules built from keywords,
//! assignments, groups, alternatives, unordered groups, rule calls,
//! cross-references and actions, plus regex-backed terminal rules.
//! Grammars are built in code through [`builder`] or loaded from their
//! serialized JSON form (feature `json`).

pub mod builder;
#[cfg(feature = "json")]
mod json;
mod reflection;
mod types;
mod util;

#[cfg(feature = "json")]
pub use json::GrammarLoadError;
pub use reflection::AstReflection;
pub use types::*;
pub use util::{collect_keywords, walk_elements};
