//! IDE layer tests
//!
//! Tests for:
//! - Find references and goto declaration
//! - Document highlights
//! - Rename and applying workspace edits

pub mod tests_navigation;
pub mod tests_rename;
