//! Error code definitions for parser diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (input no terminal matches)
//! - E02xx: Syntax errors (token sequence rejected by the grammar)
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for parser diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors
    // =========================================================================
    /// Character not matched by any keyword or terminal
    E0101,

    // =========================================================================
    // E02xx: Syntax errors
    // =========================================================================
    /// Unexpected token, deleted during recovery
    E0201,
    /// Expected token missing, inserted during recovery
    E0202,
    /// No alternative matches the input
    E0203,
    /// Unexpected end of input
    E0204,
    /// Input left over after the entry rule
    E0205,
    /// Unordered group is missing a mandatory member
    E0206,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// Internal parser error
    E0999,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0204 => "E0204",
            Self::E0205 => "E0205",
            Self::E0206 => "E0206",
            Self::E0999 => "E0999",
        }
    }

    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 => "lexical error",
            Self::E0201 | Self::E0202 | Self::E0203 | Self::E0204 | Self::E0205 | Self::E0206 => {
                "syntax error"
            }
            Self::E0999 => "internal error",
        }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "unexpected character",
            Self::E0201 => "unexpected token",
            Self::E0202 => "missing token",
            Self::E0203 => "no viable alternative",
            Self::E0204 => "unexpected end of input",
            Self::E0205 => "unexpected input after end of document",
            Self::E0206 => "incomplete unordered group",
            Self::E0999 => "internal parser error",
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::E0101)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
