//! Regex-driven lexer over a [`TokenRegistry`].
//!
//! At every position each token type is tried; the longest match wins and a
//! keyword beats a terminal of the same length (`entity` is a keyword even
//! though `ID` matches it too). Runs of input nothing matches become a
//! single [`TokenRegistry::ERROR`] token.

use text_size::{TextRange, TextSize};

use super::errors::{ErrorCode, SyntaxError};
use super::tokens::{TokenId, TokenRegistry};

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenId,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, TextSize::of(self.text))
    }
}

pub struct Lexer<'a> {
    registry: &'a TokenRegistry,
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(registry: &'a TokenRegistry, input: &'a str) -> Self {
        Self {
            registry,
            input,
            offset: 0,
        }
    }

    /// Best token type at `offset` and its length.
    fn longest_match(&self, offset: usize) -> Option<(TokenId, usize)> {
        let rest = &self.input[offset..];
        let mut best: Option<(TokenId, usize, bool)> = None;
        for ty in self.registry.iter() {
            let Some(len) = ty.match_len(rest) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_len, best_is_keyword)) => {
                    len > best_len || (len == best_len && ty.is_keyword() && !best_is_keyword)
                }
            };
            if better {
                best = Some((ty.id, len, ty.is_keyword()));
            }
        }
        best.map(|(id, len, _)| (id, len))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.input.len() {
            return None;
        }
        let start = self.offset;
        let (kind, end) = match self.longest_match(start) {
            Some((kind, len)) => (kind, start + len),
            None => {
                // Swallow characters until something matches again.
                let mut end = start;
                for (idx, ch) in self.input[start..].char_indices() {
                    if idx > 0 && self.longest_match(start + idx).is_some() {
                        break;
                    }
                    end = start + idx + ch.len_utf8();
                }
                (TokenRegistry::ERROR, end)
            }
        };
        self.offset = end;
        Some(Token {
            kind,
            text: &self.input[start..end],
            offset: TextSize::new(start as u32),
        })
    }
}

/// Output of [`tokenize`]: every token, hidden ones included, plus one error
/// per unrecognized run of input.
#[derive(Debug, Clone)]
pub struct LexResult<'a> {
    pub tokens: Vec<Token<'a>>,
    pub errors: Vec<SyntaxError>,
}

/// Tokenize an entire string.
pub fn tokenize<'a>(registry: &'a TokenRegistry, input: &'a str) -> LexResult<'a> {
    let tokens: Vec<_> = Lexer::new(registry, input).collect();
    let errors = tokens
        .iter()
        .filter(|token| token.kind == TokenRegistry::ERROR)
        .map(|token| {
            SyntaxError::new(
                format!("unexpected character sequence `{}`", token.text),
                token.range(),
                ErrorCode::E0101,
            )
        })
        .collect();
    LexResult { tokens, errors }
}
