//! Token registry: the token types of a grammar.
//!
//! Every keyword used in a parser rule and every non-fragment terminal rule
//! becomes a token type. Id `0` is reserved for unrecognized input.

use regex::Regex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::grammar::{Grammar, collect_keywords};

use super::errors::GrammarCompileError;

/// Index of a token type in its [`TokenRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u16);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Input no other token type matched.
    Error,
    /// A literal keyword such as `entity` or `{`.
    Keyword,
    /// A terminal rule.
    Terminal {
        hidden: bool,
        /// Declared value type (`number`, `boolean`, ...).
        returns: Option<SmolStr>,
    },
}

#[derive(Debug, Clone)]
pub struct TokenType {
    pub id: TokenId,
    /// Keyword text or terminal rule name.
    pub name: SmolStr,
    pub kind: TokenKind,
    /// Anchored pattern; `None` for the error type.
    pattern: Option<Regex>,
}

impl TokenType {
    /// Hidden tokens (whitespace, comments, errors) are skipped by the parser
    /// but kept in the CST.
    pub fn is_hidden(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Error | TokenKind::Terminal { hidden: true, .. }
        )
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword)
    }

    /// Length of the match at the start of `input`, if any.
    pub fn match_len(&self, input: &str) -> Option<usize> {
        let m = self.pattern.as_ref()?.find(input)?;
        (m.end() > 0).then_some(m.end())
    }

    /// Name as shown in diagnostics: keywords quoted, terminals bare.
    pub fn display_name(&self) -> String {
        match self.kind {
            TokenKind::Keyword => format!("'{}'", self.name),
            TokenKind::Terminal { .. } | TokenKind::Error => self.name.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    types: Vec<TokenType>,
    keywords: FxHashMap<SmolStr, TokenId>,
    terminals: FxHashMap<SmolStr, TokenId>,
}

impl TokenRegistry {
    pub const ERROR: TokenId = TokenId(0);

    /// Build the registry for `grammar`: keywords first, then terminal rules
    /// in declaration order.
    pub fn from_grammar(grammar: &Grammar) -> Result<Self, GrammarCompileError> {
        let mut registry = Self {
            types: vec![TokenType {
                id: Self::ERROR,
                name: SmolStr::new_static("ERROR_TOKEN"),
                kind: TokenKind::Error,
                pattern: None,
            }],
            keywords: FxHashMap::default(),
            terminals: FxHashMap::default(),
        };

        for keyword in collect_keywords(grammar) {
            let pattern = anchored(&keyword, &regex::escape(&keyword))?;
            let id = registry.push(keyword.clone(), TokenKind::Keyword, pattern);
            registry.keywords.insert(keyword, id);
        }

        for terminal in grammar.terminal_rules().filter(|t| !t.fragment) {
            let pattern = anchored(&terminal.name, &terminal.pattern)?;
            let kind = TokenKind::Terminal {
                hidden: terminal.hidden,
                returns: terminal.returns.clone(),
            };
            let id = registry.push(terminal.name.clone(), kind, pattern);
            registry.terminals.insert(terminal.name.clone(), id);
        }

        tracing::debug!(
            keywords = registry.keywords.len(),
            terminals = registry.terminals.len(),
            "built token registry"
        );
        Ok(registry)
    }

    fn push(&mut self, name: SmolStr, kind: TokenKind, pattern: Regex) -> TokenId {
        let id = TokenId(self.types.len() as u16);
        self.types.push(TokenType {
            id,
            name,
            kind,
            pattern: Some(pattern),
        });
        id
    }

    pub fn keyword(&self, value: &str) -> Option<TokenId> {
        self.keywords.get(value).copied()
    }

    pub fn terminal(&self, name: &str) -> Option<TokenId> {
        self.terminals.get(name).copied()
    }

    /// Look up a token type by id.
    ///
    /// Ids always come from this registry, so an unknown id falls back to the
    /// error type.
    pub fn get(&self, id: TokenId) -> &TokenType {
        self.types.get(id.index()).unwrap_or(&self.types[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }
}

fn anchored(name: &str, pattern: &str) -> Result<Regex, GrammarCompileError> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|err| GrammarCompileError::InvalidTokenPattern {
        token: SmolStr::new(name),
        message: err.to_string(),
    })
}
