//! Concrete syntax tree.
//!
//! The CST is a rowan green tree with kinds computed from the grammar:
//!
//! ```text
//! 0            ROOT
//! 1            ERROR (deleted or left-over tokens)
//! 2..          one kind per token type
//! 0x4000..     one kind per compiled parser rule
//! ```
//!
//! Every input byte ends up in exactly one token, so the root text always
//! equals the source text.

use rowan::{GreenNode, GreenNodeBuilder};

use super::lexer::Token;
use super::procedure::RuleId;
use super::tokens::TokenId;

const TOKEN_BASE: u16 = 2;
const RULE_BASE: u16 = 0x4000;

/// Dynamic syntax kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CstKind(pub u16);

impl CstKind {
    pub const ROOT: CstKind = CstKind(0);
    pub const ERROR: CstKind = CstKind(1);

    pub fn token(id: TokenId) -> Self {
        CstKind(TOKEN_BASE + id.0)
    }

    pub fn rule(id: RuleId) -> Self {
        CstKind(RULE_BASE + id.0 as u16)
    }

    pub fn as_token(self) -> Option<TokenId> {
        (TOKEN_BASE..RULE_BASE)
            .contains(&self.0)
            .then(|| TokenId(self.0 - TOKEN_BASE))
    }

    pub fn as_rule(self) -> Option<RuleId> {
        (self.0 >= RULE_BASE).then(|| RuleId((self.0 - RULE_BASE) as u32))
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GrammarLanguage {}

impl rowan::Language for GrammarLanguage {
    type Kind = CstKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        CstKind(raw.0)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind.0)
    }
}

pub type CstNode = rowan::SyntaxNode<GrammarLanguage>;
pub type CstToken = rowan::SyntaxToken<GrammarLanguage>;
pub type CstElement = rowan::SyntaxElement<GrammarLanguage>;

/// Emits tokens into a green tree, keeping hidden tokens in place.
///
/// `cursor` is the index of the next raw token not yet in the tree.
pub(crate) struct CstSink<'t> {
    builder: GreenNodeBuilder<'static>,
    tokens: &'t [Token<'t>],
    cursor: usize,
}

impl<'t> CstSink<'t> {
    pub(crate) fn new(tokens: &'t [Token<'t>]) -> Self {
        let mut builder = GreenNodeBuilder::new();
        builder.start_node(raw(CstKind::ROOT));
        Self {
            builder,
            tokens,
            cursor: 0,
        }
    }

    /// Open a rule node. Hidden tokens before `next_raw` stay outside it.
    pub(crate) fn start_node(&mut self, kind: CstKind, next_raw: usize) {
        self.flush_until(next_raw);
        self.builder.start_node(raw(kind));
    }

    pub(crate) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    /// Emit the raw token at `index`, preceded by any pending hidden tokens.
    pub(crate) fn token(&mut self, index: usize) {
        self.flush_until(index);
        self.emit(index);
    }

    /// Emit the raw token at `index` wrapped in an ERROR node.
    pub(crate) fn error_token(&mut self, index: usize) {
        self.flush_until(index);
        self.builder.start_node(raw(CstKind::ERROR));
        self.emit(index);
        self.builder.finish_node();
    }

    fn flush_until(&mut self, index: usize) {
        while self.cursor < index.min(self.tokens.len()) {
            let cursor = self.cursor;
            self.emit(cursor);
        }
    }

    fn emit(&mut self, index: usize) {
        if let Some(token) = self.tokens.get(index) {
            self.builder
                .token(raw(CstKind::token(token.kind)), token.text);
            self.cursor = index + 1;
        }
    }

    /// Put every remaining token into the tree and close the root.
    ///
    /// `trailing_from` is the first raw index of input the parser did not
    /// accept; it and everything after it goes into an ERROR node.
    pub(crate) fn finish(mut self, trailing_from: Option<usize>) -> GreenNode {
        if let Some(start) = trailing_from {
            self.flush_until(start);
            if self.cursor < self.tokens.len() {
                self.builder.start_node(raw(CstKind::ERROR));
                self.flush_until(self.tokens.len());
                self.builder.finish_node();
            }
        }
        self.flush_until(self.tokens.len());
        self.builder.finish_node();
        self.builder.finish()
    }
}

fn raw(kind: CstKind) -> rowan::SyntaxKind {
    rowan::SyntaxKind(kind.0)
}
