//! Procedure interpreter.
//!
//! The engine walks the [`Op`] tree of the entry rule over the significant
//! (non-hidden) tokens of the input. It runs in one of two modes:
//!
//! - **Real**: tokens are emitted into the CST, AST nodes are built, and
//!   mismatches are repaired and reported.
//! - **Recording**: a side-effect-free lookahead pass. It only moves the
//!   token position and stops with [`Stop::Horizon`] once it has looked at
//!   `max_lookahead` tokens, which counts as "feasible".
//!
//! Every choice point (optional, loop, alternative, unordered member) asks a
//! recording pass whether its body can start at the current position before
//! committing to it in real mode.

use rowan::GreenNode;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::grammar::{AssignOp, Condition};
use crate::syntax::Value;
use crate::syntax::ast::{AstTree, AstTreeBuilder, NodeData, PendingReference};

use super::compiler::CompiledGrammar;
use super::convert::{DefaultValueConverter, ValueConverter};
use super::cst::{CstKind, CstNode, CstSink};
use super::errors::{ErrorCode, SyntaxError};
use super::lexer::{LexResult, Token, tokenize};
use super::procedure::*;
use super::tokens::{TokenId, TokenKind};

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Significant tokens a lookahead pass may inspect before it decides.
    pub max_lookahead: usize,
    /// Repair mismatched tokens by single-token deletion or insertion.
    pub recovery: bool,
    /// Rule nesting beyond this is reported as `E0999` and the rule is
    /// skipped. Every level costs several interpreter frames, so the default
    /// stays well inside a 2 MiB thread stack in debug builds.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_lookahead: 3,
            recovery: true,
            max_depth: 128,
        }
    }
}

impl ParserConfig {
    pub fn with_max_lookahead(mut self, max_lookahead: usize) -> Self {
        self.max_lookahead = max_lookahead.max(1);
        self
    }

    pub fn with_recovery(mut self, recovery: bool) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }
}

/// The result of parsing one document.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub green: GreenNode,
    pub ast: AstTree,
    pub lexer_errors: Vec<SyntaxError>,
    pub parser_errors: Vec<SyntaxError>,
}

impl ParseResult {
    /// Get the root syntax node
    pub fn syntax(&self) -> CstNode {
        CstNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.lexer_errors.is_empty() && self.parser_errors.is_empty()
    }

    /// Lexer errors followed by parser errors.
    pub fn errors(&self) -> impl Iterator<Item = &SyntaxError> {
        self.lexer_errors.iter().chain(&self.parser_errors)
    }
}

impl CompiledGrammar {
    pub fn parse(&self, text: &str) -> ParseResult {
        self.parse_with(text, &ParserConfig::default())
    }

    pub fn parse_with(&self, text: &str, config: &ParserConfig) -> ParseResult {
        self.parse_with_converter(text, config, &DefaultValueConverter)
    }

    /// Parse with a custom [`ValueConverter`] for terminal and datatype values.
    pub fn parse_with_converter(
        &self,
        text: &str,
        config: &ParserConfig,
        converter: &dyn ValueConverter,
    ) -> ParseResult {
        let LexResult {
            tokens,
            errors: lexer_errors,
        } = tokenize(self.tokens(), text);
        let (green, ast, parser_errors) = Engine::new(self, &tokens, text, config, converter).run();
        tracing::trace!(
            grammar = %self.name,
            tokens = tokens.len(),
            nodes = ast.descendants(ast.root()).len(),
            lexer_errors = lexer_errors.len(),
            parser_errors = parser_errors.len(),
            "parsed document"
        );
        ParseResult {
            green,
            ast,
            lexer_errors,
            parser_errors,
        }
    }
}

// ============================================================================
// ENGINE STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Lookahead: no output, stop at `horizon` (index into significant tokens).
    Recording { horizon: usize },
    Real,
}

/// Why a recording pass stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// The input cannot continue this way.
    Mismatch,
    /// The lookahead budget ran out before a mismatch.
    Horizon,
}

type Step = Result<(), Stop>;

/// What a lookahead pass found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookahead {
    Blocked,
    /// Matches without consuming anything.
    Empty,
    Advances,
}

/// What a rule invocation is building.
#[derive(Debug)]
enum Output {
    Node(NodeData),
    /// Datatype rule: concatenated significant token text.
    Text(String),
    /// Writes into the nearest enclosing builder.
    Fragment,
    /// Recording mode.
    Discard,
}

#[derive(Debug)]
struct Frame {
    /// Distinguishes recursive invocations of the same rule.
    invocation: u64,
    args: Args,
    output: Output,
    start: Option<TextSize>,
    end: TextSize,
}

impl Frame {
    fn range(&self, fallback: TextSize) -> TextRange {
        self.start
            .map_or(TextRange::empty(fallback), |start| TextRange::new(start, self.end))
    }
}

struct Checkpoint {
    pos: usize,
    unordered: FxHashMap<(u64, u32), Vec<bool>>,
}

struct Engine<'a> {
    grammar: &'a CompiledGrammar,
    config: &'a ParserConfig,
    converter: &'a dyn ValueConverter,
    tokens: &'a [Token<'a>],
    text_len: TextSize,
    /// Raw indices of the tokens the grammar sees.
    significant: Vec<usize>,
    pos: usize,
    mode: Mode,
    sink: CstSink<'a>,
    ast: AstTreeBuilder,
    frames: Vec<Frame>,
    errors: Vec<SyntaxError>,
    /// Fired members of every active unordered group, keyed by invocation
    /// and site.
    unordered: FxHashMap<(u64, u32), Vec<bool>>,
    invocations: u64,
}

impl<'a> Engine<'a> {
    fn new(
        grammar: &'a CompiledGrammar,
        tokens: &'a [Token<'a>],
        text: &str,
        config: &'a ParserConfig,
        converter: &'a dyn ValueConverter,
    ) -> Self {
        let registry = grammar.tokens();
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| !registry.get(token.kind).is_hidden())
            .map(|(idx, _)| idx)
            .collect();
        Self {
            grammar,
            config,
            converter,
            tokens,
            text_len: TextSize::of(text),
            significant,
            pos: 0,
            mode: Mode::Real,
            sink: CstSink::new(tokens),
            ast: AstTreeBuilder::default(),
            frames: Vec::new(),
            errors: Vec::new(),
            unordered: FxHashMap::default(),
            invocations: 0,
        }
    }

    fn run(mut self) -> (GreenNode, AstTree, Vec<SyntaxError>) {
        let whole = TextRange::up_to(self.text_len);
        let data = match self.invoke(self.grammar.entry(), Args::default()) {
            Ok((_, Frame { output: Output::Node(data), .. })) => data,
            Ok((procedure, _)) => NodeData::new(procedure.name.clone()),
            Err(_) => NodeData::new(self.grammar.name.clone()),
        };
        // The root spans the whole document, leading trivia included.
        let root = self.ast.alloc(data, whole);

        let trailing = self.significant.get(self.pos).copied();
        if let Some(raw) = trailing {
            let start = self.tokens[raw].offset;
            self.report(SyntaxError::new(
                format!("unexpected `{}` after the end of the document", self.tokens[raw].text),
                TextRange::new(start, self.text_len),
                ErrorCode::E0205,
            ));
        }
        let Engine {
            sink, ast, errors, ..
        } = self;
        (sink.finish(trailing), ast.finish(root), errors)
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn peek(&self, n: usize) -> Option<TokenId> {
        self.significant
            .get(self.pos + n)
            .map(|&raw| self.tokens[raw].kind)
    }

    fn current(&self) -> Option<&'a Token<'a>> {
        let tokens = self.tokens;
        self.significant.get(self.pos).map(|&raw| &tokens[raw])
    }

    /// Start of the current significant token, or the end of input.
    fn offset(&self) -> TextSize {
        self.current().map_or(self.text_len, |token| token.offset)
    }

    /// Raw index the next rule node starts at.
    fn next_raw(&self) -> usize {
        self.significant
            .get(self.pos)
            .copied()
            .unwrap_or(self.tokens.len())
    }

    fn display(&self, token: TokenId) -> String {
        self.grammar.tokens().get(token).display_name()
    }

    // =========================================================================
    // Interpretation
    // =========================================================================

    fn exec(&mut self, op: &'a Op) -> Step {
        match op {
            Op::Consume { token, origin, .. } => self.consume(*token, origin),
            Op::Subrule {
                rule,
                arguments,
                origin,
                ..
            } => self.subrule(*rule, arguments, origin),
            Op::Action {
                type_name,
                assignment,
            } => {
                self.action(type_name, assignment.as_ref());
                Ok(())
            }
            Op::Sequence(ops) => {
                for op in ops {
                    self.exec(op)?;
                }
                Ok(())
            }
            Op::Alternatives { branches, .. } => self.alternatives(branches),
            Op::UnorderedGroup {
                many_site,
                branches,
                ..
            } => self.unordered_group(*many_site, branches),
            Op::Optional { gate, body, .. } => {
                if self.gate(gate.as_ref()) {
                    self.speculate(body, false)?;
                }
                Ok(())
            }
            Op::Many { gate, body, .. } => self.repeat(gate.as_ref(), body),
            Op::AtLeastOne { body, .. } => {
                self.exec(body)?;
                self.repeat(None, body)
            }
            Op::Empty => Ok(()),
        }
    }

    fn gate(&self, gate: Option<&Condition>) -> bool {
        match self.frames.last() {
            Some(frame) => gate_passes(gate, &frame.args),
            None => gate.is_none(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            unordered: self.unordered.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.unordered = checkpoint.unordered;
    }

    /// Run `body` in recording mode and rewind.
    fn lookahead(&mut self, body: &'a Op) -> Lookahead {
        let checkpoint = self.checkpoint();
        let saved = self.mode;
        let limit = self.pos + self.config.max_lookahead;
        let horizon = match saved {
            Mode::Recording { horizon } => horizon.min(limit),
            Mode::Real => limit,
        };
        self.mode = Mode::Recording { horizon };
        let start = self.pos;
        let result = self.exec(body);
        let advanced = self.pos > start;
        self.mode = saved;
        self.restore(checkpoint);
        match result {
            Err(Stop::Mismatch) => Lookahead::Blocked,
            Err(Stop::Horizon) => Lookahead::Advances,
            Ok(()) if advanced => Lookahead::Advances,
            Ok(()) => Lookahead::Empty,
        }
    }

    /// Run `body` if it can start here; returns whether it ran.
    ///
    /// With `require_progress`, a body that would match nothing counts as not
    /// matching.
    fn speculate(&mut self, body: &'a Op, require_progress: bool) -> Result<bool, Stop> {
        match self.mode {
            Mode::Real => match self.lookahead(body) {
                Lookahead::Blocked => Ok(false),
                Lookahead::Empty if require_progress => Ok(false),
                Lookahead::Empty | Lookahead::Advances => {
                    self.exec(body)?;
                    Ok(true)
                }
            },
            Mode::Recording { .. } => {
                let checkpoint = self.checkpoint();
                match self.exec(body) {
                    Ok(()) if require_progress && self.pos == checkpoint.pos => {
                        self.restore(checkpoint);
                        Ok(false)
                    }
                    Ok(()) => Ok(true),
                    Err(Stop::Horizon) => Err(Stop::Horizon),
                    Err(Stop::Mismatch) => {
                        self.restore(checkpoint);
                        Ok(false)
                    }
                }
            }
        }
    }

    fn repeat(&mut self, gate: Option<&Condition>, body: &'a Op) -> Step {
        while self.gate(gate) {
            let before = self.pos;
            if !self.speculate(body, false)? || self.pos == before {
                break;
            }
        }
        Ok(())
    }

    fn alternatives(&mut self, branches: &'a [Branch]) -> Step {
        for (idx, branch) in branches.iter().enumerate() {
            if self.gate(branch.gate.as_ref()) && self.speculate(&branch.body, false)? {
                if self.mode == Mode::Real {
                    tracing::trace!(branch = idx, offset = ?self.offset(), "took alternative");
                }
                return Ok(());
            }
        }
        match self.mode {
            Mode::Recording { .. } => Err(Stop::Mismatch),
            Mode::Real => {
                let error = match self.current() {
                    Some(token) => SyntaxError::new(
                        format!("no viable alternative at `{}`", token.text),
                        token.range(),
                        ErrorCode::E0203,
                    ),
                    None => SyntaxError::at_offset(
                        "unexpected end of input, no alternative matches",
                        self.text_len,
                        ErrorCode::E0204,
                    ),
                };
                self.report(error);
                Ok(())
            }
        }
    }

    fn unordered_group(&mut self, site: u32, branches: &'a [UnorderedBranch]) -> Step {
        let invocation = self.frames.last().map_or(0, |frame| frame.invocation);
        let key = (invocation, site);
        self.unordered.insert(key, vec![false; branches.len()]);
        let result = self.unordered_members(key, branches);
        let fired = self.unordered.remove(&key).unwrap_or_default();
        result?;

        if self.mode == Mode::Real {
            let missing = branches
                .iter()
                .zip(&fired)
                .filter(|(branch, fired)| branch.mandatory && !**fired)
                .count();
            if missing > 0 {
                self.report(SyntaxError::at_offset(
                    format!("unordered group is missing {missing} required element(s)"),
                    self.offset(),
                    ErrorCode::E0206,
                ));
            }
        }
        Ok(())
    }

    fn unordered_members(&mut self, key: (u64, u32), branches: &'a [UnorderedBranch]) -> Step {
        loop {
            let before = self.pos;
            let mut fired_any = false;
            for (idx, branch) in branches.iter().enumerate() {
                let fired = self
                    .unordered
                    .get(&key)
                    .and_then(|state| state.get(idx))
                    .copied()
                    .unwrap_or(false);
                let eligible = match &branch.guard {
                    Some(guard) => self.gate(Some(guard)),
                    None => !fired,
                };
                if eligible && self.speculate(&branch.body, true)? {
                    let state = self.unordered.get_mut(&key);
                    if let Some(slot) = state.and_then(|state| state.get_mut(idx)) {
                        *slot = true;
                    }
                    fired_any = true;
                    break;
                }
            }
            if !fired_any || self.pos == before {
                return Ok(());
            }
        }
    }

    // =========================================================================
    // Rule invocation
    // =========================================================================

    fn invoke(&mut self, rule: RuleId, args: Args) -> Result<(&'a Procedure, Frame), Stop> {
        let grammar = self.grammar;
        let Some(procedure) = grammar.procedure_by_id(rule) else {
            self.report(SyntaxError::at_offset(
                format!("unknown rule #{}", rule.0),
                self.offset(),
                ErrorCode::E0999,
            ));
            return Err(Stop::Mismatch);
        };
        let real = self.mode == Mode::Real;
        let output = match &procedure.kind {
            _ if !real => Output::Discard,
            RuleKind::Node { type_name } => Output::Node(NodeData::new(type_name.clone())),
            RuleKind::DataType { .. } => Output::Text(String::new()),
            RuleKind::Fragment => Output::Fragment,
        };

        let max_depth = self.config.max_depth;
        if self.frames.len() >= max_depth {
            // Lookahead cannot see past the limit; the real pass reports it.
            if !real {
                return Err(Stop::Horizon);
            }
            self.report(SyntaxError::at_offset(
                format!("rules nest deeper than {max_depth} levels in `{}`", procedure.name),
                self.offset(),
                ErrorCode::E0999,
            ));
            let skipped = Frame {
                invocation: self.invocations,
                args,
                output,
                start: None,
                end: self.offset(),
            };
            return Ok((procedure, skipped));
        }
        self.invocations += 1;
        self.frames.push(Frame {
            invocation: self.invocations,
            args,
            output,
            start: None,
            end: self.offset(),
        });
        if real {
            self.sink
                .start_node(CstKind::rule(procedure.id), self.next_raw());
        }

        let result = self.exec(&procedure.body);

        if real {
            self.sink.finish_node();
        }
        let frame = self.frames.pop();
        result?;
        frame.map(|frame| (procedure, frame)).ok_or(Stop::Mismatch)
    }

    fn subrule(&mut self, rule: RuleId, arguments: &[CompiledArgument], origin: &Origin) -> Step {
        let args = self
            .frames
            .last()
            .map(|frame| bind_arguments(arguments, &frame.args))
            .unwrap_or_default();
        let (procedure, frame) = self.invoke(rule, args)?;
        if self.mode == Mode::Real {
            self.deliver(procedure, frame, origin);
        }
        Ok(())
    }

    /// Hand a finished callee's result to its caller.
    fn deliver(&mut self, procedure: &Procedure, frame: Frame, origin: &Origin) {
        let range = frame.range(self.offset());
        match frame.output {
            Output::Node(data) => match &origin.assignment {
                Some(target) if target.operator == AssignOp::Flag => {
                    self.assign(target, Value::Bool(true), range);
                }
                Some(target) => {
                    let node = self.ast.alloc(data, range);
                    self.assign(target, Value::Node(node), range);
                }
                None => self.merge_unassigned(data),
            },
            Output::Text(text) => {
                if let Some(Output::Text(outer)) = self.output_mut() {
                    outer.push_str(&text);
                    return;
                }
                let Some(target) = &origin.assignment else {
                    return;
                };
                let value = match &origin.cross_ref {
                    Some(target_type) => Value::Reference(self.ast.reference(PendingReference {
                        ref_text: SmolStr::new(&text),
                        range,
                        target_type: target_type.clone(),
                    })),
                    None => {
                        let data_type = match &procedure.kind {
                            RuleKind::DataType { data_type } => data_type.as_deref(),
                            RuleKind::Node { .. } | RuleKind::Fragment => None,
                        };
                        self.converter.convert_datatype(&text, data_type)
                    }
                };
                self.assign(target, value, range);
            }
            Output::Fragment | Output::Discard => {}
        }
    }

    /// An unassigned node rule call: the callee's node becomes the current
    /// node, keeping what the caller already collected where the callee has
    /// nothing.
    fn merge_unassigned(&mut self, mut callee: NodeData) {
        if let Some(Output::Node(current)) = self.output_mut() {
            callee.merge_from(std::mem::take(current));
            *current = callee;
        }
    }

    // =========================================================================
    // Tokens and values
    // =========================================================================

    fn consume(&mut self, expected: TokenId, origin: &Origin) -> Step {
        if let Mode::Recording { horizon } = self.mode {
            if self.pos >= horizon {
                return Err(Stop::Horizon);
            }
            if self.peek(0) != Some(expected) {
                return Err(Stop::Mismatch);
            }
            self.pos += 1;
            return Ok(());
        }

        if self.peek(0) == Some(expected) {
            self.accept(origin);
        } else if self.config.recovery && self.peek(1) == Some(expected) {
            self.delete_current(expected);
            self.accept(origin);
        } else {
            self.missing(expected);
        }
        Ok(())
    }

    fn accept(&mut self, origin: &Origin) {
        let Some(&raw) = self.significant.get(self.pos) else {
            return;
        };
        let tokens = self.tokens;
        let token = &tokens[raw];
        self.sink.token(raw);
        self.pos += 1;

        let range = token.range();
        for frame in &mut self.frames {
            frame.start.get_or_insert(range.start());
            frame.end = range.end();
        }
        if let Some(Output::Text(text)) = self.output_mut() {
            text.push_str(token.text);
            return;
        }
        let Some(target) = &origin.assignment else {
            return;
        };
        let value = match &origin.cross_ref {
            Some(target_type) => Value::Reference(self.ast.reference(PendingReference {
                ref_text: SmolStr::new(token.text),
                range,
                target_type: target_type.clone(),
            })),
            None => self.token_value(token),
        };
        self.assign(target, value, range);
    }

    fn token_value(&self, token: &Token<'_>) -> Value {
        let ty = self.grammar.tokens().get(token.kind);
        match &ty.kind {
            TokenKind::Terminal { returns, .. } => {
                self.converter
                    .convert_terminal(token.text, &ty.name, returns.as_deref())
            }
            TokenKind::Keyword | TokenKind::Error => Value::String(SmolStr::new(token.text)),
        }
    }

    /// Recovery by deletion: the current token goes into an ERROR node.
    fn delete_current(&mut self, expected: TokenId) {
        let Some(&raw) = self.significant.get(self.pos) else {
            return;
        };
        let tokens = self.tokens;
        let token = &tokens[raw];
        let error = SyntaxError::new(
            format!("unexpected `{}`", token.text),
            token.range(),
            ErrorCode::E0201,
        )
        .with_hint(format!("expected {}", self.display(expected)));
        self.report(error);
        self.sink.error_token(raw);
        self.pos += 1;
    }

    /// Recovery by insertion: report the token and carry on without it.
    fn missing(&mut self, expected: TokenId) {
        let expected = self.display(expected);
        let error = match self.current() {
            Some(token) => SyntaxError::new(
                format!("expected {expected}, found `{}`", token.text),
                token.range(),
                ErrorCode::E0202,
            ),
            None => SyntaxError::at_offset(
                format!("unexpected end of input, expected {expected}"),
                self.text_len,
                ErrorCode::E0204,
            ),
        };
        self.report(error);
    }

    // =========================================================================
    // Node building
    // =========================================================================

    /// Output of the nearest rule that is not a fragment.
    fn output_mut(&mut self) -> Option<&mut Output> {
        self.frames
            .iter_mut()
            .rev()
            .map(|frame| &mut frame.output)
            .find(|output| !matches!(output, Output::Fragment))
    }

    fn assign(&mut self, target: &AssignTarget, value: Value, range: TextRange) {
        let Some(Output::Node(data)) = self.output_mut() else {
            return;
        };
        match target.operator {
            AssignOp::Assign => data.replace_range(&target.feature, range),
            AssignOp::Append | AssignOp::Flag => data.record_range(&target.feature, range),
        }
        store(data, target, value);
    }

    fn action(&mut self, type_name: &SmolStr, assignment: Option<&AssignTarget>) {
        if self.mode != Mode::Real {
            return;
        }
        let fallback = self.offset();
        let Some(frame) = self
            .frames
            .iter_mut()
            .rev()
            .find(|frame| !matches!(frame.output, Output::Fragment))
        else {
            return;
        };
        let Output::Node(data) = &mut frame.output else {
            return;
        };
        let Some(target) = assignment else {
            data.type_name = type_name.clone();
            return;
        };
        // `{Type.feature=current}`: the node so far becomes a child of a new
        // node of `Type`.
        let current = std::mem::replace(data, NodeData::new(type_name.clone()));
        let range = frame.range(fallback);
        let child = self.ast.alloc(current, range);
        if let Some(Output::Node(data)) = self.output_mut() {
            store(data, target, Value::Node(child));
        }
    }

    fn report(&mut self, error: SyntaxError) {
        if self.mode != Mode::Real {
            return;
        }
        if self
            .errors
            .last()
            .is_some_and(|last| last.range.start() == error.range.start())
        {
            tracing::trace!(%error, "suppressed second error at the same offset");
            return;
        }
        self.errors.push(error);
    }
}

fn store(data: &mut NodeData, target: &AssignTarget, value: Value) {
    match target.operator {
        AssignOp::Assign => data.set(&target.feature, value),
        AssignOp::Append => data.append(&target.feature, value),
        AssignOp::Flag => data.set(&target.feature, Value::Bool(true)),
    }
}
