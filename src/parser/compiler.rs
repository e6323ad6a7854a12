//! Grammar-to-parser compiler.
//!
//! Walks every parser rule reachable from the entry rule and emits one
//! [`Procedure`] per rule. Each rule gets its own site counters for consume,
//! subrule, optional, many and alternatives sites, starting at 1; they live
//! in a [`RuleContext`] threaded through the recursion.
//!
//! Cardinality and guards wrap every compiled element:
//!
//! | cardinality | guard | compiled to |
//! |---|---|---|
//! | none | yes | alternatives site: body if gate, empty if `!gate` |
//! | `*` | any | many site, gated |
//! | `+` | no | at-least-one site |
//! | `+` | yes | alternatives site: at-least-one if gate, empty if `!gate` |
//! | `?` | any | optional site, gated |
//!
//! Any unresolved rule, token, type or parameter aborts compilation; no
//! partial parser is produced.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::grammar::{
    AssignOp, AstReflection, Cardinality, Condition, CrossReference, Element, ElementKind, Grammar,
    GrammarRule, ParserRule, RuleCall,
};

use super::cst::CstKind;
use super::errors::GrammarCompileError;
use super::procedure::*;
use super::tokens::TokenRegistry;

/// The executable form of a grammar.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub name: SmolStr,
    procedures: IndexMap<SmolStr, Procedure>,
    entry: RuleId,
    tokens: TokenRegistry,
    reflection: AstReflection,
}

impl CompiledGrammar {
    /// Build the token registry for `grammar` and compile it.
    pub fn from_grammar(grammar: &Grammar) -> Result<Self, GrammarCompileError> {
        let tokens = TokenRegistry::from_grammar(grammar)?;
        compile(grammar, &tokens)
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// Look up a procedure by id. Ids are handed out by this grammar.
    pub fn procedure_by_id(&self, id: RuleId) -> Option<&Procedure> {
        self.procedures.get_index(id.index()).map(|(_, procedure)| procedure)
    }

    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    pub fn entry(&self) -> RuleId {
        self.entry
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn reflection(&self) -> &AstReflection {
        &self.reflection
    }

    /// Human-readable name of a CST kind.
    pub fn kind_name(&self, kind: CstKind) -> &str {
        if kind == CstKind::ROOT {
            return "ROOT";
        }
        if kind == CstKind::ERROR {
            return "ERROR";
        }
        if let Some(token) = kind.as_token() {
            return &self.tokens.get(token).name;
        }
        kind.as_rule()
            .and_then(|rule| self.procedure_by_id(rule))
            .map_or("UNKNOWN", |procedure| procedure.name.as_str())
    }
}

/// Compile `grammar` against `tokens`.
pub fn compile(
    grammar: &Grammar,
    tokens: &TokenRegistry,
) -> Result<CompiledGrammar, GrammarCompileError> {
    let entries = grammar.entry_rules();
    let Some(entry_rule) = entries.first() else {
        return Err(GrammarCompileError::NoEntryRule {
            grammar: grammar.name.clone(),
        });
    };
    if entries.len() > 1 {
        tracing::warn!(
            grammar = %grammar.name,
            entry = %entry_rule.name,
            "several entry rules flagged, parsing starts at the first"
        );
    }

    let reachable = grammar.reachable_rules();
    let rules: Vec<&ParserRule> = grammar
        .parser_rules()
        .filter(|rule| {
            let keep = reachable.contains(&rule.name);
            if !keep {
                tracing::debug!(rule = %rule.name, "skipping unreachable rule");
            }
            keep
        })
        .collect();
    let rule_ids: FxHashMap<SmolStr, RuleId> = rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| (rule.name.clone(), RuleId(idx as u32)))
        .collect();

    let reflection = AstReflection::from_grammar(grammar);
    let mut procedures = IndexMap::with_capacity(rules.len());
    for (idx, rule) in rules.iter().enumerate() {
        let mut ctx = RuleContext::new(grammar, tokens, &rule_ids, &reflection, rule);
        let body = ctx.element(&rule.definition, None, false)?;
        let kind = if rule.fragment {
            RuleKind::Fragment
        } else if grammar.is_datatype_rule(rule) {
            RuleKind::DataType {
                data_type: rule.data_type.clone(),
            }
        } else {
            RuleKind::Node {
                type_name: rule.type_name().clone(),
            }
        };
        let procedure = Procedure {
            id: RuleId(idx as u32),
            name: rule.name.clone(),
            kind,
            parameters: rule.parameters.clone(),
            body,
            sites: ctx.counts(),
        };
        tracing::trace!(rule = %rule.name, sites = ?procedure.sites, "compiled rule");
        procedures.insert(rule.name.clone(), procedure);
    }

    let entry = rule_ids
        .get(&entry_rule.name)
        .copied()
        .ok_or_else(|| GrammarCompileError::NoEntryRule {
            grammar: grammar.name.clone(),
        })?;

    tracing::debug!(
        grammar = %grammar.name,
        rules = procedures.len(),
        "compiled grammar"
    );
    Ok(CompiledGrammar {
        name: grammar.name.clone(),
        procedures,
        entry,
        tokens: tokens.clone(),
        reflection,
    })
}

/// Per-rule compilation state.
struct RuleContext<'g> {
    grammar: &'g Grammar,
    tokens: &'g TokenRegistry,
    rule_ids: &'g FxHashMap<SmolStr, RuleId>,
    reflection: &'g AstReflection,
    rule: &'g ParserRule,
    /// Child indices from the rule definition down to the current element.
    path: Vec<usize>,
    consume: u32,
    subrule: u32,
    optional: u32,
    many: u32,
    or: u32,
}

impl<'g> RuleContext<'g> {
    fn new(
        grammar: &'g Grammar,
        tokens: &'g TokenRegistry,
        rule_ids: &'g FxHashMap<SmolStr, RuleId>,
        reflection: &'g AstReflection,
        rule: &'g ParserRule,
    ) -> Self {
        Self {
            grammar,
            tokens,
            rule_ids,
            reflection,
            rule,
            path: Vec::new(),
            consume: 1,
            subrule: 1,
            optional: 1,
            many: 1,
            or: 1,
        }
    }

    fn counts(&self) -> SiteCounts {
        SiteCounts {
            consume: self.consume - 1,
            subrule: self.subrule - 1,
            optional: self.optional - 1,
            many: self.many - 1,
            alternatives: self.or - 1,
        }
    }

    fn next(counter: &mut u32) -> u32 {
        let site = *counter;
        *counter += 1;
        site
    }

    /// `Rule:1:0:Assignment`
    fn element_path(&self, element: &Element) -> String {
        let mut path = self.rule.name.to_string();
        for idx in &self.path {
            path.push(':');
            path.push_str(&idx.to_string());
        }
        path.push(':');
        path.push_str(element.kind.kind_name());
        path
    }

    fn element(
        &mut self,
        element: &'g Element,
        assignment: Option<&AssignTarget>,
        ignore_guard: bool,
    ) -> Result<Op, GrammarCompileError> {
        let op = match &element.kind {
            ElementKind::Keyword(keyword) => {
                let site = Self::next(&mut self.consume);
                let token = self.tokens.keyword(&keyword.value).ok_or_else(|| {
                    GrammarCompileError::MissingToken {
                        path: self.element_path(element),
                        token: keyword.value.clone(),
                    }
                })?;
                Op::Consume {
                    site,
                    token,
                    origin: Origin {
                        assignment: assignment.cloned(),
                        cross_ref: None,
                    },
                }
            }
            ElementKind::Action(action) => Op::Action {
                type_name: action.type_name.clone(),
                assignment: action.feature.clone().map(|feature| AssignTarget {
                    feature,
                    operator: action.operator.unwrap_or(AssignOp::Assign),
                }),
            },
            ElementKind::Assignment(assign) => {
                let target = AssignTarget {
                    feature: assign.feature.clone(),
                    operator: assign.operator,
                };
                self.element(&assign.terminal, Some(&target), false)?
            }
            ElementKind::CrossReference(cross_ref) => {
                self.cross_reference(element, cross_ref, cross_ref.terminal.as_deref(), assignment)?
            }
            ElementKind::RuleCall(call) => self.rule_call(element, call, assignment)?,
            ElementKind::Alternatives(elements) => {
                if let [single] = elements.as_slice() {
                    self.child(0, single, assignment, false)?
                } else {
                    let mut branches = Vec::with_capacity(elements.len());
                    for (idx, child) in elements.iter().enumerate() {
                        let gate = self.checked_guard(child)?;
                        let body = self.child(idx, child, assignment, true)?;
                        branches.push(Branch { gate, body });
                    }
                    let site = Self::next(&mut self.or);
                    Op::Alternatives { site, branches }
                }
            }
            ElementKind::UnorderedGroup(elements) => {
                if let [single] = elements.as_slice() {
                    self.child(0, single, assignment, false)?
                } else {
                    let mut branches = Vec::with_capacity(elements.len());
                    for (idx, child) in elements.iter().enumerate() {
                        let guard = self.checked_guard(child)?;
                        let body = self.child(idx, child, assignment, true)?;
                        let mandatory = guard.is_none()
                            && !child.cardinality.is_some_and(|c| c.is_optional());
                        branches.push(UnorderedBranch {
                            guard,
                            mandatory,
                            body,
                        });
                    }
                    let alternatives_site = Self::next(&mut self.or);
                    let many_site = Self::next(&mut self.many);
                    Op::UnorderedGroup {
                        alternatives_site,
                        many_site,
                        branches,
                    }
                }
            }
            ElementKind::Group(group) => {
                let mut ops = Vec::with_capacity(group.elements.len());
                for (idx, child) in group.elements.iter().enumerate() {
                    ops.push(self.child(idx, child, assignment, false)?);
                }
                Op::Sequence(ops)
            }
        };

        let guard = if ignore_guard {
            None
        } else {
            self.checked_guard(element)?
        };
        Ok(self.wrap(guard, op, element.cardinality))
    }

    fn child(
        &mut self,
        idx: usize,
        element: &'g Element,
        assignment: Option<&AssignTarget>,
        ignore_guard: bool,
    ) -> Result<Op, GrammarCompileError> {
        self.path.push(idx);
        let result = self.element(element, assignment, ignore_guard);
        self.path.pop();
        result
    }

    /// The element's guard, after checking it only names rule parameters.
    fn checked_guard(&self, element: &Element) -> Result<Option<Condition>, GrammarCompileError> {
        let Some(guard) = element.guard() else {
            return Ok(None);
        };
        self.check_condition(element, guard)?;
        Ok(Some(guard.clone()))
    }

    fn check_condition(
        &self,
        element: &Element,
        condition: &Condition,
    ) -> Result<(), GrammarCompileError> {
        for parameter in condition.parameters() {
            if !self.rule.parameters.contains(parameter) {
                return Err(GrammarCompileError::UnknownParameter {
                    path: self.element_path(element),
                    parameter: parameter.clone(),
                });
            }
        }
        Ok(())
    }

    fn rule_call(
        &mut self,
        element: &Element,
        call: &RuleCall,
        assignment: Option<&AssignTarget>,
    ) -> Result<Op, GrammarCompileError> {
        let origin = Origin {
            assignment: assignment.cloned(),
            cross_ref: None,
        };
        match self.grammar.rule(&call.rule) {
            Some(GrammarRule::Parser(callee)) => {
                let site = Self::next(&mut self.subrule);
                let arguments = self.arguments(element, call, callee)?;
                let rule = self.rule_id(element, &callee.name)?;
                Ok(Op::Subrule {
                    site,
                    rule,
                    arguments,
                    origin,
                })
            }
            Some(GrammarRule::Terminal(terminal)) => {
                let site = Self::next(&mut self.consume);
                let token = self.tokens.terminal(&terminal.name).ok_or_else(|| {
                    GrammarCompileError::MissingToken {
                        path: self.element_path(element),
                        token: terminal.name.clone(),
                    }
                })?;
                Ok(Op::Consume {
                    site,
                    token,
                    origin,
                })
            }
            None => Err(GrammarCompileError::UnknownRule {
                path: self.element_path(element),
                rule: call.rule.clone(),
            }),
        }
    }

    fn rule_id(&self, element: &Element, name: &SmolStr) -> Result<RuleId, GrammarCompileError> {
        self.rule_ids
            .get(name)
            .copied()
            .ok_or_else(|| GrammarCompileError::UnknownRule {
                path: self.element_path(element),
                rule: name.clone(),
            })
    }

    /// Bind call arguments to the callee's parameters, by name or position.
    fn arguments(
        &self,
        element: &Element,
        call: &RuleCall,
        callee: &ParserRule,
    ) -> Result<Vec<CompiledArgument>, GrammarCompileError> {
        if call.arguments.len() > callee.parameters.len() {
            return Err(GrammarCompileError::TooManyArguments {
                path: self.element_path(element),
                rule: callee.name.clone(),
                expected: callee.parameters.len(),
                found: call.arguments.len(),
            });
        }
        let mut compiled = Vec::with_capacity(call.arguments.len());
        for (idx, argument) in call.arguments.iter().enumerate() {
            self.check_condition(element, &argument.value)?;
            let parameter = match &argument.parameter {
                Some(name) if callee.parameters.contains(name) => name.clone(),
                Some(name) => {
                    return Err(GrammarCompileError::UnknownParameter {
                        path: self.element_path(element),
                        parameter: name.clone(),
                    });
                }
                None => callee.parameters[idx].clone(),
            };
            compiled.push(CompiledArgument {
                parameter,
                value: argument.value.clone(),
            });
        }
        Ok(compiled)
    }

    fn cross_reference(
        &mut self,
        element: &Element,
        cross_ref: &CrossReference,
        terminal: Option<&Element>,
        assignment: Option<&AssignTarget>,
    ) -> Result<Op, GrammarCompileError> {
        if !self.reflection.is_known(&cross_ref.target_type) {
            return Err(GrammarCompileError::UnresolvedType {
                path: self.element_path(element),
                type_name: cross_ref.target_type.clone(),
            });
        }
        let origin = Origin {
            assignment: assignment.cloned(),
            cross_ref: Some(cross_ref.target_type.clone()),
        };
        let Some(terminal) = terminal else {
            let name_terminal = self
                .grammar
                .find_name_assignment(&cross_ref.target_type)
                .ok_or_else(|| GrammarCompileError::MissingNameAssignment {
                    path: self.element_path(element),
                    type_name: cross_ref.target_type.clone(),
                })?;
            return self.cross_reference(element, cross_ref, Some(name_terminal), assignment);
        };

        match &terminal.kind {
            ElementKind::RuleCall(call) => match self.grammar.rule(&call.rule) {
                Some(GrammarRule::Parser(callee)) => {
                    let site = Self::next(&mut self.subrule);
                    let rule = self.rule_id(element, &callee.name)?;
                    // The callee sees the caller's parameters of the same name.
                    let arguments = callee
                        .parameters
                        .iter()
                        .map(|parameter| CompiledArgument {
                            parameter: parameter.clone(),
                            value: Condition::Parameter(parameter.clone()),
                        })
                        .collect();
                    Ok(Op::Subrule {
                        site,
                        rule,
                        arguments,
                        origin,
                    })
                }
                Some(GrammarRule::Terminal(rule)) => {
                    let site = Self::next(&mut self.consume);
                    let token = self.tokens.terminal(&rule.name).ok_or_else(|| {
                        GrammarCompileError::MissingToken {
                            path: self.element_path(element),
                            token: rule.name.clone(),
                        }
                    })?;
                    Ok(Op::Consume {
                        site,
                        token,
                        origin,
                    })
                }
                None => Err(GrammarCompileError::UnknownRule {
                    path: self.element_path(element),
                    rule: call.rule.clone(),
                }),
            },
            ElementKind::Keyword(keyword) => {
                let site = Self::next(&mut self.consume);
                let token = self.tokens.keyword(&keyword.value).ok_or_else(|| {
                    GrammarCompileError::MissingToken {
                        path: self.element_path(element),
                        token: keyword.value.clone(),
                    }
                })?;
                Ok(Op::Consume {
                    site,
                    token,
                    origin,
                })
            }
            _ => Err(GrammarCompileError::UnsupportedCrossReferenceTerminal {
                path: self.element_path(element),
            }),
        }
    }

    fn wrap(&mut self, gate: Option<Condition>, body: Op, cardinality: Option<Cardinality>) -> Op {
        match (cardinality, gate) {
            (None, None) => body,
            (None, Some(gate)) => {
                let site = Self::next(&mut self.or);
                Op::Alternatives {
                    site,
                    branches: vec![
                        Branch {
                            gate: Some(gate.clone()),
                            body,
                        },
                        Branch {
                            gate: Some(!gate),
                            body: Op::Empty,
                        },
                    ],
                }
            }
            (Some(Cardinality::Many), gate) => Op::Many {
                site: Self::next(&mut self.many),
                gate,
                body: Box::new(body),
            },
            (Some(Cardinality::AtLeastOne), None) => Op::AtLeastOne {
                site: Self::next(&mut self.many),
                body: Box::new(body),
            },
            (Some(Cardinality::AtLeastOne), Some(gate)) => {
                let many_site = Self::next(&mut self.many);
                let site = Self::next(&mut self.or);
                Op::Alternatives {
                    site,
                    branches: vec![
                        Branch {
                            gate: Some(gate.clone()),
                            body: Op::AtLeastOne {
                                site: many_site,
                                body: Box::new(body),
                            },
                        },
                        Branch {
                            gate: Some(!gate),
                            body: Op::Empty,
                        },
                    ],
                }
            }
            (Some(Cardinality::Optional), gate) => Op::Optional {
                site: Self::next(&mut self.optional),
                gate,
                body: Box::new(body),
            },
        }
    }
}
