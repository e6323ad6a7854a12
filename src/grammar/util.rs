//! Queries over the grammar model: lookups, reachability, name
//! assignments and datatype-rule detection.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::types::*;

impl Grammar {
    pub fn rule(&self, name: &str) -> Option<&GrammarRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    pub fn parser_rule(&self, name: &str) -> Option<&ParserRule> {
        self.rule(name).and_then(GrammarRule::as_parser)
    }

    pub fn terminal_rule(&self, name: &str) -> Option<&TerminalRule> {
        self.rule(name).and_then(GrammarRule::as_terminal)
    }

    pub fn parser_rules(&self) -> impl Iterator<Item = &ParserRule> {
        self.rules.iter().filter_map(GrammarRule::as_parser)
    }

    pub fn terminal_rules(&self) -> impl Iterator<Item = &TerminalRule> {
        self.rules.iter().filter_map(GrammarRule::as_terminal)
    }

    pub fn type_declaration(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.iter().find(|decl| decl.name == name)
    }

    /// Rules flagged `entry`, or the first parser rule when none is flagged.
    pub fn entry_rules(&self) -> Vec<&ParserRule> {
        let flagged: Vec<_> = self.parser_rules().filter(|rule| rule.entry).collect();
        if flagged.is_empty() {
            self.parser_rules().take(1).collect()
        } else {
            flagged
        }
    }

    /// Names of all rules reachable from the entry rules, including the
    /// terminal rules they use. Hidden terminals are always reachable.
    pub fn reachable_rules(&self) -> FxHashSet<SmolStr> {
        let mut reachable = FxHashSet::default();
        let mut stack: Vec<&SmolStr> = self.entry_rules().into_iter().map(|r| &r.name).collect();
        while let Some(name) = stack.pop() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            let Some(GrammarRule::Parser(rule)) = self.rule(name) else {
                continue;
            };
            walk_elements(&rule.definition, &mut |element| match &element.kind {
                ElementKind::RuleCall(call) => stack.push(&call.rule),
                ElementKind::CrossReference(cross_ref) => {
                    if cross_ref.terminal.is_none() {
                        if let Some(terminal) = self.find_name_assignment(&cross_ref.target_type) {
                            if let ElementKind::RuleCall(call) = &terminal.kind {
                                stack.push(&call.rule);
                            }
                        }
                    }
                }
                _ => {}
            });
        }
        for terminal in self.terminal_rules().filter(|t| t.hidden) {
            reachable.insert(terminal.name.clone());
        }
        reachable
    }

    /// Find the terminal of the `name` assignment that produces nodes of
    /// `type_name`.
    ///
    /// Looks at the rules producing the type; when the type is a union,
    /// its members are searched. Unassigned rule calls are followed.
    pub fn find_name_assignment(&self, type_name: &str) -> Option<&Element> {
        let mut visited = FxHashSet::default();
        self.find_name_assignment_for_type(type_name, &mut visited)
    }

    fn find_name_assignment_for_type<'a>(
        &'a self,
        type_name: &str,
        visited: &mut FxHashSet<SmolStr>,
    ) -> Option<&'a Element> {
        if !visited.insert(SmolStr::new(type_name)) {
            return None;
        }
        for rule in self.parser_rules().filter(|r| r.type_name() == type_name) {
            if let Some(found) = self.find_name_assignment_in_rule(rule, visited) {
                return Some(found);
            }
        }
        let members = self
            .type_declaration(type_name)
            .map(|decl| decl.alternatives.clone())
            .unwrap_or_default();
        members
            .iter()
            .find_map(|member| self.find_name_assignment_for_type(member, visited))
    }

    fn find_name_assignment_in_rule<'a>(
        &'a self,
        rule: &'a ParserRule,
        visited: &mut FxHashSet<SmolStr>,
    ) -> Option<&'a Element> {
        let mut direct = None;
        let mut called = Vec::new();
        scan_for_name(&rule.definition, &mut direct, &mut called);
        if direct.is_some() {
            return direct;
        }
        for callee in called {
            let Some(callee_rule) = self.parser_rule(callee) else {
                continue;
            };
            if !visited.insert(SmolStr::new(format!("rule:{}", callee_rule.name))) {
                continue;
            }
            if let Some(found) = self.find_name_assignment_in_rule(callee_rule, visited) {
                return Some(found);
            }
        }
        None
    }

    /// A datatype rule produces the concatenated text of its tokens instead
    /// of a node: either it declares a primitive return type, or it only
    /// contains keywords, terminal calls and calls to other datatype rules.
    pub fn is_datatype_rule(&self, rule: &ParserRule) -> bool {
        if rule.data_type.is_some() {
            return true;
        }
        let mut visiting = FxHashSet::default();
        self.is_inferred_datatype(rule, &mut visiting)
    }

    fn is_inferred_datatype(&self, rule: &ParserRule, visiting: &mut FxHashSet<SmolStr>) -> bool {
        if rule.data_type.is_some() {
            return true;
        }
        if rule.infers.is_some() || !visiting.insert(rule.name.clone()) {
            return false;
        }
        let mut only_text = true;
        let mut callees = Vec::new();
        walk_elements(&rule.definition, &mut |element| match &element.kind {
            ElementKind::Assignment(_)
            | ElementKind::Action(_)
            | ElementKind::CrossReference(_) => only_text = false,
            ElementKind::RuleCall(call) => callees.push(&call.rule),
            _ => {}
        });
        let result = only_text
            && callees.into_iter().all(|callee| match self.rule(callee) {
                Some(GrammarRule::Terminal(_)) => true,
                Some(GrammarRule::Parser(callee)) => self.is_inferred_datatype(callee, visiting),
                None => false,
            });
        visiting.remove(&rule.name);
        result
    }
}

/// Look for a `name` assignment, collecting unassigned rule calls on the way.
fn scan_for_name<'a>(
    element: &'a Element,
    direct: &mut Option<&'a Element>,
    called: &mut Vec<&'a SmolStr>,
) {
    if direct.is_some() {
        return;
    }
    match &element.kind {
        ElementKind::Assignment(assignment) => {
            if assignment.feature == "name" {
                *direct = Some(assignment.terminal.as_ref());
            }
        }
        ElementKind::RuleCall(call) => called.push(&call.rule),
        ElementKind::Group(group) => {
            for child in &group.elements {
                scan_for_name(child, direct, called);
            }
        }
        ElementKind::Alternatives(elements) | ElementKind::UnorderedGroup(elements) => {
            for child in elements {
                scan_for_name(child, direct, called);
            }
        }
        ElementKind::Keyword(_) | ElementKind::CrossReference(_) | ElementKind::Action(_) => {}
    }
}

/// Pre-order walk over an element tree.
///
/// Assignment terminals and cross-reference terminals are visited too.
pub fn walk_elements<'a>(element: &'a Element, f: &mut impl FnMut(&'a Element)) {
    f(element);
    match &element.kind {
        ElementKind::Assignment(assignment) => walk_elements(&assignment.terminal, f),
        ElementKind::Group(group) => {
            for child in &group.elements {
                walk_elements(child, f);
            }
        }
        ElementKind::Alternatives(elements) | ElementKind::UnorderedGroup(elements) => {
            for child in elements {
                walk_elements(child, f);
            }
        }
        ElementKind::CrossReference(cross_ref) => {
            if let Some(terminal) = &cross_ref.terminal {
                walk_elements(terminal, f);
            }
        }
        ElementKind::Keyword(_) | ElementKind::RuleCall(_) | ElementKind::Action(_) => {}
    }
}

/// All keyword literals used by parser rules, in first-seen order.
pub fn collect_keywords(grammar: &Grammar) -> Vec<SmolStr> {
    let mut seen = FxHashSet::default();
    let mut keywords = Vec::new();
    for rule in grammar.parser_rules() {
        walk_elements(&rule.definition, &mut |element| {
            if let ElementKind::Keyword(keyword) = &element.kind {
                if seen.insert(keyword.value.clone()) {
                    keywords.push(keyword.value.clone());
                }
            }
        });
    }
    keywords
}
