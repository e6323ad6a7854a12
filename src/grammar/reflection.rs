//! Type reflection derived from a grammar.
//!
//! Answers subtype questions for cross-reference target checks. Subtyping
//! comes from three places:
//! - declared unions (`type Type = DataType | Entity`)
//! - unassigned calls (`Element: Entity | DataType` makes both `Element`s)
//! - actions inside a rule (`{Binary.left=current}` inside `Expression`)

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::types::{Element, ElementKind, Grammar, ParserRule};

#[derive(Debug, Clone, Default)]
pub struct AstReflection {
    /// Type → direct supertypes.
    supertypes: FxHashMap<SmolStr, FxHashSet<SmolStr>>,
    /// All known type names, in discovery order.
    types: Vec<SmolStr>,
}

impl AstReflection {
    pub fn from_grammar(grammar: &Grammar) -> Self {
        let mut reflection = Self::default();

        for rule in grammar.parser_rules() {
            if rule.fragment || grammar.is_datatype_rule(rule) {
                continue;
            }
            reflection.declare(rule.type_name());
            reflection.collect_rule_subtypes(grammar, rule);
        }

        for decl in &grammar.types {
            reflection.declare(&decl.name);
            for member in &decl.alternatives {
                reflection.add_supertype(member, &decl.name);
            }
        }

        reflection
    }

    fn collect_rule_subtypes(&mut self, grammar: &Grammar, rule: &ParserRule) {
        let own_type = rule.type_name().clone();
        let mut subtypes = Vec::new();
        collect_unassigned(&rule.definition, &mut |element| match &element.kind {
            ElementKind::RuleCall(call) => {
                if let Some(callee) = grammar.parser_rule(&call.rule) {
                    if !callee.fragment && !grammar.is_datatype_rule(callee) {
                        subtypes.push(callee.type_name().clone());
                    }
                }
            }
            ElementKind::Action(action) => subtypes.push(action.type_name.clone()),
            _ => {}
        });
        for subtype in subtypes {
            if subtype != own_type {
                self.add_supertype(&subtype, &own_type);
            }
        }
    }

    fn declare(&mut self, name: &SmolStr) {
        if !self.supertypes.contains_key(name) {
            self.supertypes.insert(name.clone(), FxHashSet::default());
            self.types.push(name.clone());
        }
    }

    fn add_supertype(&mut self, subtype: &SmolStr, supertype: &SmolStr) {
        self.declare(subtype);
        self.declare(supertype);
        if let Some(supers) = self.supertypes.get_mut(subtype) {
            supers.insert(supertype.clone());
        }
    }

    /// All types known from the grammar.
    pub fn all_types(&self) -> &[SmolStr] {
        &self.types
    }

    pub fn is_known(&self, type_name: &str) -> bool {
        self.supertypes.contains_key(type_name)
    }

    /// Reflexive, transitive subtype check.
    pub fn is_subtype(&self, subtype: &str, supertype: &str) -> bool {
        if subtype == supertype {
            return true;
        }
        let mut visited = FxHashSet::default();
        let mut stack = vec![subtype];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(supers) = self.supertypes.get(current) else {
                continue;
            };
            for sup in supers {
                if sup == supertype {
                    return true;
                }
                stack.push(sup.as_str());
            }
        }
        false
    }
}

/// Visit elements outside of assignments (assigned calls produce feature
/// values, not the rule's own node).
fn collect_unassigned<'a>(
    element: &'a Element,
    f: &mut impl FnMut(&'a Element),
) {
    visit(element, f);

    fn visit<'a>(
        element: &'a Element,
        f: &mut impl FnMut(&'a Element),
    ) {
        f(element);
        match &element.kind {
            ElementKind::Group(group) => {
                for child in &group.elements {
                    visit(child, f);
                }
            }
            ElementKind::Alternatives(elements) | ElementKind::UnorderedGroup(elements) => {
                for child in elements {
                    visit(child, f);
                }
            }
            ElementKind::Assignment(_)
            | ElementKind::Keyword(_)
            | ElementKind::CrossReference(_)
            | ElementKind::RuleCall(_)
            | ElementKind::Action(_) => {}
        }
    }
}
