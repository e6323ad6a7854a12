//! Constructors for building grammars in code.
//!
//! ```ignore
//! use grammarkit::grammar::builder::*;
//!
//! let grammar = Grammar::new("Hello")
//!     .with_rule(ParserRule::new("Greeting", group([keyword("hello"), assign("name", call("ID"))])).entry())
//!     .with_terminal(TerminalRule::new("ID", r"[_a-zA-Z][\w_]*"))
//!     .with_terminal(TerminalRule::new("WS", r"\s+").hidden());
//! ```

use smol_str::SmolStr;

use super::types::*;

impl Grammar {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ParserRule) -> Self {
        self.rules.push(GrammarRule::Parser(rule));
        self
    }

    pub fn with_terminal(mut self, rule: TerminalRule) -> Self {
        self.rules.push(GrammarRule::Terminal(rule));
        self
    }

    pub fn with_type<I, S>(mut self, name: impl Into<SmolStr>, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.types.push(TypeDeclaration {
            name: name.into(),
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds the usual `ID`, `INT`, `STRING` terminals plus hidden whitespace
    /// and comments.
    pub fn with_common_terminals(self) -> Self {
        self.with_terminal(TerminalRule::new("WS", r"\s+").hidden())
            .with_terminal(TerminalRule::new("ID", r"[_a-zA-Z][\w_]*"))
            .with_terminal(TerminalRule::new("INT", r"[0-9]+").returns("number"))
            .with_terminal(TerminalRule::new("STRING", r#""[^"]*"|'[^']*'"#))
            .with_terminal(TerminalRule::new("ML_COMMENT", r"/\*[\s\S]*?\*/").hidden())
            .with_terminal(TerminalRule::new("SL_COMMENT", r"//[^\n\r]*").hidden())
    }
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            cardinality: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.cardinality = Some(Cardinality::Optional);
        self
    }

    pub fn many(mut self) -> Self {
        self.cardinality = Some(Cardinality::Many);
        self
    }

    pub fn at_least_one(mut self) -> Self {
        self.cardinality = Some(Cardinality::AtLeastOne);
        self
    }

    /// Attach a guard condition. Guards live on groups, so any other element
    /// is wrapped into a single-element group first.
    pub fn guarded(self, condition: Condition) -> Self {
        match self.kind {
            ElementKind::Group(mut group) => {
                group.guard = Some(condition);
                Element {
                    kind: ElementKind::Group(group),
                    cardinality: self.cardinality,
                }
            }
            kind => {
                let cardinality = self.cardinality;
                Element {
                    kind: ElementKind::Group(Group {
                        elements: vec![Element::new(kind)],
                        guard: Some(condition),
                    }),
                    cardinality,
                }
            }
        }
    }

    /// The guard condition of this element, if it is a guarded group.
    pub fn guard(&self) -> Option<&Condition> {
        match &self.kind {
            ElementKind::Group(group) => group.guard.as_ref(),
            _ => None,
        }
    }
}

pub fn keyword(value: impl Into<SmolStr>) -> Element {
    Element::new(ElementKind::Keyword(Keyword {
        value: value.into(),
    }))
}

/// Call a parser or terminal rule.
pub fn call(rule: impl Into<SmolStr>) -> Element {
    Element::new(ElementKind::RuleCall(RuleCall {
        rule: rule.into(),
        arguments: Vec::new(),
    }))
}

/// Call a parameterised parser rule with positional arguments.
pub fn call_with(rule: impl Into<SmolStr>, arguments: Vec<Condition>) -> Element {
    Element::new(ElementKind::RuleCall(RuleCall {
        rule: rule.into(),
        arguments: arguments
            .into_iter()
            .map(|value| NamedArgument {
                parameter: None,
                value,
            })
            .collect(),
    }))
}

fn assignment(feature: impl Into<SmolStr>, operator: AssignOp, terminal: Element) -> Element {
    Element::new(ElementKind::Assignment(Assignment {
        feature: feature.into(),
        operator,
        terminal: Box::new(terminal),
    }))
}

/// `feature=terminal`
pub fn assign(feature: impl Into<SmolStr>, terminal: Element) -> Element {
    assignment(feature, AssignOp::Assign, terminal)
}

/// `feature+=terminal`
pub fn append(feature: impl Into<SmolStr>, terminal: Element) -> Element {
    assignment(feature, AssignOp::Append, terminal)
}

/// `feature?=terminal`
pub fn flag(feature: impl Into<SmolStr>, terminal: Element) -> Element {
    assignment(feature, AssignOp::Flag, terminal)
}

pub fn group(elements: impl IntoIterator<Item = Element>) -> Element {
    Element::new(ElementKind::Group(Group {
        elements: elements.into_iter().collect(),
        guard: None,
    }))
}

pub fn alternatives(elements: impl IntoIterator<Item = Element>) -> Element {
    Element::new(ElementKind::Alternatives(elements.into_iter().collect()))
}

pub fn unordered(elements: impl IntoIterator<Item = Element>) -> Element {
    Element::new(ElementKind::UnorderedGroup(elements.into_iter().collect()))
}

/// `[Type]`: the reference text is parsed with the target's name terminal.
pub fn cross_ref(target_type: impl Into<SmolStr>) -> Element {
    Element::new(ElementKind::CrossReference(CrossReference {
        target_type: target_type.into(),
        terminal: None,
    }))
}

/// `[Type:Terminal]`
pub fn cross_ref_with(target_type: impl Into<SmolStr>, terminal: Element) -> Element {
    Element::new(ElementKind::CrossReference(CrossReference {
        target_type: target_type.into(),
        terminal: Some(Box::new(terminal)),
    }))
}

/// `{Type}`
pub fn action(type_name: impl Into<SmolStr>) -> Element {
    Element::new(ElementKind::Action(Action {
        type_name: type_name.into(),
        feature: None,
        operator: None,
    }))
}

/// `{Type.feature=current}` / `{Type.feature+=current}`
pub fn action_assign(
    type_name: impl Into<SmolStr>,
    feature: impl Into<SmolStr>,
    operator: AssignOp,
) -> Element {
    Element::new(ElementKind::Action(Action {
        type_name: type_name.into(),
        feature: Some(feature.into()),
        operator: Some(operator),
    }))
}
