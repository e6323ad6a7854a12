//! Grammar model: rules and the element tree.
//!
//! The model is a plain rule tree. Rules and types refer to each other by
//! name; names are resolved by the parser compiler, which rejects grammars
//! with dangling references.

use smol_str::SmolStr;
use std::fmt;

/// A complete grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    /// Grammar name (e.g. `"Statemachine"`).
    pub name: SmolStr,
    /// Parser and terminal rules in declaration order.
    pub rules: Vec<GrammarRule>,
    /// Declared type unions (`type Type = DataType | Entity;`).
    pub types: Vec<TypeDeclaration>,
}

/// A parser rule or a terminal rule.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarRule {
    Parser(ParserRule),
    Terminal(TerminalRule),
}

impl GrammarRule {
    pub fn name(&self) -> &str {
        match self {
            GrammarRule::Parser(rule) => &rule.name,
            GrammarRule::Terminal(rule) => &rule.name,
        }
    }

    pub fn as_parser(&self) -> Option<&ParserRule> {
        match self {
            GrammarRule::Parser(rule) => Some(rule),
            GrammarRule::Terminal(_) => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&TerminalRule> {
        match self {
            GrammarRule::Terminal(rule) => Some(rule),
            GrammarRule::Parser(_) => None,
        }
    }
}

/// A parser rule: `Name<Params>: definition;`
#[derive(Debug, Clone, PartialEq)]
pub struct ParserRule {
    pub name: SmolStr,
    /// Marks an entry rule of the grammar.
    pub entry: bool,
    /// Fragment rules contribute their features to the calling node.
    pub fragment: bool,
    /// Declared primitive return type (`returns string`). Makes this a
    /// datatype rule.
    pub data_type: Option<SmolStr>,
    /// Declared or inferred node type; defaults to the rule name.
    pub infers: Option<SmolStr>,
    /// Boolean parameters, bound positionally by rule calls.
    pub parameters: Vec<SmolStr>,
    pub definition: Element,
}

impl ParserRule {
    pub fn new(name: impl Into<SmolStr>, definition: Element) -> Self {
        Self {
            name: name.into(),
            entry: false,
            fragment: false,
            data_type: None,
            infers: None,
            parameters: Vec::new(),
            definition,
        }
    }

    pub fn entry(mut self) -> Self {
        self.entry = true;
        self
    }

    pub fn fragment(mut self) -> Self {
        self.fragment = true;
        self
    }

    pub fn returns_data_type(mut self, data_type: impl Into<SmolStr>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn infers(mut self, type_name: impl Into<SmolStr>) -> Self {
        self.infers = Some(type_name.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// The AST type produced by this rule.
    pub fn type_name(&self) -> &SmolStr {
        self.infers.as_ref().unwrap_or(&self.name)
    }
}

/// A terminal rule backed by a regular expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalRule {
    pub name: SmolStr,
    /// Regular expression without delimiters.
    pub pattern: String,
    /// Hidden terminals (whitespace, comments) never reach the parser.
    pub hidden: bool,
    /// Terminal fragments are not tokens on their own.
    pub fragment: bool,
    /// Declared value type (`returns number`).
    pub returns: Option<SmolStr>,
}

impl TerminalRule {
    pub fn new(name: impl Into<SmolStr>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            hidden: false,
            fragment: false,
            returns: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn returns(mut self, type_name: impl Into<SmolStr>) -> Self {
        self.returns = Some(type_name.into());
        self
    }
}

/// `type Name = A | B | C;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: SmolStr,
    pub alternatives: Vec<SmolStr>,
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// Repetition marker of an element. Absence means exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// `?`
    Optional,
    /// `*`
    Many,
    /// `+`
    AtLeastOne,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Optional => "?",
            Cardinality::Many => "*",
            Cardinality::AtLeastOne => "+",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "?" => Some(Cardinality::Optional),
            "*" => Some(Cardinality::Many),
            "+" => Some(Cardinality::AtLeastOne),
            _ => None,
        }
    }

    /// Whether the element may match zero times.
    pub fn is_optional(&self) -> bool {
        matches!(self, Cardinality::Optional | Cardinality::Many)
    }
}

/// A grammar element together with its cardinality.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub cardinality: Option<Cardinality>,
}

/// The closed set of grammar element kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Keyword(Keyword),
    Assignment(Assignment),
    Group(Group),
    Alternatives(Vec<Element>),
    UnorderedGroup(Vec<Element>),
    CrossReference(CrossReference),
    RuleCall(RuleCall),
    Action(Action),
}

impl ElementKind {
    /// Short kind name used in element paths and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ElementKind::Keyword(_) => "Keyword",
            ElementKind::Assignment(_) => "Assignment",
            ElementKind::Group(_) => "Group",
            ElementKind::Alternatives(_) => "Alternatives",
            ElementKind::UnorderedGroup(_) => "UnorderedGroup",
            ElementKind::CrossReference(_) => "CrossReference",
            ElementKind::RuleCall(_) => "RuleCall",
            ElementKind::Action(_) => "Action",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub value: SmolStr,
}

/// Assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=` single value
    Assign,
    /// `+=` append to a list
    Append,
    /// `?=` boolean flag
    Flag,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Append => "+=",
            AssignOp::Flag => "?=",
        }
    }

    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "=" => Some(AssignOp::Assign),
            "+=" => Some(AssignOp::Append),
            "?=" => Some(AssignOp::Flag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub feature: SmolStr,
    pub operator: AssignOp,
    pub terminal: Box<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub elements: Vec<Element>,
    /// Guard condition (`<A & !B> ...`).
    pub guard: Option<Condition>,
}

/// `[Type:Terminal]`
#[derive(Debug, Clone, PartialEq)]
pub struct CrossReference {
    pub target_type: SmolStr,
    /// Terminal producing the reference text; when absent the terminal of
    /// the target type's `name` assignment is used.
    pub terminal: Option<Box<Element>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleCall {
    pub rule: SmolStr,
    pub arguments: Vec<NamedArgument>,
}

/// An argument of a parameterised rule call.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgument {
    /// Explicit parameter name; positional when absent.
    pub parameter: Option<SmolStr>,
    pub value: Condition,
}

/// `{Type}` or `{Type.feature=current}`
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub type_name: SmolStr,
    pub feature: Option<SmolStr>,
    pub operator: Option<AssignOp>,
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Boolean condition over rule parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Or(Box<Condition>, Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Parameter(SmolStr),
    Literal(bool),
}

impl Condition {
    pub fn param(name: impl Into<SmolStr>) -> Self {
        Condition::Parameter(name.into())
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    /// Visit every parameter reference in this condition.
    pub fn parameters(&self) -> Vec<&SmolStr> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(cond) = stack.pop() {
            match cond {
                Condition::Or(l, r) | Condition::And(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Condition::Not(inner) => stack.push(inner),
                Condition::Parameter(name) => out.push(name),
                Condition::Literal(_) => {}
            }
        }
        out
    }
}

impl std::ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Or(l, r) => write!(f, "({l} | {r})"),
            Condition::And(l, r) => write!(f, "({l} & {r})"),
            Condition::Not(inner) => write!(f, "!{inner}"),
            Condition::Parameter(name) => f.write_str(name),
            Condition::Literal(value) => write!(f, "{value}"),
        }
    }
}
