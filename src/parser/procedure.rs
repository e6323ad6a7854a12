//! Compiled parsing procedures.
//!
//! A procedure is a tree of [`Op`]s interpreted by the engine. Ops carry the
//! site index allocated by the compiler plus the metadata the engine needs to
//! build the AST (which feature a token is assigned to, whether it is a
//! cross-reference). Procedures are a pure function of the grammar; only
//! the argument bag passed at call time varies.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::grammar::{AssignOp, Condition};

use super::tokens::TokenId;

/// Index of a compiled parser rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u32);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Call-time parameter values of a rule invocation.
pub type Args = FxHashMap<SmolStr, bool>;

/// What a rule produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// An AST node of the given type.
    Node { type_name: SmolStr },
    /// The concatenated token text, optionally typed (`returns number`).
    DataType { data_type: Option<SmolStr> },
    /// Features contributed to the caller's node.
    Fragment,
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub id: RuleId,
    pub name: SmolStr,
    pub kind: RuleKind,
    pub parameters: Vec<SmolStr>,
    pub body: Op,
    /// Number of sites allocated per category.
    pub sites: SiteCounts,
}

/// Site totals of one compiled rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteCounts {
    pub consume: u32,
    pub subrule: u32,
    pub optional: u32,
    pub many: u32,
    pub alternatives: u32,
}

/// Assignment target of a consumed token or subrule result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignTarget {
    pub feature: SmolStr,
    pub operator: AssignOp,
}

/// Grammar context of a consume or subrule site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub assignment: Option<AssignTarget>,
    /// Target type when the site parses cross-reference text.
    pub cross_ref: Option<SmolStr>,
}

/// An argument passed to a parameterised rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArgument {
    pub parameter: SmolStr,
    pub value: Condition,
}

#[derive(Debug, Clone)]
pub struct Branch {
    pub gate: Option<Condition>,
    pub body: Op,
}

#[derive(Debug, Clone)]
pub struct UnorderedBranch {
    /// The branch's own guard; replaces the "not fired yet" gate.
    pub guard: Option<Condition>,
    /// Whether the branch must fire once before the group ends.
    pub mandatory: bool,
    pub body: Op,
}

#[derive(Debug, Clone)]
pub enum Op {
    Consume {
        site: u32,
        token: TokenId,
        origin: Origin,
    },
    Subrule {
        site: u32,
        rule: RuleId,
        arguments: Vec<CompiledArgument>,
        origin: Origin,
    },
    Action {
        type_name: SmolStr,
        assignment: Option<AssignTarget>,
    },
    Sequence(Vec<Op>),
    Alternatives {
        site: u32,
        branches: Vec<Branch>,
    },
    UnorderedGroup {
        alternatives_site: u32,
        many_site: u32,
        branches: Vec<UnorderedBranch>,
    },
    Optional {
        site: u32,
        gate: Option<Condition>,
        body: Box<Op>,
    },
    Many {
        site: u32,
        gate: Option<Condition>,
        body: Box<Op>,
    },
    AtLeastOne {
        site: u32,
        body: Box<Op>,
    },
    /// Matches nothing.
    Empty,
}

/// Evaluate a guard or argument condition against an argument bag.
///
/// Parameters missing from the bag are `false`.
pub fn evaluate(condition: &Condition, args: &Args) -> bool {
    match condition {
        Condition::Or(left, right) => evaluate(left, args) || evaluate(right, args),
        Condition::And(left, right) => evaluate(left, args) && evaluate(right, args),
        Condition::Not(inner) => !evaluate(inner, args),
        Condition::Parameter(name) => args.get(name).copied().unwrap_or(false),
        Condition::Literal(value) => *value,
    }
}

/// Evaluate an optional gate; no gate always passes.
pub fn gate_passes(gate: Option<&Condition>, args: &Args) -> bool {
    gate.is_none_or(|condition| evaluate(condition, args))
}

/// Bind the callee's parameters from the caller's arguments.
pub fn bind_arguments(arguments: &[CompiledArgument], caller: &Args) -> Args {
    arguments
        .iter()
        .map(|arg| (arg.parameter.clone(), evaluate(&arg.value, caller)))
        .collect()
}
