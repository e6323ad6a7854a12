//! JSON deserialization for serialized grammar documents.
//!
//! Grammar documents are rule trees of objects tagged with a `$type` field.
//! Links between objects are written as `{"$refText": "Name"}`:
//!
//! ```json
//! { "$type": "ParserRule", "name": "Greeting", "entry": true,
//!   "definition": { "$type": "Group", "elements": [
//!     { "$type": "Keyword", "value": "hello" },
//!     { "$type": "Assignment", "feature": "name", "operator": "=",
//!       "terminal": { "$type": "RuleCall", "rule": { "$refText": "ID" } } } ] } }
//! ```
//!
//! The raw structures below mirror that format with plain strings and are
//! converted into the grammar model afterwards. Fields the model has no use
//! for (`hiddenTokens`, `wildcard`, ...) are ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

use super::types::*;

/// Error while loading a grammar document.
#[derive(Debug, Error)]
pub enum GrammarLoadError {
    #[error("invalid grammar JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read grammar file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown assignment operator `{0}`")]
    UnknownOperator(String),
    #[error("unknown cardinality `{0}`")]
    UnknownCardinality(String),
}

impl Grammar {
    /// Parse a grammar from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, GrammarLoadError> {
        let raw: RawGrammar = serde_json::from_str(json)?;
        let grammar = Grammar::try_from(raw)?;
        tracing::debug!(
            grammar = %grammar.name,
            rules = grammar.rules.len(),
            "loaded grammar from JSON"
        );
        Ok(grammar)
    }

    /// Read and parse a grammar JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GrammarLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GrammarLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

// ============================================================================
// RAW FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
struct RefText {
    #[serde(rename = "$refText")]
    ref_text: String,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawGrammar {
    name: String,
    #[serde(default)]
    rules: Vec<RawRule>,
    #[serde(default)]
    types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$type")]
enum RawRule {
    ParserRule {
        name: String,
        #[serde(default)]
        entry: bool,
        #[serde(default)]
        fragment: bool,
        #[serde(default, rename = "dataType")]
        data_type: Option<String>,
        #[serde(default, rename = "inferredType")]
        inferred_type: Option<Named>,
        /// `returns Type`
        #[serde(default, rename = "type")]
        return_type: Option<RefText>,
        #[serde(default)]
        parameters: Vec<Named>,
        definition: RawElement,
    },
    TerminalRule {
        name: String,
        #[serde(default)]
        hidden: bool,
        #[serde(default)]
        fragment: bool,
        #[serde(default, rename = "type")]
        return_type: Option<Named>,
        definition: RawTerminal,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$type")]
enum RawTerminal {
    RegexToken { regex: String },
}

/// `type X = A | B;` in either of the two published layouts.
#[derive(Debug, Deserialize)]
struct RawType {
    name: String,
    #[serde(default, rename = "typeAlternatives")]
    type_alternatives: Vec<RawAtomType>,
    #[serde(default, rename = "type")]
    union: Option<RawUnion>,
}

#[derive(Debug, Deserialize)]
struct RawAtomType {
    #[serde(default, rename = "refType")]
    ref_type: Option<RefText>,
}

#[derive(Debug, Deserialize)]
struct RawUnion {
    #[serde(default)]
    types: Vec<RawSimpleType>,
}

#[derive(Debug, Deserialize)]
struct RawSimpleType {
    #[serde(default, rename = "typeRef")]
    type_ref: Option<RefText>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(flatten)]
    kind: RawElementKind,
    #[serde(default)]
    cardinality: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$type")]
enum RawElementKind {
    Keyword {
        value: String,
    },
    Assignment {
        feature: String,
        operator: String,
        terminal: Box<RawElement>,
    },
    Group {
        elements: Vec<RawElement>,
        #[serde(default, rename = "guardCondition")]
        guard_condition: Option<RawCondition>,
    },
    Alternatives {
        elements: Vec<RawElement>,
    },
    UnorderedGroup {
        elements: Vec<RawElement>,
    },
    CrossReference {
        #[serde(rename = "type")]
        target_type: RefText,
        #[serde(default)]
        terminal: Option<Box<RawElement>>,
    },
    RuleCall {
        rule: RefText,
        #[serde(default)]
        arguments: Vec<RawNamedArgument>,
    },
    Action {
        #[serde(default, rename = "type")]
        declared_type: Option<RefText>,
        #[serde(default, rename = "inferredType")]
        inferred_type: Option<Named>,
        #[serde(default)]
        feature: Option<String>,
        #[serde(default)]
        operator: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RawNamedArgument {
    #[serde(default)]
    parameter: Option<RefText>,
    value: RawCondition,
    #[serde(default, rename = "calledByName")]
    called_by_name: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$type")]
enum RawCondition {
    Disjunction {
        left: Box<RawCondition>,
        right: Box<RawCondition>,
    },
    Conjunction {
        left: Box<RawCondition>,
        right: Box<RawCondition>,
    },
    Negation {
        value: Box<RawCondition>,
    },
    ParameterReference {
        parameter: RefText,
    },
    LiteralCondition {
        #[serde(rename = "true")]
        value: bool,
    },
}

// ============================================================================
// CONVERSION
// ============================================================================

impl TryFrom<RawGrammar> for Grammar {
    type Error = GrammarLoadError;

    fn try_from(raw: RawGrammar) -> Result<Self, Self::Error> {
        let rules = raw
            .rules
            .into_iter()
            .map(GrammarRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let types = raw.types.into_iter().map(TypeDeclaration::from).collect();
        Ok(Grammar {
            name: raw.name.into(),
            rules,
            types,
        })
    }
}

impl TryFrom<RawRule> for GrammarRule {
    type Error = GrammarLoadError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Ok(match raw {
            RawRule::ParserRule {
                name,
                entry,
                fragment,
                data_type,
                inferred_type,
                return_type,
                parameters,
                definition,
            } => GrammarRule::Parser(ParserRule {
                name: name.into(),
                entry,
                fragment,
                data_type: data_type.map(Into::into),
                infers: inferred_type
                    .map(|named| SmolStr::new(named.name))
                    .or_else(|| return_type.map(|r| SmolStr::new(r.ref_text))),
                parameters: parameters.into_iter().map(|p| p.name.into()).collect(),
                definition: Element::try_from(definition)?,
            }),
            RawRule::TerminalRule {
                name,
                hidden,
                fragment,
                return_type,
                definition: RawTerminal::RegexToken { regex },
            } => GrammarRule::Terminal(TerminalRule {
                name: name.into(),
                pattern: strip_regex_delimiters(&regex).to_string(),
                hidden,
                fragment,
                returns: return_type.map(|named| named.name.into()),
            }),
        })
    }
}

impl From<RawType> for TypeDeclaration {
    fn from(raw: RawType) -> Self {
        let mut alternatives: Vec<SmolStr> = raw
            .type_alternatives
            .into_iter()
            .filter_map(|atom| atom.ref_type)
            .map(|r| r.ref_text.into())
            .collect();
        if let Some(union) = raw.union {
            alternatives.extend(
                union
                    .types
                    .into_iter()
                    .filter_map(|simple| simple.type_ref)
                    .map(|r| SmolStr::new(r.ref_text)),
            );
        }
        TypeDeclaration {
            name: raw.name.into(),
            alternatives,
        }
    }
}

impl TryFrom<RawElement> for Element {
    type Error = GrammarLoadError;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let cardinality = match raw.cardinality {
            Some(marker) => Some(
                Cardinality::from_marker(&marker)
                    .ok_or(GrammarLoadError::UnknownCardinality(marker))?,
            ),
            None => None,
        };
        let kind = match raw.kind {
            RawElementKind::Keyword { value } => ElementKind::Keyword(Keyword {
                value: value.into(),
            }),
            RawElementKind::Assignment {
                feature,
                operator,
                terminal,
            } => ElementKind::Assignment(Assignment {
                feature: feature.into(),
                operator: parse_operator(operator)?,
                terminal: Box::new(Element::try_from(*terminal)?),
            }),
            RawElementKind::Group {
                elements,
                guard_condition,
            } => ElementKind::Group(Group {
                elements: convert_elements(elements)?,
                guard: guard_condition.map(Condition::from),
            }),
            RawElementKind::Alternatives { elements } => {
                ElementKind::Alternatives(convert_elements(elements)?)
            }
            RawElementKind::UnorderedGroup { elements } => {
                ElementKind::UnorderedGroup(convert_elements(elements)?)
            }
            RawElementKind::CrossReference {
                target_type,
                terminal,
            } => ElementKind::CrossReference(CrossReference {
                target_type: target_type.ref_text.into(),
                terminal: match terminal {
                    Some(terminal) => Some(Box::new(Element::try_from(*terminal)?)),
                    None => None,
                },
            }),
            RawElementKind::RuleCall { rule, arguments } => ElementKind::RuleCall(RuleCall {
                rule: rule.ref_text.into(),
                arguments: arguments
                    .into_iter()
                    .map(|arg| NamedArgument {
                        parameter: arg
                            .parameter
                            .filter(|_| arg.called_by_name)
                            .map(|p| p.ref_text.into()),
                        value: Condition::from(arg.value),
                    })
                    .collect(),
            }),
            RawElementKind::Action {
                declared_type,
                inferred_type,
                feature,
                operator,
            } => ElementKind::Action(Action {
                type_name: inferred_type
                    .map(|named| SmolStr::new(named.name))
                    .or_else(|| declared_type.map(|r| SmolStr::new(r.ref_text)))
                    .unwrap_or_default(),
                feature: feature.map(Into::into),
                operator: operator.map(parse_operator).transpose()?,
            }),
        };
        Ok(Element { kind, cardinality })
    }
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        match raw {
            RawCondition::Disjunction { left, right } => {
                Condition::from(*left).or(Condition::from(*right))
            }
            RawCondition::Conjunction { left, right } => {
                Condition::from(*left).and(Condition::from(*right))
            }
            RawCondition::Negation { value } => !Condition::from(*value),
            RawCondition::ParameterReference { parameter } => {
                Condition::Parameter(parameter.ref_text.into())
            }
            RawCondition::LiteralCondition { value } => Condition::Literal(value),
        }
    }
}

fn convert_elements(elements: Vec<RawElement>) -> Result<Vec<Element>, GrammarLoadError> {
    elements.into_iter().map(Element::try_from).collect()
}

fn parse_operator(operator: String) -> Result<AssignOp, GrammarLoadError> {
    AssignOp::from_operator(&operator).ok_or(GrammarLoadError::UnknownOperator(operator))
}

/// Regexes may be written in literal form (`/\s+/`).
fn strip_regex_delimiters(regex: &str) -> &str {
    if regex.len() >= 2 && regex.starts_with('/') && regex.ends_with('/') {
        &regex[1..regex.len() - 1]
    } else {
        regex
    }
}
