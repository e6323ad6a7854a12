//! Grammar compilation through the public API.

use grammarkit::grammar::builder::*;
use grammarkit::grammar::{Grammar, ParserRule};
use grammarkit::parser::{GrammarCompileError, RuleKind, TokenRegistry, compile};
use rstest::rstest;

use crate::helpers::grammars::{domainmodel, domainmodel_grammar, statemachine};

#[test]
fn test_domainmodel_procedures() {
    let grammar = domainmodel();
    let names: Vec<_> = grammar.procedures().map(|p| p.name.as_str()).collect();
    for rule in [
        "Domainmodel",
        "AbstractElement",
        "PackageDeclaration",
        "Type",
        "DataType",
        "Entity",
        "Feature",
        "QualifiedName",
    ] {
        assert!(names.contains(&rule), "missing procedure for {rule}");
    }
    assert_eq!(grammar.procedure_by_id(grammar.entry()).unwrap().name, "Domainmodel");
    assert!(matches!(
        grammar.procedure("QualifiedName").unwrap().kind,
        RuleKind::DataType { .. }
    ));
    assert!(matches!(
        &grammar.procedure("Entity").unwrap().kind,
        RuleKind::Node { type_name } if type_name == "Entity"
    ));
}

#[test]
fn test_unreachable_rules_are_not_compiled() {
    let grammar = domainmodel_grammar().with_rule(ParserRule::new(
        "Orphan",
        group([keyword("orphan"), assign("name", call("ID"))]),
    ));
    let registry = TokenRegistry::from_grammar(&grammar).unwrap();
    let compiled = compile(&grammar, &registry).unwrap();
    assert!(compiled.procedure("Orphan").is_none());
}

#[rstest]
#[case("Entity", "Type", true)]
#[case("DataType", "Type", true)]
#[case("Entity", "AbstractElement", true)]
#[case("PackageDeclaration", "AbstractElement", true)]
#[case("PackageDeclaration", "Type", false)]
#[case("Type", "Entity", false)]
#[case("Feature", "Feature", true)]
fn test_domainmodel_reflection(#[case] sub: &str, #[case] sup: &str, #[case] expected: bool) {
    assert_eq!(domainmodel().reflection().is_subtype(sub, sup), expected);
}

#[test]
fn test_statemachine_keywords_are_registered() {
    let grammar = statemachine();
    let tokens = grammar.tokens();
    for keyword in ["statemachine", "events", "commands", "initialState", "state", "=>", "end"] {
        assert!(tokens.keyword(keyword).is_some(), "missing keyword {keyword}");
    }
}

#[test]
fn test_cross_reference_to_unknown_type() {
    let grammar = Grammar::new("G")
        .with_rule(
            ParserRule::new(
                "Start",
                group([assign("name", call("ID")), assign("target", cross_ref("Ghost"))]),
            )
            .entry(),
        )
        .with_common_terminals();
    let err = grammarkit::CompiledGrammar::from_grammar(&grammar).unwrap_err();
    assert!(matches!(
        err,
        GrammarCompileError::UnresolvedType { ref type_name, .. } if type_name == "Ghost"
    ));
    assert!(err.path().is_some());
}
