//! Grammars loaded from JSON documents on disk.

#![cfg(feature = "json")]

use std::io::Write;

use grammarkit::grammar::{Grammar, GrammarLoadError};
use grammarkit::syntax::Value;
use grammarkit::CompiledGrammar;
use tempfile::NamedTempFile;

const ARITHMETICS: &str = r#"{
  "$type": "Grammar",
  "name": "Arithmetics",
  "rules": [
    { "$type": "ParserRule", "name": "Module", "entry": true,
      "definition": { "$type": "Group", "elements": [
        { "$type": "Keyword", "value": "module" },
        { "$type": "Assignment", "feature": "name", "operator": "=",
          "terminal": { "$type": "RuleCall", "rule": { "$refText": "ID" }, "arguments": [] } },
        { "$type": "Assignment", "feature": "statements", "operator": "+=", "cardinality": "*",
          "terminal": { "$type": "RuleCall", "rule": { "$refText": "Definition" }, "arguments": [] } }
      ] } },
    { "$type": "ParserRule", "name": "Definition",
      "definition": { "$type": "Group", "elements": [
        { "$type": "Keyword", "value": "def" },
        { "$type": "Assignment", "feature": "name", "operator": "=",
          "terminal": { "$type": "RuleCall", "rule": { "$refText": "ID" }, "arguments": [] } },
        { "$type": "Keyword", "value": ":" },
        { "$type": "Assignment", "feature": "expr", "operator": "=",
          "terminal": { "$type": "RuleCall", "rule": { "$refText": "Addition" }, "arguments": [] } },
        { "$type": "Keyword", "value": ";" }
      ] } },
    { "$type": "ParserRule", "name": "Addition",
      "inferredType": { "$type": "InferredType", "name": "Expression" },
      "definition": { "$type": "Group", "elements": [
        { "$type": "RuleCall", "rule": { "$refText": "Primary" }, "arguments": [] },
        { "$type": "Group", "cardinality": "*", "elements": [
          { "$type": "Action", "inferredType": { "$type": "InferredType", "name": "BinaryExpression" },
            "feature": "left", "operator": "=" },
          { "$type": "Assignment", "feature": "operator", "operator": "=",
            "terminal": { "$type": "Keyword", "value": "+" } },
          { "$type": "Assignment", "feature": "right", "operator": "=",
            "terminal": { "$type": "RuleCall", "rule": { "$refText": "Primary" }, "arguments": [] } }
        ] }
      ] } },
    { "$type": "ParserRule", "name": "Primary",
      "inferredType": { "$type": "InferredType", "name": "Expression" },
      "definition": { "$type": "Alternatives", "elements": [
        { "$type": "Group", "elements": [
          { "$type": "Action", "inferredType": { "$type": "InferredType", "name": "NumberLiteral" } },
          { "$type": "Assignment", "feature": "value", "operator": "=",
            "terminal": { "$type": "RuleCall", "rule": { "$refText": "INT" }, "arguments": [] } }
        ] },
        { "$type": "Group", "elements": [
          { "$type": "Action", "inferredType": { "$type": "InferredType", "name": "DefinitionRef" } },
          { "$type": "Assignment", "feature": "target", "operator": "=",
            "terminal": { "$type": "CrossReference", "type": { "$refText": "Definition" } } }
        ] }
      ] } },
    { "$type": "TerminalRule", "hidden": true, "name": "WS",
      "definition": { "$type": "RegexToken", "regex": "/\\s+/" } },
    { "$type": "TerminalRule", "name": "ID",
      "definition": { "$type": "RegexToken", "regex": "/[_a-zA-Z][\\w_]*/" } },
    { "$type": "TerminalRule", "name": "INT", "type": { "$type": "ReturnType", "name": "number" },
      "definition": { "$type": "RegexToken", "regex": "/[0-9]+/" } }
  ]
}"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn test_load_compile_and_parse_from_file() {
    let file = write_temp(ARITHMETICS);
    let grammar = Grammar::from_json_file(file.path()).unwrap();
    assert_eq!(grammar.name, "Arithmetics");
    let compiled = CompiledGrammar::from_grammar(&grammar).unwrap();

    let result = compiled.parse("module m def a: 1; def b: a + 2 + 3;");
    assert!(result.ok(), "{:?}", result.parser_errors);

    let tree = &result.ast;
    let statements = tree.children(tree.root());
    assert_eq!(statements.len(), 2);

    let a = tree.node(statements[0]);
    let literal = tree.node(a.feature("expr").unwrap().as_node().unwrap());
    assert_eq!(literal.type_name, "NumberLiteral");
    assert_eq!(literal.feature("value"), Some(&Value::Int(1)));

    // `a + 2 + 3` nests to the left.
    let b = tree.node(statements[1]);
    let outer = b.feature("expr").unwrap().as_node().unwrap();
    assert_eq!(tree.node(outer).type_name, "BinaryExpression");
    let left = tree.node(outer).feature("left").unwrap().as_node().unwrap();
    assert_eq!(tree.node(left).type_name, "BinaryExpression");
    let innermost = tree.node(left).feature("left").unwrap().as_node().unwrap();
    assert_eq!(tree.node(innermost).type_name, "DefinitionRef");

    let (_, reference) = tree.references().next().unwrap();
    assert_eq!(reference.ref_text, "a");
    assert_eq!(reference.target_type, "Definition");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Grammar::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GrammarLoadError::Io { .. }));
}

#[test]
fn test_malformed_file() {
    let file = write_temp("{ \"name\": ");
    let err = Grammar::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, GrammarLoadError::Json(_)));
}
