//! End-to-end parsing of domain models.

use grammarkit::parser::ErrorCode;
use grammarkit::syntax::Value;
use rstest::rstest;

use crate::helpers::grammars::domainmodel;

// =============================================================================
// AST SHAPE
// =============================================================================

#[test]
fn test_nested_packages_and_features() {
    let source = r#"
        package shop {
            datatype String
            entity Item {
                name: String
                many tags: String
            }
        }
    "#;
    let result = domainmodel().parse(source);
    assert!(result.ok(), "{:?}", result.parser_errors);

    let tree = &result.ast;
    let root = tree.node(tree.root());
    assert_eq!(root.type_name, "Domainmodel");

    let package = root.feature("elements").unwrap().as_list().unwrap()[0]
        .as_node()
        .unwrap();
    assert_eq!(tree.node(package).type_name, "PackageDeclaration");
    assert_eq!(tree.node(package).string("name"), Some("shop"));

    let members = tree.children(package);
    assert_eq!(members.len(), 2);
    let item = tree.node(members[1]);
    assert_eq!(item.type_name, "Entity");
    let features = tree.children(members[1]);
    assert!(!tree.node(features[0]).flag("many"));
    assert!(tree.node(features[1]).flag("many"));
    assert_eq!(tree.node(features[1]).string("name"), Some("tags"));
}

#[test]
fn test_qualified_cross_reference_text() {
    let source = "entity A extends shop . Item {}";
    let result = domainmodel().parse(source);
    assert!(result.ok(), "{:?}", result.parser_errors);

    let tree = &result.ast;
    assert_eq!(tree.reference_count(), 1);
    let (_, reference) = tree.references().next().unwrap();
    assert_eq!(reference.ref_text, "shop.Item");
    assert_eq!(reference.target_type, "Entity");
    assert_eq!(&source[reference.range], "shop . Item");
    assert_eq!(reference.container.feature, "superType");

    let entity = tree.children(tree.root())[0];
    assert!(matches!(
        tree.node(entity).feature("superType"),
        Some(Value::Reference(_))
    ));
}

#[test]
fn test_node_ranges_exclude_surrounding_trivia() {
    let source = "  entity A {}  // trailing";
    let result = domainmodel().parse(source);
    assert!(result.ok(), "{:?}", result.parser_errors);
    let tree = &result.ast;
    let entity = tree.children(tree.root())[0];
    assert_eq!(&source[tree.node(entity).range], "entity A {}");
}

// =============================================================================
// CST
// =============================================================================

#[rstest]
#[case::empty("")]
#[case::comments("/* header */ // line\n")]
#[case::valid("package p { entity A extends p.B { x: A } }")]
#[case::deleted_token("entity A { { }")]
#[case::missing_brace("entity A { entity B {}")]
#[case::trailing_garbage("entity A {} }}} ")]
#[case::lexer_error("entity A { ยง }")]
fn test_cst_is_lossless(#[case] source: &str) {
    let result = domainmodel().parse(source);
    assert_eq!(result.syntax().text().to_string(), source);
}

// =============================================================================
// RECOVERY
// =============================================================================

#[rstest]
#[case::stray_token("entity A { { }", ErrorCode::E0201)]
#[case::missing_token("entity A { x String }", ErrorCode::E0202)]
#[case::end_of_input("entity A {", ErrorCode::E0204)]
#[case::trailing_input("entity A {} }", ErrorCode::E0205)]
fn test_first_syntax_error(#[case] source: &str, #[case] expected: ErrorCode) {
    let result = domainmodel().parse(source);
    assert!(!result.ok());
    assert_eq!(result.parser_errors[0].code, expected, "{:?}", result.parser_errors);
}

#[test]
fn test_recovery_keeps_following_elements() {
    let result = domainmodel().parse("entity A extends {} entity B {}");
    assert_eq!(result.parser_errors.len(), 1, "{:?}", result.parser_errors);
    assert_eq!(result.parser_errors[0].code, ErrorCode::E0201);
    let tree = &result.ast;
    let names: Vec<_> = tree
        .children(tree.root())
        .into_iter()
        .filter_map(|node| tree.node(node).string("name"))
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_lexer_errors_are_reported_separately() {
    let result = domainmodel().parse("entity A {} ยง");
    assert_eq!(result.lexer_errors.len(), 1);
    assert_eq!(result.lexer_errors[0].code, ErrorCode::E0101);
    assert!(result.parser_errors.is_empty(), "{:?}", result.parser_errors);
    assert_eq!(result.errors().count(), 1);
}
