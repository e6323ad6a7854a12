//! Scope policies and what they let references bind to.

use grammarkit::hir::{QualifiedScopeComputation, Workspace, codes};
use grammarkit::{CancellationToken, DocumentUri};
use rstest::rstest;

use crate::helpers::grammars::domainmodel;

const SHOP: &str = "package shop { datatype Money entity Item { price: Money } }";
const ORDERS: &str = "entity Order { item: shop.Item total: shop.Money }";

fn build(workspace: &mut Workspace, files: &[(&str, &str)]) {
    for (uri, text) in files {
        workspace.set_document(*uri, *text);
    }
    workspace.build(&CancellationToken::new()).unwrap();
}

#[test]
fn test_default_policy_exports_simple_names() {
    let mut workspace = Workspace::new(domainmodel());
    build(&mut workspace, &[("file:///shop.dm", SHOP)]);
    let names: Vec<_> = workspace
        .index()
        .all_exports()
        .into_iter()
        .map(|description| description.name)
        .collect();
    assert_eq!(names, vec!["shop", "Money", "Item", "price"]);
}

#[test]
fn test_qualified_policy_exports_qualified_names() {
    let mut workspace =
        Workspace::new(domainmodel()).with_scope_computation(QualifiedScopeComputation);
    build(&mut workspace, &[("file:///shop.dm", SHOP)]);
    let names: Vec<_> = workspace
        .index()
        .all_exports()
        .into_iter()
        .map(|description| description.name)
        .collect();
    assert_eq!(names, vec!["shop", "shop.Money", "shop.Item", "shop.Item.price"]);
}

#[rstest]
#[case::default_policy(false, 2)]
#[case::qualified_policy(true, 0)]
fn test_qualified_cross_document_references(#[case] qualified: bool, #[case] unresolved: usize) {
    let mut workspace = Workspace::new(domainmodel());
    if qualified {
        workspace = workspace.with_scope_computation(QualifiedScopeComputation);
    }
    build(
        &mut workspace,
        &[("file:///shop.dm", SHOP), ("file:///orders.dm", ORDERS)],
    );
    let diagnostics = workspace.diagnostics(&DocumentUri::new("file:///orders.dm"));
    assert_eq!(diagnostics.len(), unresolved, "{diagnostics:?}");
    assert!(
        diagnostics
            .iter()
            .all(|diagnostic| diagnostic.code.as_deref() == Some(codes::UNRESOLVED_REFERENCE))
    );
}

#[test]
fn test_nested_package_members_visible_by_relative_name() {
    let source = "package outer { package inner { entity X {} } entity Y extends inner.X {} }";
    let mut workspace =
        Workspace::new(domainmodel()).with_scope_computation(QualifiedScopeComputation);
    build(&mut workspace, &[("file:///nested.dm", source)]);
    let document = workspace.document(&DocumentUri::new("file:///nested.dm")).unwrap();
    assert!(document.diagnostics().is_empty(), "{:?}", document.diagnostics());
    let (_, link) = document.links().next().unwrap();
    assert_eq!(link.target().unwrap().name, "inner.X");
    assert_eq!(link.target().unwrap().path, "/elements@0/elements@0/elements@0");
}

#[test]
fn test_inner_declaration_shadows_outer() {
    let source = "entity Item {} package shop { entity Item {} entity Cart { items: Item } }";
    let mut workspace = Workspace::new(domainmodel());
    build(&mut workspace, &[("file:///shadow.dm", source)]);
    let document = workspace.document(&DocumentUri::new("file:///shadow.dm")).unwrap();
    let (_, link) = document.links().next().unwrap();
    assert_eq!(link.target().unwrap().path, "/elements@1/elements@0");
}

#[test]
fn test_reference_type_filters_candidates() {
    // The feature `Order` is nearer than the entity but is not a type.
    let source = "entity Holder { Order: Order } entity Order {}";
    let mut workspace = Workspace::new(domainmodel());
    build(&mut workspace, &[("file:///types.dm", source)]);
    let document = workspace.document(&DocumentUri::new("file:///types.dm")).unwrap();
    assert!(document.diagnostics().is_empty(), "{:?}", document.diagnostics());
    let (_, link) = document.links().next().unwrap();
    let target = link.target().unwrap();
    assert_eq!(target.node_type, "Entity");
    assert_eq!(target.path, "/elements@1");
}
