//! Rename: declaration, references and qualified names.

use grammarkit::hir::{QualifiedScopeComputation, Workspace};
use grammarkit::ide::{self, RenameError, TextEdit, WorkspaceEdit};
use grammarkit::{CancellationToken, DocumentUri, TextRange, TextSize};
use rstest::rstest;

use crate::helpers::grammars::domainmodel;
use crate::helpers::workspace_helpers::{offset_of, workspace_from_sources};

const SHOP: &str = "package shop { entity Item {} entity Cart { items: Item } }";
const ORDERS: &str = "entity Order { item: shop.Item cart: shop . Cart }";

fn qualified_workspace(files: &[(&str, &str)]) -> Workspace {
    let mut workspace =
        Workspace::new(domainmodel()).with_scope_computation(QualifiedScopeComputation);
    for (uri, text) in files {
        workspace.set_document(*uri, *text);
    }
    workspace.build(&CancellationToken::new()).unwrap();
    for (uri, _) in files {
        let diagnostics = workspace.diagnostics(&DocumentUri::new(uri));
        assert!(diagnostics.is_empty(), "{uri}: {diagnostics:?}");
    }
    workspace
}

/// Every document of the workspace with `edit` applied.
fn apply(workspace: &Workspace, edit: &WorkspaceEdit) -> Vec<(String, String)> {
    workspace
        .documents()
        .map(|document| {
            let text = ide::apply_edits(document.text(), edit.edits_for(document.uri())).unwrap();
            (document.uri().to_string(), text)
        })
        .collect()
}

fn text_of<'a>(texts: &'a [(String, String)], uri: &str) -> &'a str {
    &texts.iter().find(|(u, _)| u == uri).unwrap().1
}

#[test]
fn test_rename_package_rewrites_qualifiers() {
    let workspace =
        qualified_workspace(&[("file:///shop.dm", SHOP), ("file:///orders.dm", ORDERS)]);
    let shop = DocumentUri::new("file:///shop.dm");
    let edit = ide::rename(&workspace, &shop, offset_of(SHOP, "shop", 0, 0), "store").unwrap();
    assert_eq!(edit.edit_count(), 3);

    let texts = apply(&workspace, &edit);
    assert_eq!(
        text_of(&texts, "file:///shop.dm"),
        "package store { entity Item {} entity Cart { items: Item } }"
    );
    assert_eq!(
        text_of(&texts, "file:///orders.dm"),
        "entity Order { item: store.Item cart: store . Cart }"
    );
}

#[test]
fn test_rename_from_reference_site() {
    let workspace =
        qualified_workspace(&[("file:///shop.dm", SHOP), ("file:///orders.dm", ORDERS)]);
    let orders = DocumentUri::new("file:///orders.dm");
    let edit =
        ide::rename(&workspace, &orders, offset_of(ORDERS, "Item", 0, 1), "Product").unwrap();

    let texts = apply(&workspace, &edit);
    assert_eq!(
        text_of(&texts, "file:///shop.dm"),
        "package shop { entity Product {} entity Cart { items: Product } }"
    );
    assert_eq!(
        text_of(&texts, "file:///orders.dm"),
        "entity Order { item: shop.Product cart: shop . Cart }"
    );
}

#[rstest]
#[case::outer_package("package A", 8, "package X { entity A {} } entity B extends X.A {}")]
#[case::inner_entity("entity A", 7, "package A { entity X {} } entity B extends A.X {}")]
fn test_rename_edits_the_segment_naming_the_target(
    #[case] anchor: &str,
    #[case] delta: u32,
    #[case] expected: &str,
) {
    let source = "package A { entity A {} } entity B extends A.A {}";
    let workspace = qualified_workspace(&[("file:///same.dm", source)]);
    let uri = DocumentUri::new("file:///same.dm");
    let edit = ide::rename(&workspace, &uri, offset_of(source, anchor, 0, delta), "X").unwrap();
    let texts = apply(&workspace, &edit);
    assert_eq!(text_of(&texts, "file:///same.dm"), expected);
}

#[test]
fn test_renamed_workspace_still_links() {
    let mut workspace =
        qualified_workspace(&[("file:///shop.dm", SHOP), ("file:///orders.dm", ORDERS)]);
    let shop = DocumentUri::new("file:///shop.dm");
    let edit = ide::rename(&workspace, &shop, offset_of(SHOP, "Cart", 0, 0), "Basket").unwrap();
    let texts = apply(&workspace, &edit);

    let changed: Vec<_> = texts
        .into_iter()
        .map(|(uri, text)| (DocumentUri::new(uri), text))
        .collect();
    workspace
        .update(changed, Vec::<DocumentUri>::new(), &CancellationToken::new())
        .unwrap();
    for document in workspace.documents() {
        assert!(document.diagnostics().is_empty(), "{:?}", document.diagnostics());
    }
    let orders = workspace.document(&DocumentUri::new("file:///orders.dm")).unwrap();
    assert_eq!(orders.text(), "entity Order { item: shop.Item cart: shop . Basket }");
}

const DECLARES: &str = "entity Foo { x: Foo y: Foo }\nentity Bar extends Foo {}";
const USES: &str = "entity Baz extends Foo { z: Foo }";

#[rstest]
#[case::one_document(&[("file:///a.dm", DECLARES)], &[4])]
#[case::two_documents(&[("file:///a.dm", DECLARES), ("file:///b.dm", USES)], &[4, 2])]
fn test_rename_edits_every_reference_once(
    #[case] files: &[(&str, &str)],
    #[case] per_document: &[usize],
) {
    let workspace = workspace_from_sources(domainmodel(), files);
    let uri = DocumentUri::new("file:///a.dm");
    let edit = ide::rename(&workspace, &uri, offset_of(DECLARES, "Foo", 0, 0), "Qux").unwrap();
    assert_eq!(edit.edit_count(), per_document.iter().sum::<usize>());
    for ((file, text), expected) in files.iter().zip(per_document) {
        let edits = edit.edits_for(&DocumentUri::new(*file));
        assert_eq!(edits.len(), *expected, "{file}");
        let renamed = ide::apply_edits(text, edits).unwrap();
        assert_eq!(renamed, text.replace("Foo", "Qux"));
    }
}

#[rstest]
#[case::one_document(&[("file:///a.dm", DECLARES)])]
#[case::two_documents(&[("file:///a.dm", DECLARES), ("file:///b.dm", USES)])]
fn test_rename_to_same_name_changes_nothing(#[case] files: &[(&str, &str)]) {
    let workspace = workspace_from_sources(domainmodel(), files);
    let uri = DocumentUri::new("file:///a.dm");
    let edit = ide::rename(&workspace, &uri, offset_of(DECLARES, "Foo", 0, 0), "Foo").unwrap();
    assert!(!edit.is_empty());
    for (file, text) in apply(&workspace, &edit) {
        let original = files.iter().find(|(uri, _)| *uri == file).unwrap().1;
        assert_eq!(text, original, "{file}");
    }
}

#[test]
fn test_rename_errors() {
    let workspace = qualified_workspace(&[("file:///shop.dm", SHOP)]);
    let shop = DocumentUri::new("file:///shop.dm");
    let on_name = offset_of(SHOP, "Item", 0, 0);

    assert_eq!(
        ide::rename(&workspace, &shop, on_name, "1st"),
        Err(RenameError::InvalidIdentifier("1st".to_string()))
    );
    assert_eq!(
        ide::rename(&workspace, &shop, on_name, "a.b"),
        Err(RenameError::InvalidIdentifier("a.b".to_string()))
    );
    assert_eq!(
        ide::rename(&workspace, &shop, TextSize::from(1), "Valid"),
        Err(RenameError::NoTarget)
    );
    assert_eq!(
        ide::rename(&workspace, &DocumentUri::new("file:///absent.dm"), on_name, "Valid"),
        Err(RenameError::NoTarget)
    );
}

#[test]
fn test_apply_edits_rejects_overlap() {
    let edits = [
        TextEdit::replace(TextRange::new(0.into(), 4.into()), "x"),
        TextEdit::replace(TextRange::new(2.into(), 6.into()), "y"),
    ];
    assert!(ide::apply_edits("abcdefgh", &edits).is_err());
}
