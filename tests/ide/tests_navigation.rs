//! Goto declaration, find references and highlights.

use grammarkit::ide::{self, HighlightKind};
use grammarkit::{DocumentUri, LineCol, TextSize};

use crate::helpers::grammars::domainmodel;
use crate::helpers::workspace_helpers::{offset_of, text_at, workspace_from_sources};

const PEOPLE: &str = "entity Person { friend: Person }\nentity Employee extends Person {}";
const STAFF: &str = "entity Manager extends Person { boss: Person }";

fn people() -> grammarkit::Workspace {
    workspace_from_sources(
        domainmodel(),
        &[("file:///people.dm", PEOPLE), ("file:///staff.dm", STAFF)],
    )
}

#[test]
fn test_goto_from_other_document() {
    let workspace = people();
    let staff = DocumentUri::new("file:///staff.dm");
    let result = ide::goto_declaration(&workspace, &staff, offset_of(STAFF, "Person", 0, 2));
    assert_eq!(result.targets.len(), 1);

    let target = &result.targets[0];
    assert_eq!(target.uri.as_str(), "file:///people.dm");
    assert_eq!(target.node_type, "Entity");
    assert_eq!(target.name.as_deref(), Some("Person"));
    assert_eq!(target.range.start(), offset_of(PEOPLE, "Person", 0, 0));
    assert_eq!(
        text_at(&workspace, "file:///people.dm", target.full_range),
        "entity Person { friend: Person }"
    );
}

#[test]
fn test_goto_on_declaration_name_stays_put() {
    let workspace = people();
    let uri = DocumentUri::new("file:///people.dm");
    let result = ide::goto_declaration(&workspace, &uri, offset_of(PEOPLE, "Employee", 0, 0));
    assert_eq!(result.targets[0].uri, uri);
    assert_eq!(text_at(&workspace, "file:///people.dm", result.targets[0].range), "Employee");
}

#[test]
fn test_goto_on_keyword_finds_nothing() {
    let workspace = people();
    let uri = DocumentUri::new("file:///people.dm");
    assert!(ide::goto_declaration(&workspace, &uri, TextSize::from(2)).is_empty());
    assert!(ide::goto_declaration(&workspace, &uri, TextSize::from(10_000)).is_empty());
}

#[test]
fn test_find_references_across_documents() {
    let workspace = people();
    let uri = DocumentUri::new("file:///people.dm");
    let offset = offset_of(PEOPLE, "Person", 0, 0);

    let result = ide::find_references(&workspace, &uri, offset, true);
    let found: Vec<_> = result
        .references
        .iter()
        .map(|location| (location.uri.as_str(), location.is_definition))
        .collect();
    assert_eq!(
        found,
        vec![
            ("file:///people.dm", true),
            ("file:///people.dm", false),
            ("file:///people.dm", false),
            ("file:///staff.dm", false),
            ("file:///staff.dm", false),
        ]
    );
    for location in &result.references {
        assert_eq!(text_at(&workspace, location.uri.as_str(), location.range), "Person");
    }

    let without = ide::find_references(&workspace, &uri, offset, false);
    assert_eq!(without.len(), 4);
    assert!(!without.include_declaration);
}

#[test]
fn test_find_references_from_reference_matches_declaration() {
    let workspace = people();
    let staff = DocumentUri::new("file:///staff.dm");
    let people = DocumentUri::new("file:///people.dm");
    let from_reference =
        ide::find_references(&workspace, &staff, offset_of(STAFF, "Person", 1, 0), true);
    let from_declaration =
        ide::find_references(&workspace, &people, offset_of(PEOPLE, "Person", 0, 0), true);
    assert_eq!(from_reference, from_declaration);
}

#[test]
fn test_unresolved_reference_has_no_target() {
    let mut workspace = people();
    let uri = DocumentUri::new("file:///broken.dm");
    let text = "entity Broken extends Nowhere {}";
    workspace.set_document(uri.clone(), text);
    workspace.build(&grammarkit::CancellationToken::new()).unwrap();

    let offset = offset_of(text, "Nowhere", 0, 0);
    assert!(ide::find_references(&workspace, &uri, offset, true).is_empty());
    assert!(ide::goto_declaration(&workspace, &uri, offset).is_empty());
    assert!(ide::highlight(&workspace, &uri, offset).is_empty());
}

#[test]
fn test_highlight_in_declaring_document() {
    let workspace = people();
    let uri = DocumentUri::new("file:///people.dm");
    let highlights = ide::highlight(&workspace, &uri, offset_of(PEOPLE, "Person", 1, 3));
    let kinds: Vec<_> = highlights.iter().map(|highlight| highlight.kind).collect();
    assert_eq!(
        kinds,
        vec![HighlightKind::Write, HighlightKind::Read, HighlightKind::Read]
    );
    let starts: Vec<_> = highlights.iter().map(|highlight| highlight.range.start()).collect();
    assert_eq!(
        starts,
        vec![
            offset_of(PEOPLE, "Person", 0, 0),
            offset_of(PEOPLE, "Person", 1, 0),
            offset_of(PEOPLE, "Person", 2, 0),
        ]
    );
}

#[test]
fn test_highlight_in_referencing_document() {
    let workspace = people();
    let uri = DocumentUri::new("file:///staff.dm");
    let highlights = ide::highlight(&workspace, &uri, offset_of(STAFF, "Person", 0, 0));
    assert_eq!(highlights.len(), 2);
    assert!(highlights.iter().all(|highlight| highlight.kind == HighlightKind::Read));
}

#[test]
fn test_editor_positions_through_line_index() {
    let workspace = people();
    let uri = DocumentUri::new("file:///people.dm");
    let document = workspace.document(&uri).unwrap();
    let line_index = document.line_index();

    // `Employee extends Person` on the second line.
    let offset = line_index.offset(LineCol::new(1, 26)).unwrap();
    let result = ide::goto_declaration(&workspace, &uri, offset);
    let target = line_index.line_range(result.targets[0].range);
    assert_eq!(target.start, LineCol::new(0, 7));
    assert_eq!(target.end, LineCol::new(0, 13));
    assert!(line_index.offset(LineCol::new(7, 0)).is_none());
}
