//! Workspace builds over several documents.

use grammarkit::hir::{DocumentState, LinkState, Workspace};
use grammarkit::{CancellationToken, DocumentUri, WorkspaceConfig};
use rstest::rstest;

use crate::helpers::grammars::{domainmodel, statemachine};
use crate::helpers::workspace_helpers::workspace_from_sources;

fn uri(value: &str) -> DocumentUri {
    DocumentUri::new(value)
}

/// `count` documents where every entity extends the one in the previous
/// document.
fn chain(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            let text = if i == 0 {
                "entity E0 {}".to_string()
            } else {
                format!("entity E{i} extends E{} {{ next: E{i} }}", i - 1)
            };
            (format!("file:///chain/{i:02}.dm"), text)
        })
        .collect()
}

fn build_chain(parallel: bool, count: usize) -> Workspace {
    let mut workspace = Workspace::new(domainmodel())
        .with_config(WorkspaceConfig::default().with_parallel(parallel));
    for (uri, text) in chain(count) {
        workspace.set_document(uri, text);
    }
    workspace.build(&CancellationToken::new()).unwrap();
    workspace
}

#[test]
fn test_statemachine_links_within_document() {
    let source = "statemachine S events go commands ring initialState A \
                  state A actions { ring } go => B end state B go => A end";
    let workspace = workspace_from_sources(statemachine(), &[("file:///s.sm", source)]);
    let document = workspace.document(&uri("file:///s.sm")).unwrap();
    assert_eq!(document.state(), DocumentState::Validated);

    let targets: Vec<_> = document
        .links()
        .map(|(_, link)| link.target().unwrap().name.as_str())
        .collect();
    assert_eq!(targets, vec!["A", "ring", "go", "B", "go", "A"]);

    let init = document.links().next().unwrap().1.target().unwrap();
    assert_eq!(init.node_type, "State");
    assert_eq!(init.path, "/states@0");
}

#[rstest]
#[case::sequential(false)]
#[case::parallel(true)]
fn test_chain_resolves(#[case] parallel: bool) {
    let workspace = build_chain(parallel, 12);
    assert_eq!(workspace.document_count(), 12);
    for document in workspace.documents() {
        assert_eq!(document.state(), DocumentState::Validated);
        assert!(document.diagnostics().is_empty(), "{:?}", document.diagnostics());
    }
    let last = workspace.document(&uri("file:///chain/11.dm")).unwrap();
    assert!(last.links_into(&uri("file:///chain/10.dm")));
}

#[test]
fn test_parallel_build_matches_sequential() {
    let sequential = build_chain(false, 16);
    let parallel = build_chain(true, 16);
    assert_eq!(sequential.index().all_exports(), parallel.index().all_exports());
    for uri in sequential.index().uris() {
        let left = sequential.index().entry(&uri).unwrap();
        let right = parallel.index().entry(&uri).unwrap();
        assert_eq!(left.references, right.references, "edges of {uri}");
    }
}

#[test]
fn test_update_relinks_only_dependents() {
    let mut workspace = workspace_from_sources(
        domainmodel(),
        &[
            ("file:///base.dm", "entity Base {}"),
            ("file:///user.dm", "entity User extends Base {}"),
            ("file:///other.dm", "entity Other {}"),
        ],
    );
    let cancel = CancellationToken::new();

    let report = workspace
        .update(
            [(uri("file:///base.dm"), "entity Base { id: Base }".to_string())],
            Vec::<DocumentUri>::new(),
            &cancel,
        )
        .unwrap();
    assert_eq!(report.indexed, vec![uri("file:///base.dm")]);
    assert_eq!(report.relinked, vec![uri("file:///user.dm")]);
    assert!(report.removed.is_empty());

    let report = workspace
        .update(
            Vec::<(DocumentUri, String)>::new(),
            [uri("file:///base.dm")],
            &cancel,
        )
        .unwrap();
    assert_eq!(report.removed, vec![uri("file:///base.dm")]);
    assert_eq!(report.relinked, vec![uri("file:///user.dm")]);
    let user = workspace.document(&uri("file:///user.dm")).unwrap();
    assert!(matches!(
        user.links().next().unwrap().1,
        LinkState::Error(error) if error.ref_text == "Base"
    ));
    assert!(workspace.diagnostics(&uri("file:///other.dm")).is_empty());
}

#[test]
fn test_build_without_edits_is_empty() {
    let mut workspace =
        workspace_from_sources(domainmodel(), &[("file:///a.dm", "entity A {}")]);
    assert!(!workspace.is_dirty());
    let report = workspace.build(&CancellationToken::new()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_removing_unknown_document() {
    let mut workspace = Workspace::new(domainmodel());
    assert!(!workspace.remove_document(&uri("file:///ghost.dm")));

    workspace.set_document("file:///new.dm", "entity New {}");
    assert!(workspace.remove_document(&uri("file:///new.dm")));
    assert!(!workspace.is_dirty());
}

#[test]
fn test_reference_edges_in_index() {
    let workspace = workspace_from_sources(
        domainmodel(),
        &[
            ("file:///a.dm", "entity A {} entity B extends A {}"),
            ("file:///c.dm", "entity C extends A { a: A }"),
        ],
    );
    let referencing = workspace.index().documents_referencing(&uri("file:///a.dm"));
    assert_eq!(referencing.len(), 1);
    assert!(referencing.contains(&uri("file:///c.dm")));

    let edges = workspace.index().find_references(&uri("file:///a.dm"), "/elements@0");
    let sources: Vec<_> = edges
        .iter()
        .map(|edge| (edge.source_uri.as_str(), edge.local))
        .collect();
    assert_eq!(
        sources,
        vec![("file:///a.dm", true), ("file:///c.dm", false), ("file:///c.dm", false)]
    );
}
