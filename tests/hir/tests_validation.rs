//! Diagnostics: recorded problems plus registered checks.

use grammarkit::hir::{ValidationRegistry, Workspace, codes};
use grammarkit::parser::Severity;
use grammarkit::{CancellationToken, DocumentUri, OperationCancelled, WorkspaceConfig};

use crate::helpers::grammars::domainmodel;

fn lowercase_type_names() -> ValidationRegistry {
    let mut registry = ValidationRegistry::new();
    registry.register("Type", |document, node, accept| {
        let tree = document.ast();
        let Some(name) = tree.node(node).string("name") else {
            return;
        };
        if name.starts_with(|c: char| c.is_lowercase()) {
            let range = tree.node(node).feature_range("name").unwrap();
            accept.warning(format!("type '{name}' should start with a capital"), range);
        }
    });
    registry
}

#[test]
fn test_diagnostic_order() {
    let source = "datatype string entity item extends Missing {} §";
    let mut workspace = Workspace::new(domainmodel()).with_validations(lowercase_type_names());
    workspace.set_document("file:///a.dm", source);
    workspace.build(&CancellationToken::new()).unwrap();

    let diagnostics = workspace.diagnostics(&DocumentUri::new("file:///a.dm"));
    let summary: Vec<_> = diagnostics
        .iter()
        .map(|diagnostic| (diagnostic.severity, diagnostic.code.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Severity::Error, Some("E0101")),
            (Severity::Error, Some(codes::UNRESOLVED_REFERENCE)),
            (Severity::Warning, None),
            (Severity::Warning, None),
        ]
    );
    assert_eq!(&source[diagnostics[1].range], "Missing");
    assert_eq!(&source[diagnostics[2].range], "string");
    assert_eq!(&source[diagnostics[3].range], "item");
    assert!(diagnostics[1].to_string().starts_with("error[E0301]"));
}

#[test]
fn test_checks_skip_unrelated_types() {
    let mut workspace = Workspace::new(domainmodel()).with_validations(lowercase_type_names());
    workspace.set_document("file:///a.dm", "package lower { entity Upper { field: Upper } }");
    workspace.build(&CancellationToken::new()).unwrap();
    assert!(workspace.diagnostics(&DocumentUri::new("file:///a.dm")).is_empty());
}

#[test]
fn test_cancelled_during_validation_keeps_previous_state() {
    let mut workspace = Workspace::new(domainmodel())
        .with_config(WorkspaceConfig::default().with_parallel(false));
    workspace.set_document("file:///a.dm", "entity A {}");
    workspace.build(&CancellationToken::new()).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    workspace
        .validations_mut()
        .register("Entity", move |_, _, _| trigger.cancel());

    workspace.set_document("file:///a.dm", "entity B {} entity C {}");
    assert_eq!(workspace.build(&cancel), Err(OperationCancelled));

    let uri = DocumentUri::new("file:///a.dm");
    assert_eq!(workspace.document(&uri).unwrap().text(), "entity A {}");
    let exports = workspace.index().all_exports();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].name, "A");
    assert!(workspace.is_dirty());

    workspace.build(&CancellationToken::new()).unwrap();
    assert_eq!(workspace.document(&uri).unwrap().text(), "entity B {} entity C {}");
    assert_eq!(workspace.index().all_exports().len(), 2);
}
