//! Shared grammar for the hir unit tests: a small domain-model language with
//! nested packages, entities and qualified cross-references.

use std::sync::{Arc, OnceLock};

use crate::grammar::builder::*;
use crate::grammar::{Grammar, ParserRule};
use crate::parser::{CompiledGrammar, ParserConfig};

use super::document::Document;

pub(crate) fn domainmodel_grammar() -> Grammar {
    Grammar::new("DomainModel")
        .with_rule(
            ParserRule::new("Domainmodel", append("elements", call("AbstractElement")).many())
                .entry(),
        )
        .with_rule(ParserRule::new(
            "AbstractElement",
            alternatives([call("PackageDeclaration"), call("Type")]),
        ))
        .with_rule(ParserRule::new(
            "PackageDeclaration",
            group([
                keyword("package"),
                assign("name", call("QualifiedName")),
                keyword("{"),
                append("elements", call("AbstractElement")).many(),
                keyword("}"),
            ]),
        ))
        .with_rule(ParserRule::new(
            "Type",
            alternatives([call("DataType"), call("Entity")]),
        ))
        .with_rule(ParserRule::new(
            "DataType",
            group([keyword("datatype"), assign("name", call("ID"))]),
        ))
        .with_rule(ParserRule::new(
            "Entity",
            group([
                keyword("entity"),
                assign("name", call("ID")),
                group([
                    keyword("extends"),
                    assign("superType", cross_ref_with("Entity", call("QualifiedName"))),
                ])
                .optional(),
                keyword("{"),
                append("features", call("Feature")).many(),
                keyword("}"),
            ]),
        ))
        .with_rule(ParserRule::new(
            "Feature",
            group([
                flag("many", keyword("many")).optional(),
                assign("name", call("ID")),
                keyword(":"),
                assign("type", cross_ref_with("Type", call("QualifiedName"))),
            ]),
        ))
        .with_rule(
            ParserRule::new(
                "QualifiedName",
                group([call("ID"), group([keyword("."), call("ID")]).many()]),
            )
            .returns_data_type("string"),
        )
        .with_common_terminals()
}

pub(crate) fn domainmodel() -> Arc<CompiledGrammar> {
    static GRAMMAR: OnceLock<Arc<CompiledGrammar>> = OnceLock::new();
    GRAMMAR
        .get_or_init(|| {
            Arc::new(
                CompiledGrammar::from_grammar(&domainmodel_grammar())
                    .expect("domain-model grammar compiles"),
            )
        })
        .clone()
}

pub(crate) fn parse(uri: &str, text: &str) -> Document {
    Document::parse(uri.into(), text, &domainmodel(), &ParserConfig::default())
}
