//! Grammars used across the integration tests.

use std::sync::Arc;

use grammarkit::CompiledGrammar;
use grammarkit::grammar::builder::*;
use grammarkit::grammar::{Grammar, ParserRule};
use once_cell::sync::Lazy;

/// Domain models with nested packages and qualified cross-references.
///
/// ```text
/// Domainmodel: (elements+=AbstractElement)*;
/// AbstractElement: PackageDeclaration | Type;
/// PackageDeclaration: 'package' name=QualifiedName '{' (elements+=AbstractElement)* '}';
/// Type: DataType | Entity;
/// DataType: 'datatype' name=ID;
/// Entity: 'entity' name=ID ('extends' superType=[Entity:QualifiedName])?
///     '{' (features+=Feature)* '}';
/// Feature: (many?='many')? name=ID ':' type=[Type:QualifiedName];
/// QualifiedName returns string: ID ('.' ID)*;
/// ```
pub fn domainmodel_grammar() -> Grammar {
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

static DOMAINMODEL: Lazy<Arc<CompiledGrammar>> = Lazy::new(|| {
    Arc::new(CompiledGrammar::from_grammar(&domainmodel_grammar()).expect("grammar compiles"))
});

pub fn domainmodel() -> Arc<CompiledGrammar> {
    DOMAINMODEL.clone()
}

/// Statemachines: unordered event/command blocks and cross-references
/// between states.
///
/// ```text
/// Statemachine: 'statemachine' name=ID
///     ('events' events+=Event+ & 'commands' commands+=Command+)?
///     'initialState' init=[State]
///     states+=State*;
/// Event: name=ID;
/// Command: name=ID;
/// State: 'state' name=ID ('actions' '{' actions+=[Command]+ '}')?
///     transitions+=Transition* 'end';
/// Transition: event=[Event] '=>' state=[State];
/// ```
pub fn statemachine_grammar() -> Grammar {
    Grammar::new("Statemachine")
        .with_rule(
            ParserRule::new(
                "Statemachine",
                group([
                    keyword("statemachine"),
                    assign("name", call("ID")),
                    unordered([
                        group([
                            keyword("events"),
                            append("events", call("Event")).at_least_one(),
                        ]),
                        group([
                            keyword("commands"),
                            append("commands", call("Command")).at_least_one(),
                        ]),
                    ])
                    .optional(),
                    keyword("initialState"),
                    assign("init", cross_ref("State")),
                    append("states", call("State")).many(),
                ]),
            )
            .entry(),
        )
        .with_rule(ParserRule::new("Event", assign("name", call("ID"))))
        .with_rule(ParserRule::new("Command", assign("name", call("ID"))))
        .with_rule(ParserRule::new(
            "State",
            group([
                keyword("state"),
                assign("name", call("ID")),
                group([
                    keyword("actions"),
                    keyword("{"),
                    append("actions", cross_ref("Command")).at_least_one(),
                    keyword("}"),
                ])
                .optional(),
                append("transitions", call("Transition")).many(),
                keyword("end"),
            ]),
        ))
        .with_rule(ParserRule::new(
            "Transition",
            group([
                assign("event", cross_ref("Event")),
                keyword("=>"),
                assign("state", cross_ref("State")),
            ]),
        ))
        .with_common_terminals()
}

static STATEMACHINE: Lazy<Arc<CompiledGrammar>> = Lazy::new(|| {
    Arc::new(CompiledGrammar::from_grammar(&statemachine_grammar()).expect("grammar compiles"))
});

pub fn statemachine() -> Arc<CompiledGrammar> {
    STATEMACHINE.clone()
}
