//! Tests for the script parser, tree visitor, and query layer

use std::collections::HashMap;

use maplit::hashmap;

use super::analysis::{QueryError, ScriptAnalysis};
use super::ast::{LiteralKind, LiteralValue, MemberKind, MethodCall, Node};
use super::parse_script;

/* ===================== Test Helpers ===================== */

fn parse(source: &str) -> Node {
    parse_script(source).expect("Parse failed")
}

/// First node of the script's root wrapper
fn first(source: &str) -> Node {
    let Node::Block { mut children } = parse(source) else {
        panic!("Root is not a block wrapper");
    };
    assert!(!children.is_empty(), "Script produced no nodes");
    children.remove(0)
}

fn first_call(source: &str) -> MethodCall {
    match first(source) {
        Node::MethodCall(call) => call,
        other => panic!("Expected a method call, got {:?}", other),
    }
}

/* ===================== Literal Coercion Tests ===================== */

#[test]
fn test_string_literal_strips_single_quotes() {
    let node = first("'hello';");
    assert_eq!(
        node,
        Node::Literal {
            location: node.location().unwrap(),
            kind: LiteralKind::String,
            value: LiteralValue::Str("hello".to_string()),
        }
    );
}

#[test]
fn test_string_literal_strips_double_quotes() {
    let Node::Literal { value, .. } = first("\"world\";") else {
        panic!("Expected a literal");
    };
    assert_eq!(value, LiteralValue::Str("world".to_string()));
}

#[test]
fn test_number_literal_plain() {
    let Node::Literal { kind, value, .. } = first("42;") else {
        panic!("Expected a literal");
    };
    assert_eq!(kind, LiteralKind::Number);
    assert_eq!(value, LiteralValue::Num(42.0));
}

#[test]
fn test_number_literal_strips_long_suffix() {
    let Node::Literal { value, .. } = first("42L;") else {
        panic!("Expected a literal");
    };
    assert_eq!(value, LiteralValue::Num(42.0));
}

#[test]
fn test_number_literal_strips_double_suffix() {
    let Node::Literal { value, .. } = first("3.5d;") else {
        panic!("Expected a literal");
    };
    assert_eq!(value, LiteralValue::Num(3.5));
}

#[test]
fn test_boolean_literal_is_case_insensitive() {
    let Node::Literal { kind, value, .. } = first("TRUE;") else {
        panic!("Expected a literal");
    };
    assert_eq!(kind, LiteralKind::Boolean);
    assert_eq!(value, LiteralValue::Bool(true));

    let Node::Literal { value, .. } = first("False;") else {
        panic!("Expected a literal");
    };
    assert_eq!(value, LiteralValue::Bool(false));
}

#[test]
fn test_null_literal() {
    let Node::Literal { kind, value, .. } = first("null;") else {
        panic!("Expected a literal");
    };
    assert_eq!(kind, LiteralKind::Null);
    assert_eq!(value, LiteralValue::Null);
}

/* ===================== Flattening Tests ===================== */

#[test]
fn test_empty_script_collapses_to_empty_wrapper() {
    assert_eq!(parse(""), Node::Block { children: vec![] });
    assert_eq!(parse("  \n  "), Node::Block { children: vec![] });
}

#[test]
fn test_nested_blocks_flatten_into_parent() {
    let node = parse("{ captureLimits(); { diffLimits(a, b); } }");
    let Node::Block { children } = node else {
        panic!("Root is not a block wrapper");
    };
    // both calls surface at the root; no wrapper nesting survives
    assert_eq!(children.len(), 2);
    assert!(matches!(&children[0], Node::MethodCall(c) if c.name == "captureLimits"));
    assert!(matches!(&children[1], Node::MethodCall(c) if c.name == "diffLimits"));
}

#[test]
fn test_empty_statement_is_presence_marker() {
    assert_eq!(first(";"), Node::Statement);
}

/* ===================== Method Call Tests ===================== */

#[test]
fn test_bare_call() {
    let call = first_call("captureLimits();");
    assert_eq!(call.name, "captureLimits");
    assert!(call.arguments.is_empty());
    assert_eq!(call.target, None);
    assert_eq!(call.location.line, 1);
}

#[test]
fn test_dotted_call_prefers_method_form() {
    let call = first_call("System.assert(false, 'x');");
    assert_eq!(call.name, "assert");
    assert_eq!(call.target.as_deref(), Some("System"));
    assert_eq!(call.arguments.len(), 2);
}

#[test]
fn test_deep_dotted_call_keeps_full_receiver_text() {
    let call = first_call("ctx.probe.report();");
    assert_eq!(call.name, "report");
    assert_eq!(call.target.as_deref(), Some("ctx.probe"));
}

#[test]
fn test_dotted_access_without_call_degrades_to_text() {
    let node = first("a.b;");
    assert!(matches!(&node, Node::GenericExpression { text, .. } if text == "a.b"));
}

#[test]
fn test_boolean_argument_is_modeled() {
    let call = first_call("assert(false, 'x');");
    assert!(matches!(
        &call.arguments[0],
        Node::Literal {
            kind: LiteralKind::Boolean,
            value: LiteralValue::Bool(false),
            ..
        }
    ));
}

#[test]
fn test_unmodeled_argument_is_preserved_verbatim() {
    let call = first_call("assert(false, '-_' + Json.serialize(used) + '_-');");
    let Node::GenericExpression { text, .. } = &call.arguments[1] else {
        panic!("Expected a generic expression argument");
    };
    assert_eq!(text, "'-_' + Json.serialize(used) + '_-'");
}

#[test]
fn test_nested_call_argument_is_modeled() {
    let call = first_call("assert(false, serialize(diff));");
    assert!(matches!(&call.arguments[1], Node::MethodCall(c) if c.name == "serialize"));
}

/* ===================== Merging Tests ===================== */

#[test]
fn test_declaration_with_call_initializer_lifts_the_call() {
    let call = first_call("Limits before = captureLimits();");
    assert_eq!(call.name, "captureLimits");

    let Some(assignment) = &call.assignment else {
        panic!("Call should carry its assignment target");
    };
    let Node::Field { type_name, children } = assignment.as_ref() else {
        panic!("Expected a field node, got {:?}", assignment);
    };
    assert_eq!(type_name, "Limits");
    assert!(matches!(&children[0], Node::Id { text, .. } if text == "before"));
}

#[test]
fn test_assignment_with_call_initializer_lifts_the_call() {
    let call = first_call("before = captureLimits();");
    assert_eq!(call.name, "captureLimits");
    let Some(assignment) = &call.assignment else {
        panic!("Call should carry its assignment target");
    };
    assert!(matches!(assignment.as_ref(), Node::Assignment { .. }));
}

#[test]
fn test_declaration_with_plain_initializer_stays_a_field() {
    let node = first("Integer i = 0;");
    let Node::Field { type_name, children } = node else {
        panic!("Expected a field node");
    };
    assert_eq!(type_name, "Integer");
    assert_eq!(children.len(), 2);
    assert!(matches!(&children[1], Node::Literal { .. }));
}

#[test]
fn test_declaration_with_constructor_degrades_to_generic() {
    let node = first("LimitsProbe p = new LimitsProbe();");
    let Node::Field { children, .. } = node else {
        panic!("Expected a field node");
    };
    assert!(matches!(&children[1], Node::GenericExpression { text, .. } if text == "new LimitsProbe()"));
}

/* ===================== Member Declaration Tests ===================== */

#[test]
fn test_class_declaration_is_abstracted_without_descent() {
    let node = parse("class Helper { void run() { captureLimits(); } }");
    let Node::Block { children } = node else {
        panic!("Root is not a block wrapper");
    };
    // the body call never surfaces
    assert_eq!(children.len(), 1);
    assert_eq!(
        children[0],
        Node::Member {
            kind: MemberKind::Class,
            name: "Helper".to_string(),
        }
    );
}

#[test]
fn test_method_declaration_is_abstracted() {
    assert_eq!(
        first("void helper() { work(); }"),
        Node::Member {
            kind: MemberKind::Method,
            name: "helper".to_string(),
        }
    );
}

#[test]
fn test_interface_and_enum_declarations() {
    assert_eq!(
        first("interface Probe { }"),
        Node::Member {
            kind: MemberKind::Interface,
            name: "Probe".to_string(),
        }
    );
    assert_eq!(
        first("enum Color { RED, GREEN }"),
        Node::Member {
            kind: MemberKind::Enum,
            name: "Color".to_string(),
        }
    );
}

/* ===================== Query Layer Tests ===================== */

#[test]
fn test_external_view_excludes_declared_helpers() {
    let source = "void helper() { }\nhelper();\ncaptureLimits();";
    let analysis = ScriptAnalysis::parse(source).unwrap();
    let calls = analysis.method_calls();

    assert_eq!(calls.external.len(), 1);
    assert_eq!(calls.external[0].name, "captureLimits");
    assert_eq!(calls.internal.len(), 1);
    assert_eq!(calls.internal[0].name, "helper");
}

#[test]
fn test_calls_inside_arguments_are_found() {
    let analysis = ScriptAnalysis::parse("assert(false, serialize(diff));").unwrap();
    let calls = analysis.method_calls();
    let names: Vec<_> = calls.external.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["assert", "serialize"]);
}

#[test]
fn test_call_dictionary_maps_absent_names_to_empty_lists() {
    let source = "captureLimits();\ncaptureLimits();";
    let analysis = ScriptAnalysis::parse(source).unwrap();
    let calls = analysis.method_calls();
    let dictionary = analysis.call_dictionary(&calls.external, &["captureLimits", "diffLimits"]);

    let counts: HashMap<String, usize> = dictionary
        .iter()
        .map(|(name, group)| (name.clone(), group.len()))
        .collect();
    assert_eq!(
        counts,
        hashmap! {
            "captureLimits".to_string() => 2,
            "diffLimits".to_string() => 0,
        }
    );
}

#[test]
fn test_boolean_param() {
    let analysis = ScriptAnalysis::parse("assert(false, 'x');").unwrap();
    let calls = analysis.method_calls();
    let call = &calls.external[0];

    assert_eq!(analysis.boolean_param(call, 0), Ok(false));
    assert_eq!(
        analysis.boolean_param(call, 1),
        Err(QueryError::ParamType {
            call: "assert".to_string(),
            index: 1,
        })
    );
    assert_eq!(
        analysis.boolean_param(call, 2),
        Err(QueryError::ParamIndex {
            call: "assert".to_string(),
            index: 2,
        })
    );
}

#[test]
fn test_expression_param_returns_raw_source_text() {
    let analysis = ScriptAnalysis::parse("assert(false, '-_' + payload + '_-');").unwrap();
    let calls = analysis.method_calls();
    let call = &calls.external[0];

    assert_eq!(analysis.expression_param(call, 0), Ok("false"));
    assert_eq!(
        analysis.expression_param(call, 1),
        Ok("'-_' + payload + '_-'")
    );
    assert_eq!(
        analysis.expression_param(call, 5),
        Err(QueryError::ParamIndex {
            call: "assert".to_string(),
            index: 5,
        })
    );
}
