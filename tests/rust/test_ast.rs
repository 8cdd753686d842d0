//! AST tests: compact-JSON loading, lookup, discovery, printing

mod common;

use common::*;
use pretty_assertions::assert_eq;
use regex::Regex;
use serde_json::json;
use soltest_script::ast::lookup::{discover_tests, find_function, find_function_in, TestCase};
use soltest_script::ast::printer::{self, Node};
use soltest_script::ast::{Category, Expression, LiteralKind, SourceRange, SourceUnit, Statement};

fn parse_expression(value: serde_json::Value) -> Expression {
    serde_json::from_value(value).unwrap()
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn literal_node() {
    let Expression::Literal(lit) = parse_expression(number_with_unit("2", "days")) else {
        panic!("expected a literal");
    };
    assert_eq!(lit.kind, LiteralKind::Number);
    assert_eq!(lit.text(), "2");
    assert_eq!(lit.subdenomination.as_deref(), Some("days"));
    assert_eq!(lit.type_descriptions.category(), Category::RationalNumber);
}

#[test]
fn hex_string_literal_text() {
    let expr = parse_expression(json!({
        "nodeType": "Literal",
        "kind": "hexString",
        "hexValue": "beef",
        "typeDescriptions": { "typeString": "literal_string hex\"beef\"" }
    }));
    let Expression::Literal(lit) = expr else {
        panic!("expected a literal");
    };
    assert_eq!(lit.kind, LiteralKind::HexString);
    assert_eq!(lit.text(), "0xbeef");
}

#[test]
fn nested_expression_nodes() {
    let expr = parse_expression(call(
        harness_member("deploy"),
        vec![binary(ident("x", "uint8"), "+", number("1"), "uint8")],
    ));
    let Expression::FunctionCall(call) = expr else {
        panic!("expected a call");
    };
    assert_eq!(call.arguments.len(), 1);
    let Expression::MemberAccess(access) = call.expression.as_ref() else {
        panic!("expected a member access");
    };
    assert_eq!(access.member_name, "deploy");
    assert!(matches!(
        access.expression.as_ref(),
        Expression::Identifier(id) if id.name == "soltest"
    ));
    assert_eq!(call.src, SourceRange::new(0, 0, 0));
}

#[test]
fn unknown_nodes_become_unsupported() {
    let expr = parse_expression(json!({
        "nodeType": "Conditional",
        "condition": boolean(true),
        "trueExpression": number("1"),
        "falseExpression": number("2")
    }));
    assert!(matches!(expr, Expression::Unsupported));

    let stmt: Statement =
        serde_json::from_value(json!({ "nodeType": "ForStatement", "body": block(vec![]) })).unwrap();
    assert!(matches!(stmt, Statement::Unsupported));
}

#[test]
fn tuple_with_holes() {
    let expr = parse_expression(json!({
        "nodeType": "TupleExpression",
        "components": [null, number("1")],
        "isInlineArray": false
    }));
    let Expression::TupleExpression(tuple) = expr else {
        panic!("expected a tuple");
    };
    assert!(tuple.components[0].is_none());
    assert!(tuple.components[1].is_some());
}

#[test]
fn bad_source_range_is_rejected() {
    let result: Result<Expression, _> = serde_json::from_value(json!({
        "nodeType": "Identifier",
        "name": "x",
        "src": "12:abc:0"
    }));
    assert!(result.is_err());
    assert_eq!("10:5:1".parse::<SourceRange>(), Ok(SourceRange::new(10, 5, 1)));
}

#[test]
fn source_unit_from_json_text() {
    let text = r#"{
        "nodeType": "SourceUnit",
        "absolutePath": "a.sol",
        "nodes": [
            { "nodeType": "PragmaDirective", "literals": ["solidity"] },
            { "nodeType": "FunctionDefinition", "name": "testFree", "body": { "nodeType": "Block", "statements": [] } },
            { "nodeType": "ContractDefinition", "name": "C", "nodes": [
                { "nodeType": "EventDefinition", "name": "E" },
                { "nodeType": "FunctionDefinition", "name": "testInC" }
            ] }
        ],
        "src": "0:100:0"
    }"#;
    let unit = SourceUnit::from_json(text).unwrap();
    assert_eq!(unit.absolute_path, "a.sol");
    assert_eq!(unit.nodes.len(), 3);
    let contract = unit.contracts().next().unwrap();
    assert_eq!(contract.functions().count(), 1);
    assert!(contract.functions().next().unwrap().body.is_none());
}

// ── Lookup and discovery ─────────────────────────────────────────

fn mixed_unit() -> SourceUnit {
    serde_json::from_value(json!({
        "nodeType": "SourceUnit",
        "nodes": [
            { "nodeType": "ContractDefinition", "name": "A", "nodes": [
                function("testShared", vec![]),
                function("setUp", vec![]),
            ] },
            { "nodeType": "ContractDefinition", "name": "B", "nodes": [
                function("testShared", vec![expr_stmt(boolean(true))]),
                function("testOnlyB", vec![]),
            ] },
            function("testFree", vec![]),
        ]
    }))
    .unwrap()
}

#[test]
fn discovery_follows_source_order() {
    let cases = discover_tests(&mixed_unit(), &Regex::new("^test").unwrap());
    let expected = vec![
        TestCase {
            contract: Some("A".into()),
            name: "testShared".into(),
        },
        TestCase {
            contract: Some("B".into()),
            name: "testShared".into(),
        },
        TestCase {
            contract: Some("B".into()),
            name: "testOnlyB".into(),
        },
        TestCase {
            contract: None,
            name: "testFree".into(),
        },
    ];
    assert_eq!(cases, expected);
}

#[test]
fn custom_pattern() {
    let cases = discover_tests(&mixed_unit(), &Regex::new("^setUp$").unwrap());
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].contract.as_deref(), Some("A"));
}

#[test]
fn lookup_prefers_named_contract() {
    let unit = mixed_unit();
    let in_b = find_function_in(&unit, "B", "testShared").unwrap();
    assert_eq!(in_b.body.as_ref().unwrap().statements.len(), 1);

    let first = find_function(&unit, "testShared").unwrap();
    assert!(first.body.as_ref().unwrap().statements.is_empty());

    assert_eq!(find_function_in(&unit, "B", "testFree").unwrap().name, "testFree");
    assert_eq!(find_function_in(&unit, "Missing", "testOnlyB").unwrap().name, "testOnlyB");
    assert!(find_function(&unit, "nothing").is_none());
}

// ── Printer ──────────────────────────────────────────────────────

#[test]
fn prints_expression_tree() {
    let expr = parse_expression(call(
        assert_fn(),
        vec![unary(
            "!",
            true,
            tuple(vec![binary(ident("x", "uint256"), ">", number("3"), "bool")]),
        )],
    ));
    let expected = "FunctionCall (1 arguments)
  Identifier assert (function (bool) pure)
  UnaryOperation prefix !
    TupleExpression
      BinaryOperation > (bool)
        Identifier x (uint256)
        Literal 3 (int_const 3)
";
    assert_eq!(printer::print(Node::Expression(&expr)), expected);
}

#[test]
fn prints_declarations_and_unsupported_nodes() {
    let stmt: Statement = serde_json::from_value(block(vec![
        declare("x", "uint8", Some(unary("++", false, ident("y", "uint8")))),
        json!({ "nodeType": "WhileStatement" }),
        expr_stmt(json!({ "nodeType": "Conditional" })),
    ]))
    .unwrap();
    let expected = "Block
  VariableDeclarationStatement
    VariableDeclaration \"x\" (uint8)
    UnaryOperation postfix ++
      Identifier y (uint8)
  <unsupported statement>
  ExpressionStatement
    <unsupported expression>
";
    assert_eq!(printer::print(Node::Statement(&stmt)), expected);
}
