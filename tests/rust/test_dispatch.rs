//! Call dispatch tests: assert, harness forwarding, ignored calls

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use soltest_script::ast::Category;
use soltest_script::diagnostics::DiagnosticKind;
use soltest_script::runtime::harness::{
    Harness, HarnessCall, HarnessError, HarnessIdentity, RecordingHarness,
};
use soltest_script::runtime::operand::{Literal, Operand};
use soltest_script::runtime::{Executor, TestContext};

fn harness_call(source: &str, snippet: &str, member: &str, arguments: Vec<serde_json::Value>) -> serde_json::Value {
    expr_stmt(call_at(source, snippet, harness_member(member), arguments))
}

// ── Harness forwarding ───────────────────────────────────────────

#[test]
fn member_call_is_forwarded_with_literal_arguments() {
    let source = "soltest.deploy(1, \"a\");";
    let (outcome, calls) = run(
        source,
        vec![harness_call(
            source,
            "soltest.deploy(1, \"a\")",
            "deploy",
            vec![number("1"), string("a")],
        )],
    );
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(
        calls,
        vec![HarnessCall {
            member: "deploy".into(),
            arguments: vec![
                Operand::Literal(Literal::new(Category::RationalNumber, "1")),
                Operand::Literal(Literal::new(Category::StringLiteral, "a")),
            ],
        }]
    );
}

#[test]
fn call_without_arguments() {
    let source = "soltest.reset();";
    let (_, calls) = run(source, vec![harness_call(source, "soltest.reset()", "reset", vec![])]);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].member, "reset");
    assert!(calls[0].arguments.is_empty());
}

#[test]
fn bound_identifiers_are_resolved() {
    let source = "uint x = 4; soltest.expect(x, y);";
    let (_, calls) = run(
        source,
        vec![
            declare("x", "uint256", Some(number("4"))),
            harness_call(
                source,
                "soltest.expect(x, y)",
                "expect",
                vec![ident("x", "uint256"), ident("y", "address")],
            ),
        ],
    );
    assert_eq!(
        calls[0].arguments,
        vec![
            Operand::Literal(Literal::new(
                Category::Integer {
                    signed: false,
                    bits: 256
                },
                "4"
            )),
            Operand::Identifier {
                name: "y".into(),
                type_name: "address".into()
            },
        ]
    );
}

#[test]
fn calls_keep_source_order() {
    let source = "soltest.a(); soltest.b(); soltest.c();";
    let statements = ["a", "b", "c"]
        .iter()
        .map(|m| harness_call(source, &format!("soltest.{}()", m), m, vec![]))
        .collect();
    let (_, calls) = run(source, statements);
    let members: Vec<&str> = calls.iter().map(|c| c.member.as_str()).collect();
    assert_eq!(members, vec!["a", "b", "c"]);
}

#[test]
fn evaluated_arguments_are_forwarded() {
    let source = "soltest.expect(2 + 3);";
    let (_, calls) = run(
        source,
        vec![harness_call(
            source,
            "soltest.expect(2 + 3)",
            "expect",
            vec![binary(number("2"), "+", number("3"), "int_const 5")],
        )],
    );
    assert_eq!(
        calls[0].arguments,
        vec![Operand::Literal(Literal::new(Category::RationalNumber, "5"))]
    );
}

#[test]
fn other_receivers_are_ignored() {
    let source = "other.deploy(); soltest.deploy();";
    let wrong_name = member(ident("other", "contract Soltest"), "deploy", "function ()");
    let wrong_type = member(ident("soltest", "contract Other"), "deploy", "function ()");
    let (outcome, calls) = run(
        source,
        vec![
            expr_stmt(call(wrong_name, vec![])),
            expr_stmt(call(wrong_type, vec![])),
        ],
    );
    assert!(outcome.success);
    assert!(calls.is_empty());
}

#[test]
fn custom_identity() {
    let source = "runner.go();";
    let u = unit(vec![function(
        "testCase",
        vec![expr_stmt(call_at(
            source,
            "runner.go()",
            member(ident("runner", "contract Runner"), "go", "function ()"),
            vec![],
        ))],
    )]);
    let mut harness = RecordingHarness::new();
    let context = TestContext::new(&u, source, CONTRACT, FILE, LINE);
    let identity = HarnessIdentity {
        name: "runner".into(),
        type_name: "contract Runner".into(),
    };
    let outcome = Executor::new(context, &mut harness)
        .with_identity(identity)
        .execute("testCase");
    assert!(outcome.success);
    assert_eq!(harness.calls().len(), 1);
    assert_eq!(harness.calls()[0].member, "go");
}

#[test]
fn rejected_call_is_a_diagnostic() {
    let source = "soltest.bogus();\nsoltest.deploy();";
    let u = unit(vec![function(
        "testCase",
        vec![
            harness_call(source, "soltest.bogus()", "bogus", vec![]),
            harness_call(source, "soltest.deploy()", "deploy", vec![]),
        ],
    )]);
    let context = TestContext::new(&u, source, CONTRACT, FILE, LINE);
    let mut executor = Executor::new(context, RecordingHarness::with_methods(&["deploy"]));
    let outcome = executor.execute("testCase");

    assert!(!outcome.success);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::HarnessFailure);
    assert_eq!(
        outcome.message,
        "t.sol:1: harness has no method 'bogus': Tests testCase t.sol:7"
    );
    assert_eq!(executor.into_harness().calls().len(), 1);
}

struct FailingHarness {
    seen: usize,
}

impl Harness for FailingHarness {
    fn call(&mut self, member: &str, _arguments: &[Operand]) -> Result<(), HarnessError> {
        self.seen += 1;
        Err(HarnessError::Failed {
            member: member.to_string(),
            reason: "reverted".into(),
        })
    }
}

#[test]
fn custom_harness_failure_does_not_stop_the_test() {
    let source = "soltest.one(); soltest.two();";
    let u = unit(vec![function(
        "testCase",
        vec![
            harness_call(source, "soltest.one()", "one", vec![]),
            harness_call(source, "soltest.two()", "two", vec![]),
        ],
    )]);
    let context = TestContext::new(&u, source, CONTRACT, FILE, LINE);
    let mut executor = Executor::new(context, FailingHarness { seen: 0 });
    let outcome = executor.execute("testCase");
    assert_eq!(executor.harness().seen, 2);
    assert_eq!(outcome.diagnostics.len(), 2);
    assert_eq!(
        outcome.diagnostics[0].message,
        "harness call 'one' failed: reverted"
    );
}

#[test]
fn nested_call_argument_blocks_forwarding() {
    let source = "soltest.deploy(1, soltest.get());";
    let inner = call_at(source, "soltest.get()", harness_member("get"), vec![]);
    let (outcome, calls) = run(
        source,
        vec![harness_call(
            source,
            "soltest.deploy(1, soltest.get())",
            "deploy",
            vec![number("1"), inner],
        )],
    );
    let members: Vec<&str> = calls.iter().map(|c| c.member.as_str()).collect();
    assert_eq!(members, vec!["get"]);
    assert_eq!(
        outcome.message,
        "t.sol:1: unsupported expression: argument 2 of 'soltest.deploy(1, soltest.get())' \
         has no value: Tests testCase t.sol:7"
    );
}

#[test]
fn member_access_argument_is_not_spread_into_arguments() {
    let source = "soltest.a(soltest.b, g());";
    let (outcome, calls) = run(
        source,
        vec![harness_call(
            source,
            "soltest.a(soltest.b, g())",
            "a",
            vec![
                harness_member("b"),
                call(ident("g", "function () returns (uint256)"), vec![]),
            ],
        )],
    );
    assert!(calls.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::UnsupportedExpression);
    assert!(outcome.diagnostics[0].message.contains("argument 1 of"));
}

#[test]
fn failed_argument_is_reported_once() {
    let source = "soltest.expect(1 / 0);";
    let (outcome, calls) = run(
        source,
        vec![harness_call(
            source,
            "soltest.expect(1 / 0)",
            "expect",
            vec![binary(number("1"), "/", number("0"), "int_const")],
        )],
    );
    assert!(calls.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::DivisionByZero);
}

#[test]
fn nested_receiver_is_not_the_harness() {
    let source = "soltest.inner.go();";
    let callee = member(harness_member("inner"), "go", "function ()");
    let (outcome, calls) = run(source, vec![expr_stmt(call(callee, vec![]))]);
    assert!(outcome.success, "{}", outcome.message);
    assert!(calls.is_empty());
}

// ── Assert and ignored calls ─────────────────────────────────────

#[test]
fn assert_on_call_result_is_ignored() {
    let source = "assert(soltest.ready());";
    let ready = call_at(source, "soltest.ready()", harness_member("ready"), vec![]);
    let (outcome, calls) = run(source, vec![assert_stmt(source, "assert(soltest.ready())", ready)]);
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(calls.len(), 1);
}

#[test]
fn assert_on_bool_variable() {
    let source = "bool ok = false; assert(ok);";
    let (outcome, _) = run(
        source,
        vec![
            declare("ok", "bool", Some(boolean(false))),
            assert_stmt(source, "assert(ok)", ident("ok", "bool")),
        ],
    );
    assert_eq!(
        outcome.message,
        "t.sol:1: assert(ok) failed.: Tests testCase t.sol:7"
    );
}

#[test]
fn assert_on_unbound_variable() {
    let source = "assert(ready);";
    let (outcome, _) = run(source, vec![assert_stmt(source, "assert(ready)", ident("ready", "bool"))]);
    assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::UnknownVariable);
}

#[test]
fn assert_with_message_is_ignored() {
    let source = "assert(false, \"msg\");";
    let (outcome, _) = run(
        source,
        vec![expr_stmt(call_at(
            source,
            "assert(false, \"msg\")",
            assert_fn(),
            vec![boolean(false), string("msg")],
        ))],
    );
    assert!(outcome.success);
}

#[test]
fn unrecognised_calls_are_ignored() {
    let source = "foo(1); uint256(3); new Thing();";
    let conversion = json!({
        "nodeType": "ElementaryTypeNameExpression",
        "typeName": { "name": "uint256" }
    });
    let creation = json!({ "nodeType": "NewExpression", "typeDescriptions": { "typeString": "function () returns (contract Thing)" } });
    let (outcome, calls) = run(
        source,
        vec![
            expr_stmt(call(ident("foo", "function (uint256)"), vec![number("1")])),
            expr_stmt(call(conversion, vec![number("3")])),
            expr_stmt(call(creation, vec![])),
        ],
    );
    assert!(outcome.success, "{}", outcome.message);
    assert!(calls.is_empty());
}

#[test]
fn call_initialiser_leaves_zero_value() {
    // The call pushes nothing, so the declaration sees only itself.
    let source = "uint x = foo(1); assert(x == 0);";
    let (outcome, _) = run(
        source,
        vec![
            declare(
                "x",
                "uint256",
                Some(call(
                    ident("foo", "function (uint256) returns (uint256)"),
                    vec![number("1")],
                )),
            ),
            assert_stmt(
                source,
                "assert(x == 0)",
                binary(ident("x", "uint256"), "==", number("0"), "bool"),
            ),
        ],
    );
    assert!(outcome.success, "{}", outcome.message);
}

#[test]
fn harness_call_serializes_for_reports() {
    let call = HarnessCall {
        member: "deploy".into(),
        arguments: vec![
            Operand::Literal(Literal::new(Category::RationalNumber, "1")),
            Operand::Identifier {
                name: "y".into(),
                type_name: "address".into(),
            },
        ],
    };
    assert_eq!(
        serde_json::to_value(&call).unwrap(),
        json!({
            "member": "deploy",
            "arguments": [
                { "kind": "literal", "category": "rational", "value": "1" },
                { "kind": "identifier", "name": "y", "type_name": "address" }
            ]
        })
    );
}
