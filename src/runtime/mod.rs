mod dispatch;
pub mod harness;
pub mod literal;
pub mod operand;
pub mod state;

use crate::ast::lookup::find_function_in;
use crate::ast::printer::{self, Node};
use crate::ast::span::line_at;
use crate::ast::{self, Expression, FunctionDefinition, SourceRange, SourceUnit, Statement};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EvalError;

use harness::{Harness, HarnessIdentity};
use operand::{Literal, Operand, OperandStack};
use state::VariableState;

// ── Public surface ──────────────────────────────────────────────────────

/// Immutable metadata for running the tests of one contract.
#[derive(Debug, Clone)]
pub struct TestContext<'a> {
    pub unit: &'a SourceUnit,
    /// Full source text the AST was built from; used for call snippets.
    pub source: &'a str,
    pub contract: String,
    pub file: String,
    pub line: usize,
}

impl<'a> TestContext<'a> {
    pub fn new(
        unit: &'a SourceUnit,
        source: &'a str,
        contract: &str,
        file: &str,
        line: usize,
    ) -> Self {
        Self {
            unit,
            source,
            contract: contract.to_string(),
            file: file.to_string(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub success: bool,
    /// Empty on success and when the test function does not exist.
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl TestOutcome {
    fn not_found() -> Self {
        Self {
            success: false,
            message: String::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Runs test functions of one source unit against a harness.
pub struct Executor<'a, H: Harness> {
    context: TestContext<'a>,
    identity: HarnessIdentity,
    harness: H,
}

impl<'a, H: Harness> Executor<'a, H> {
    pub fn new(context: TestContext<'a>, harness: H) -> Self {
        Self {
            context,
            identity: HarnessIdentity::default(),
            harness,
        }
    }

    pub fn with_identity(mut self, identity: HarnessIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn harness(&self) -> &H {
        &self.harness
    }

    pub fn into_harness(self) -> H {
        self.harness
    }

    /// Run the function named `testcase`.
    ///
    /// A missing function is reported as `success == false` with an empty
    /// message. Otherwise the whole body is walked, whatever fails along the
    /// way, and the test passes iff nothing was recorded.
    pub fn execute(&mut self, testcase: &str) -> TestOutcome {
        let Some(function) =
            find_function_in(self.context.unit, &self.context.contract, testcase)
        else {
            tracing::debug!(testcase, "test function not found");
            return TestOutcome::not_found();
        };

        let mut frame = Frame::new(&self.context, &self.identity, &mut self.harness);
        frame.function(function);

        let Frame { diagnostics, .. } = frame;
        if diagnostics.is_empty() {
            return TestOutcome {
                success: true,
                message: String::new(),
                diagnostics: Vec::new(),
            };
        }
        let message = diagnostics.finalize(
            &self.context.contract,
            testcase,
            &self.context.file,
            self.context.line,
        );
        TestOutcome {
            success: false,
            message,
            diagnostics: diagnostics.entries().to_vec(),
        }
    }
}

// ── Execution frame ─────────────────────────────────────────────────────

/// Stack and diagnostic heights before a node's children were visited.
#[derive(Debug, Clone, Copy)]
struct Mark {
    operands: usize,
    diagnostics: usize,
}

/// Heights recorded while visiting a call. Each argument must leave exactly
/// one operand; `valueless` is the first that did not.
#[derive(Debug, Clone, Copy)]
struct CallMarks {
    call: Mark,
    arguments: usize,
    valueless: Option<usize>,
}

/// Per-execution state: a fresh operand stack, variable table and
/// diagnostics buffer, plus borrowed context.
struct Frame<'f> {
    context: &'f TestContext<'f>,
    identity: &'f HarnessIdentity,
    harness: &'f mut dyn Harness,
    stack: OperandStack,
    state: VariableState,
    diagnostics: Diagnostics,
}

impl<'f> Frame<'f> {
    fn new(
        context: &'f TestContext<'f>,
        identity: &'f HarnessIdentity,
        harness: &'f mut dyn Harness,
    ) -> Self {
        Self {
            context,
            identity,
            harness,
            stack: OperandStack::new(),
            state: VariableState::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            operands: self.stack.mark(),
            diagnostics: self.diagnostics.len(),
        }
    }

    /// Whether something below `mark` already reported a failure, in which
    /// case a malformed operand shape is a consequence, not a new error.
    fn children_failed(&self, mark: Mark) -> bool {
        self.diagnostics.len() > mark.diagnostics
    }

    fn line_of(&self, range: SourceRange) -> usize {
        if self.context.source.is_empty() {
            return self.context.line;
        }
        line_at(self.context.source, range.start).unwrap_or(self.context.line)
    }

    fn report(&mut self, err: &EvalError, range: SourceRange) {
        let line = self.line_of(range);
        self.diagnostics.record_eval(err, &self.context.file, line);
    }

    fn report_shape(&mut self, mark: Mark, message: String, range: SourceRange) {
        if !self.children_failed(mark) {
            self.report(&EvalError::UnsupportedExpression(message), range);
        }
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn function(&mut self, function: &FunctionDefinition) {
        tracing::trace!("executing\n{}", printer::print(Node::Function(function)));
        if let Some(body) = &function.body {
            self.block(body);
        }
    }

    fn block(&mut self, block: &ast::Block) {
        for stmt in &block.statements {
            self.statement(stmt);
        }
    }

    fn statement(&mut self, stmt: &Statement) {
        tracing::trace!("statement\n{}", printer::print(Node::Statement(stmt)));
        let mark = self.mark();
        match stmt {
            Statement::Block(block) | Statement::UncheckedBlock(block) => self.block(block),
            Statement::VariableDeclarationStatement(decl) => {
                for declaration in decl.declarations.iter().flatten() {
                    self.stack.push(Operand::VariableDeclaration {
                        name: declaration.name.clone(),
                        type_name: declaration.type_descriptions.type_string().to_string(),
                    });
                }
                if let Some(init) = &decl.initial_value {
                    self.expression(init);
                }
                self.end_variable_declaration_statement(decl, mark);
            }
            Statement::ExpressionStatement(s) => self.expression(&s.expression),
            Statement::Unsupported => tracing::debug!("skipping unsupported statement"),
        }
        self.stack.truncate(mark.operands);
    }

    fn end_variable_declaration_statement(
        &mut self,
        stmt: &ast::VariableDeclarationStatement,
        mark: Mark,
    ) {
        let produced = self.stack.drain_from(mark.operands);
        let result = match produced.as_slice() {
            [Operand::VariableDeclaration { name, type_name }] => {
                self.state.declare(name, type_name);
                Ok(())
            }
            [Operand::VariableDeclaration { name, type_name }, Operand::Literal(value)] => {
                self.state.declare_with(name, type_name, value)
            }
            [Operand::VariableDeclaration { name, type_name }, Operand::Identifier { name: source, .. }] => {
                match self.state.get(source).cloned() {
                    Some(value) => self.state.declare_with(name, type_name, &value),
                    None => {
                        tracing::debug!("{} is not a tracked variable, declaring {} with its zero value", source, name);
                        self.state.declare(name, type_name);
                        Ok(())
                    }
                }
            }
            other => {
                let shape: Vec<&str> = other.iter().map(Operand::kind).collect();
                self.report_shape(
                    mark,
                    format!("cannot declare a variable from [{}]", shape.join(", ")),
                    stmt.src,
                );
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report(&err, stmt.src);
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(lit) => self.end_literal(lit),
            Expression::Identifier(ident) => self.stack.push(Operand::Identifier {
                name: ident.name.clone(),
                type_name: ident.type_descriptions.type_string().to_string(),
            }),
            Expression::MemberAccess(access) => {
                self.expression(&access.expression);
                self.stack.push(Operand::MemberAccess {
                    member_name: access.member_name.clone(),
                    type_name: access.type_descriptions.type_string().to_string(),
                });
            }
            Expression::BinaryOperation(op) => {
                let mark = self.mark();
                self.expression(&op.left_expression);
                self.expression(&op.right_expression);
                self.end_binary_operation(op, mark);
            }
            Expression::UnaryOperation(op) => {
                let mark = self.mark();
                self.expression(&op.sub_expression);
                self.end_unary_operation(op, mark);
            }
            Expression::Assignment(assignment) => {
                let mark = self.mark();
                self.expression(&assignment.left_hand_side);
                self.expression(&assignment.right_hand_side);
                self.end_assignment(assignment, mark);
            }
            Expression::TupleExpression(tuple) => {
                for component in tuple.components.iter().flatten() {
                    self.expression(component);
                }
            }
            Expression::FunctionCall(call) => {
                let mark = self.mark();
                self.expression(&call.expression);
                let mut marks = CallMarks {
                    call: mark,
                    arguments: self.stack.mark(),
                    valueless: None,
                };
                for (index, argument) in call.arguments.iter().enumerate() {
                    let before = self.stack.mark();
                    self.expression(argument);
                    if self.stack.len() != before + 1 && marks.valueless.is_none() {
                        marks.valueless = Some(index);
                    }
                }
                self.end_function_call(call, marks);
            }
            Expression::NewExpression(_) => {}
            Expression::IndexAccess(access) => {
                self.expression(&access.base_expression);
                if let Some(index) = &access.index_expression {
                    self.expression(index);
                }
            }
            Expression::Unsupported => tracing::debug!("skipping unsupported expression"),
        }
    }

    fn end_literal(&mut self, lit: &ast::Literal) {
        let category = lit.type_descriptions.category();
        let mut value = lit.text();
        if let Some(unit) = &lit.subdenomination {
            match literal::denominate(&value, unit) {
                Ok(scaled) => value = scaled,
                Err(err) => self.report(&err, lit.src),
            }
        }
        self.stack.push(Literal::new(category, value));
    }

    fn end_binary_operation(&mut self, op: &ast::BinaryOperation, mark: Mark) {
        let produced = self.stack.drain_from(mark.operands);
        let [left, right]: [Operand; 2] = match produced.try_into() {
            Ok(pair) => pair,
            Err(produced) => {
                let produced: Vec<Operand> = produced;
                self.report_shape(
                    mark,
                    format!(
                        "'{}' expects two operands, found {}",
                        op.operator,
                        produced.len()
                    ),
                    op.src,
                );
                return;
            }
        };

        let result = self
            .resolve(left)
            .and_then(|l| self.resolve(right).map(|r| (l, r)))
            .and_then(|pair| match pair {
                (Operand::Literal(l), Operand::Literal(r)) => {
                    literal::evaluate(&l, &op.operator, &r)
                }
                (l, r) => Err(EvalError::UnsupportedExpression(format!(
                    "cannot apply '{}' to {} and {}",
                    op.operator,
                    l.kind(),
                    r.kind()
                ))),
            });
        match result {
            Ok(value) => self.stack.push(value),
            Err(err) => self.report(&err, op.src),
        }
    }

    fn end_unary_operation(&mut self, op: &ast::UnaryOperation, mark: Mark) {
        let produced = self.stack.drain_from(mark.operands);
        let Ok([operand]) = <[Operand; 1]>::try_from(produced) else {
            tracing::debug!("'{}' has no single operand, skipping", op.operator);
            return;
        };

        let result = match (op.operator.as_str(), operand) {
            ("++" | "--" | "delete", Operand::Identifier { name, .. }) => {
                self.update_in_place(&name, &op.operator, op.prefix)
            }
            (operator, operand) => self
                .resolve_literal(operand)
                .and_then(|value| literal::evaluate_unary(operator, &value))
                .map(Some),
        };
        match result {
            Ok(Some(value)) => self.stack.push(value),
            Ok(None) => {}
            Err(err) => self.report(&err, op.src),
        }
    }

    /// `++x`, `x--`, `delete x`. Returns the value the expression yields;
    /// names outside the variable table are left alone.
    fn update_in_place(
        &mut self,
        name: &str,
        operator: &str,
        prefix: bool,
    ) -> Result<Option<Literal>, EvalError> {
        let Some(current) = self.state.get(name).cloned() else {
            tracing::debug!("{} is not a tracked variable, skipping '{}'", name, operator);
            return Ok(None);
        };
        if operator == "delete" {
            self.state
                .assign(name, &state::default_value(current.category))?;
            return Ok(None);
        }
        let updated = literal::evaluate_unary(operator, &current)?;
        self.state.assign(name, &updated)?;
        let stored = self.state.get(name).cloned();
        Ok(if prefix { stored } else { Some(current) })
    }

    /// Assignments update tracked variables from values that resolve. Other
    /// targets and value-less right-hand sides (calls) are skipped.
    fn end_assignment(&mut self, assignment: &ast::Assignment, mark: Mark) {
        let produced = self.stack.drain_from(mark.operands);
        let (name, value) = match <[Operand; 2]>::try_from(produced) {
            Ok([Operand::Identifier { name, .. }, value]) if self.state.contains(&name) => {
                (name, value)
            }
            Ok([target, _]) => {
                tracing::debug!(
                    "{} is not a tracked variable, skipping '{}'",
                    target,
                    assignment.operator
                );
                return;
            }
            Err(produced) => {
                tracing::debug!(
                    "'{}' over {} operands, skipping",
                    assignment.operator,
                    produced.len()
                );
                return;
            }
        };
        let rhs = match self.resolve(value) {
            Ok(Operand::Literal(lit)) => lit,
            Ok(other) => {
                tracing::debug!("{} is not a value, skipping assignment to {}", other, name);
                return;
            }
            Err(err) => {
                tracing::debug!("{}, skipping assignment to {}", err, name);
                return;
            }
        };

        if let Err(err) = self.assign(&name, &assignment.operator, rhs) {
            self.report(&err, assignment.src);
        }
    }

    fn assign(&mut self, name: &str, operator: &str, rhs: Literal) -> Result<(), EvalError> {
        let new_value = match operator.strip_suffix('=') {
            Some("") => rhs,
            Some(binary) => {
                let current = self
                    .state
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))?;
                literal::evaluate(&current, binary, &rhs)?
            }
            None => {
                return Err(EvalError::UnsupportedExpression(format!(
                    "unknown assignment operator '{}'",
                    operator
                )))
            }
        };
        self.state.assign(name, &new_value)
    }

    // ── Identifier resolution ───────────────────────────────────────────

    /// Replace a variable reference by the literal view of its value.
    fn resolve(&self, operand: Operand) -> Result<Operand, EvalError> {
        match operand {
            Operand::Identifier { name, .. } => self
                .state
                .get(&name)
                .cloned()
                .map(Operand::Literal)
                .ok_or(EvalError::UnknownVariable(name)),
            other => Ok(other),
        }
    }

    fn resolve_literal(&self, operand: Operand) -> Result<Literal, EvalError> {
        match self.resolve(operand)? {
            Operand::Literal(lit) => Ok(lit),
            other => Err(EvalError::UnsupportedExpression(format!(
                "{} is not a value",
                other.kind()
            ))),
        }
    }
}
