use super::literal;
use super::operand::Operand;
use super::{CallMarks, Frame, Mark};
use crate::ast::span::extract_call_span;
use crate::ast::{Category, FunctionCall};
use crate::diagnostics::DiagnosticKind;
use crate::error::EvalError;

impl Frame<'_> {
    pub(super) fn end_function_call(&mut self, call: &FunctionCall, marks: CallMarks) {
        let (text, line) = match extract_call_span(call.src, self.context.source) {
            Some(span) if !self.context.source.is_empty() => (span.text, span.line),
            _ => (format!("<call at {}>", call.src), self.context.line),
        };
        tracing::debug!("- {}...", text);

        let arguments = match marks.valueless {
            None => self
                .stack
                .collect_call_arguments(call.arguments.len(), marks.arguments),
            Some(_) => None,
        };
        self.stack.truncate(marks.arguments);
        let callee = self.stack.drain_from(marks.call.operands);

        match (arguments, marks.valueless) {
            (Some(arguments), _) => self.classify(&callee, arguments, &text, line),
            (None, Some(index)) => self.valueless_argument(&callee, index, &text, line, marks.call),
            (None, None) => tracing::debug!("call operands incomplete, ignoring '{}'", text),
        }
        tracing::debug!("- {}... done", text);
    }

    fn classify(&mut self, callee: &[Operand], arguments: Vec<Operand>, text: &str, line: usize) {
        if let Some(member) = self.harness_member(callee) {
            self.dispatch_harness(member, arguments, line);
            return;
        }
        match callee {
            [Operand::Identifier { name, .. }] if name == "assert" => {
                if arguments.len() == 1 {
                    self.dispatch_assert(arguments, text, line);
                } else {
                    tracing::debug!("ignoring assert with {} arguments", arguments.len());
                }
            }
            [.., Operand::MemberAccess { member_name, .. }] => {
                tracing::debug!("ignoring member call .{} on {}", member_name, callee[0])
            }
            [.., other] => tracing::debug!("ignoring unrecognized call to {}", other),
            [] => tracing::debug!("ignoring call to an unsupported callee"),
        }
    }

    /// Member name when `callee` is exactly `<harness>.<member>`.
    fn harness_member<'c>(&self, callee: &'c [Operand]) -> Option<&'c str> {
        match callee {
            [Operand::Identifier { name, type_name }, Operand::MemberAccess { member_name, .. }]
                if self.identity.matches(name, type_name) =>
            {
                Some(member_name)
            }
            _ => None,
        }
    }

    /// A harness call is never forwarded with a missing argument. Other calls
    /// are ignored as usual.
    fn valueless_argument(
        &mut self,
        callee: &[Operand],
        index: usize,
        text: &str,
        line: usize,
        mark: Mark,
    ) {
        if self.harness_member(callee).is_none() || self.children_failed(mark) {
            tracing::debug!("argument {} of '{}' has no value, ignoring", index + 1, text);
            return;
        }
        let err = EvalError::UnsupportedExpression(format!(
            "argument {} of '{}' has no value",
            index + 1,
            text
        ));
        let file = self.context.file.clone();
        self.diagnostics.record_eval(&err, &file, line);
    }

    fn dispatch_assert(&mut self, arguments: Vec<Operand>, text: &str, line: usize) {
        let file = self.context.file.clone();
        let Some(argument) = arguments.into_iter().next() else {
            return;
        };
        let literal = match argument {
            Operand::Literal(lit) => lit,
            Operand::Identifier { name, .. } => match self.state.get(&name) {
                Some(lit) => lit.clone(),
                None => {
                    self.diagnostics
                        .record_eval(&EvalError::UnknownVariable(name), &file, line);
                    return;
                }
            },
            other => {
                tracing::warn!("ignoring assert on {} in '{}'", other.kind(), text);
                return;
            }
        };
        if literal.category != Category::Bool {
            tracing::warn!("ignoring assert on {} value in '{}'", literal.category, text);
            return;
        }

        match literal::parse_bool(&literal.value) {
            Some(check) => {
                self.diagnostics
                    .require(check, format!("{} failed.", text), &file, line)
            }
            None => self.diagnostics.record(
                DiagnosticKind::InvalidLiteral,
                format!("{}: cannot read '{}' as bool", text, literal.value),
                &file,
                line,
            ),
        }
    }

    fn dispatch_harness(&mut self, member: &str, arguments: Vec<Operand>, line: usize) {
        let arguments: Vec<Operand> = arguments
            .into_iter()
            .map(|argument| {
                let bound = match &argument {
                    Operand::Identifier { name, .. } => self.state.get(name).cloned(),
                    _ => None,
                };
                bound.map(Operand::Literal).unwrap_or(argument)
            })
            .collect();

        tracing::debug!(member, arguments = arguments.len(), "forwarding call to harness");
        if let Err(err) = self.harness.call(member, &arguments) {
            tracing::warn!("{}", err);
            let file = self.context.file.clone();
            self.diagnostics
                .record(DiagnosticKind::HarnessFailure, err.to_string(), &file, line);
        }
    }
}
