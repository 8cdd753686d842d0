use std::fmt;

use crate::error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    AssertionFailure,
    TypeMismatch,
    UnsupportedExpression,
    UnsupportedOperator,
    UnknownVariable,
    InvalidLiteral,
    Overflow,
    DivisionByZero,
    HarnessFailure,
}

impl From<&EvalError> for DiagnosticKind {
    fn from(err: &EvalError) -> Self {
        match err {
            EvalError::TypeMismatch { .. } | EvalError::InvalidConversion { .. } => {
                DiagnosticKind::TypeMismatch
            }
            EvalError::UnsupportedOperator { .. } => DiagnosticKind::UnsupportedOperator,
            EvalError::DivisionByZero => DiagnosticKind::DivisionByZero,
            EvalError::Overflow { .. } => DiagnosticKind::Overflow,
            EvalError::InvalidLiteral { .. } => DiagnosticKind::InvalidLiteral,
            EvalError::UnknownVariable(_) => DiagnosticKind::UnknownVariable,
            EvalError::UnsupportedExpression(_) => DiagnosticKind::UnsupportedExpression,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: String,
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// Failures collected while walking one test function. Empty means the
/// test passed.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assertion primitive: records `message` when `check` is false.
    pub fn require(&mut self, check: bool, message: impl Into<String>, file: &str, line: usize) {
        if !check {
            self.record(DiagnosticKind::AssertionFailure, message, file, line);
        }
    }

    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        file: &str,
        line: usize,
    ) {
        self.entries.push(Diagnostic {
            kind,
            message: message.into(),
            file: file.to_string(),
            line,
        });
    }

    pub fn record_eval(&mut self, err: &EvalError, file: &str, line: usize) {
        self.record(DiagnosticKind::from(err), err.to_string(), file, line);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// The accumulated buffer: one entry per line.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `<buffer>: <contract> <testcase> <file>:<line>`
    pub fn finalize(&self, contract: &str, testcase: &str, file: &str, line: usize) -> String {
        format!(
            "{}: {} {} {}:{}",
            self.render(),
            contract,
            testcase,
            file,
            line
        )
    }
}
