use std::fmt;

use serde::{Serialize, Serializer};

use crate::ast::Category;

/// A typed constant: the category reported by the type checker plus the
/// literal's textual value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Literal {
    #[serde(serialize_with = "category_as_str")]
    pub category: Category,
    pub value: String,
}

impl Literal {
    pub fn new(category: Category, value: impl Into<String>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(Category::Bool, value.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Category::StringLiteral | Category::String => write!(f, "\"{}\"", self.value),
            _ => write!(f, "{}", self.value),
        }
    }
}

fn category_as_str<S: Serializer>(category: &Category, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(category)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    Literal(Literal),
    Identifier { name: String, type_name: String },
    MemberAccess { member_name: String, type_name: String },
    VariableDeclaration { name: String, type_name: String },
}

impl Operand {
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Literal(_) => "literal",
            Operand::Identifier { .. } => "identifier",
            Operand::MemberAccess { .. } => "member access",
            Operand::VariableDeclaration { .. } => "variable declaration",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => write!(f, "{}", lit),
            Operand::Identifier { name, .. } => write!(f, "{}", name),
            Operand::MemberAccess { member_name, .. } => write!(f, ".{}", member_name),
            Operand::VariableDeclaration { name, type_name } => {
                write!(f, "{} {}", type_name, name)
            }
        }
    }
}

impl From<Literal> for Operand {
    fn from(lit: Literal) -> Self {
        Operand::Literal(lit)
    }
}

/// LIFO stack of operands produced during the post-order walk.
#[derive(Debug, Default)]
pub struct OperandStack {
    entries: Vec<Operand>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operand: impl Into<Operand>) {
        self.entries.push(operand.into());
    }

    pub fn pop(&mut self) -> Option<Operand> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&Operand> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Remove and return everything pushed since `mark`, oldest first.
    pub fn drain_from(&mut self, mark: usize) -> Vec<Operand> {
        if mark >= self.entries.len() {
            return Vec::new();
        }
        self.entries.split_off(mark)
    }

    pub fn truncate(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }

    /// Pop the top `n` operands and return them in push order, which for
    /// call arguments is their left-to-right source order.
    ///
    /// Returns `None` and leaves the stack untouched if fewer than `n`
    /// operands are present above `floor`.
    pub fn collect_call_arguments(&mut self, n: usize, floor: usize) -> Option<Vec<Operand>> {
        if self.entries.len() < floor + n {
            return None;
        }
        let mut popped = Vec::with_capacity(n);
        for _ in 0..n {
            popped.push(self.entries.pop()?);
        }
        popped.reverse();
        Some(popped)
    }
}
