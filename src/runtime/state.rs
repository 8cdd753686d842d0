use std::collections::HashMap;

use super::literal;
use super::operand::Literal;
use crate::ast::Category;
use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    type_name: String,
    value: Literal,
}

/// Symbolic values of the variables declared by one test function.
#[derive(Debug, Default)]
pub struct VariableState {
    bindings: HashMap<String, Binding>,
}

impl VariableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with the zero value of its type.
    pub fn declare(&mut self, name: &str, type_name: &str) {
        let value = default_value(Category::from_type_string(type_name));
        self.bindings.insert(
            name.to_string(),
            Binding {
                type_name: type_name.to_string(),
                value,
            },
        );
    }

    /// Declare `name` and initialise it with `value` converted to the
    /// declared type. On a failed conversion nothing is stored.
    pub fn declare_with(
        &mut self,
        name: &str,
        type_name: &str,
        value: &Literal,
    ) -> Result<(), EvalError> {
        let value = literal::coerce(value, Category::from_type_string(type_name))?;
        self.bindings.insert(
            name.to_string(),
            Binding {
                type_name: type_name.to_string(),
                value,
            },
        );
        Ok(())
    }

    /// Overwrite an existing variable, converting to its declared type.
    pub fn assign(&mut self, name: &str, value: &Literal) -> Result<(), EvalError> {
        let binding = self
            .bindings
            .get_mut(name)
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))?;
        binding.value = literal::coerce(value, binding.value.category)?;
        Ok(())
    }

    /// Literal view of the stored value.
    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.bindings.get(name).map(|b| &b.value)
    }

    pub fn type_name(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(|b| b.type_name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Zero value of a category, as a freshly declared variable holds it.
pub fn default_value(category: Category) -> Literal {
    let value = match category {
        Category::Bool => "false".to_string(),
        Category::Integer { .. } | Category::RationalNumber => "0".to_string(),
        Category::Address => format!("0x{}", "0".repeat(40)),
        Category::FixedBytes(n) => format!("0x{}", "0".repeat(n as usize * 2)),
        Category::String
        | Category::StringLiteral
        | Category::Contract
        | Category::Other => String::new(),
    };
    Literal::new(category, value)
}
