use regex::Regex;

use super::{FunctionDefinition, SourceUnit, SourceUnitPart};

/// A test function found in a source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Enclosing contract, `None` for free functions.
    pub contract: Option<String>,
    pub name: String,
}

/// Find the first function named `name`, searching contracts in declaration
/// order and then free functions.
pub fn find_function<'a>(unit: &'a SourceUnit, name: &str) -> Option<&'a FunctionDefinition> {
    unit.contracts()
        .flat_map(|c| c.functions())
        .find(|f| f.name == name)
        .or_else(|| free_functions(unit).find(|f| f.name == name))
}

/// Like [`find_function`] but tries the named contract first.
pub fn find_function_in<'a>(
    unit: &'a SourceUnit,
    contract: &str,
    name: &str,
) -> Option<&'a FunctionDefinition> {
    unit.contracts()
        .filter(|c| c.name == contract)
        .flat_map(|c| c.functions())
        .find(|f| f.name == name)
        .or_else(|| find_function(unit, name))
}

/// List every function whose name matches `pattern`, in source order.
pub fn discover_tests(unit: &SourceUnit, pattern: &Regex) -> Vec<TestCase> {
    let mut cases = Vec::new();
    for part in &unit.nodes {
        match part {
            SourceUnitPart::ContractDefinition(contract) => {
                for function in contract.functions() {
                    if pattern.is_match(&function.name) {
                        cases.push(TestCase {
                            contract: Some(contract.name.clone()),
                            name: function.name.clone(),
                        });
                    }
                }
            }
            SourceUnitPart::FunctionDefinition(function) => {
                if pattern.is_match(&function.name) {
                    cases.push(TestCase {
                        contract: None,
                        name: function.name.clone(),
                    });
                }
            }
            SourceUnitPart::Other => {}
        }
    }
    cases
}

fn free_functions(unit: &SourceUnit) -> impl Iterator<Item = &FunctionDefinition> {
    unit.nodes.iter().filter_map(|part| match part {
        SourceUnitPart::FunctionDefinition(f) => Some(f),
        _ => None,
    })
}
