use serde::Serialize;
use thiserror::Error;

use super::operand::Operand;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("harness has no method '{0}'")]
    UnknownMethod(String),
    #[error("harness call '{member}' failed: {reason}")]
    Failed { member: String, reason: String },
}

/// Receiver of dispatched member calls. Calls are synchronous: a call has
/// finished, successfully or not, by the time `call` returns.
pub trait Harness {
    fn call(&mut self, member: &str, arguments: &[Operand]) -> Result<(), HarnessError>;
}

impl<H: Harness + ?Sized> Harness for &mut H {
    fn call(&mut self, member: &str, arguments: &[Operand]) -> Result<(), HarnessError> {
        (**self).call(member, arguments)
    }
}

/// One dispatched call, arguments in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessCall {
    pub member: String,
    pub arguments: Vec<Operand>,
}

/// Harness that records every call it receives. When built with
/// [`RecordingHarness::with_methods`] it rejects members outside that list.
#[derive(Debug, Default)]
pub struct RecordingHarness {
    calls: Vec<HarnessCall>,
    methods: Option<Vec<String>>,
}

impl RecordingHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_methods(methods: &[&str]) -> Self {
        Self {
            calls: Vec::new(),
            methods: Some(methods.iter().map(|m| m.to_string()).collect()),
        }
    }

    pub fn calls(&self) -> &[HarnessCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<HarnessCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Harness for RecordingHarness {
    fn call(&mut self, member: &str, arguments: &[Operand]) -> Result<(), HarnessError> {
        if let Some(methods) = &self.methods {
            if !methods.iter().any(|m| m == member) {
                return Err(HarnessError::UnknownMethod(member.to_string()));
            }
        }
        self.calls.push(HarnessCall {
            member: member.to_string(),
            arguments: arguments.to_vec(),
        });
        Ok(())
    }
}

/// Name and declared type a receiver must have for member calls on it to be
/// forwarded to the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessIdentity {
    pub name: String,
    pub type_name: String,
}

impl Default for HarnessIdentity {
    fn default() -> Self {
        Self {
            name: "soltest".to_string(),
            type_name: "contract Soltest".to_string(),
        }
    }
}

impl HarnessIdentity {
    pub fn matches(&self, name: &str, type_name: &str) -> bool {
        self.name == name && self.type_name == type_name
    }
}
