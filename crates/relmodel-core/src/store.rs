//! The store executor capability.
//!
//! Concrete drivers live outside this workspace. The runtime hands them
//! rendered command text plus positional parameters and gets back either
//! rows or an affected-row count.

use std::fmt;

use crate::value::Value;
use crate::Result;

/// A named command parameter, e.g. `@p0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// What one executed command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreResult {
    /// Result rows, columns in select-list order.
    Rows(Vec<Vec<Value>>),
    /// Number of rows affected by a statement without a result set.
    AffectedCount(u64),
}

impl StoreResult {
    /// Rows affected: the count itself, or the number of returned rows.
    pub fn affected(&self) -> u64 {
        match self {
            StoreResult::Rows(rows) => rows.len() as u64,
            StoreResult::AffectedCount(count) => *count,
        }
    }
}

/// Executes store commands on behalf of the runtime.
pub trait StoreExecutor {
    /// Execute one rendered command.
    fn execute(&mut self, command_text: &str, parameters: &[Parameter]) -> Result<StoreResult>;
}

impl<E: StoreExecutor + ?Sized> StoreExecutor for &mut E {
    fn execute(&mut self, command_text: &str, parameters: &[Parameter]) -> Result<StoreResult> {
        (**self).execute(command_text, parameters)
    }
}
