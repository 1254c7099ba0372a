//! Command - an opaque payload and its execution

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::channel::{Address, Side};

use super::error::ScriptError;
use super::interpreter::Interpreter;
use super::parser::{Call, parse};

/// State visible to builtins while one payload runs
pub struct ExecContext<'a> {
    interpreter: &'a Interpreter,
    side: Side,
    address: &'a Address,
    output: Vec<String>,
}

impl<'a> ExecContext<'a> {
    pub fn new(interpreter: &'a Interpreter, side: Side, address: &'a Address) -> Self {
        Self {
            interpreter,
            side,
            address,
            output: Vec::new(),
        }
    }

    /// Side executing the payload
    pub fn side(&self) -> Side {
        self.side
    }

    /// Address the payload arrived on
    pub fn address(&self) -> &Address {
        self.address
    }

    /// Append a line to the captured output
    pub fn emit(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }
}

/// Payload text received over a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    source: String,
}

impl Command {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse without executing
    pub fn calls(&self) -> Result<Vec<Call>, ScriptError> {
        parse(&self.source)
    }

    /// Parse and run every call in order, stopping at the first failure
    ///
    /// Nothing runs if the payload does not parse. A panicking builtin is
    /// reported as [`ScriptError::Panicked`].
    pub fn execute(&self, ctx: &mut ExecContext<'_>) -> Result<(), ScriptError> {
        let calls = self.calls()?;
        debug!(calls = calls.len(), side = %ctx.side, "Command::execute: parsed");

        let interpreter = ctx.interpreter;
        for call in &calls {
            let builtin = interpreter.builtin(&call.name).ok_or_else(|| ScriptError::UnknownBuiltin {
                name: call.name.clone(),
            })?;

            panic::catch_unwind(AssertUnwindSafe(|| builtin.call(&call.args, ctx))).map_err(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                ScriptError::Panicked(format!("{} (line {}): {}", call.name, call.line, message))
            })??;
        }
        Ok(())
    }
}

impl From<String> for Command {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for Command {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}
