//! Builtin trait and the standard builtins

use tracing::{debug, error, info, trace, warn};

use super::command::ExecContext;
use super::error::ScriptError;
use super::parser::Arg;

/// A named operation a payload may call
pub trait Builtin: Send + Sync {
    /// Name used in payloads
    fn name(&self) -> &'static str;

    /// Run the builtin with the parsed arguments
    fn call(&self, args: &[Arg], ctx: &mut ExecContext<'_>) -> Result<(), ScriptError>;
}

fn expect_arity(name: &str, args: &[Arg], expected: usize) -> Result<(), ScriptError> {
    if args.len() != expected {
        return Err(ScriptError::Arity {
            name: name.to_string(),
            expected: expected.to_string(),
            found: args.len(),
        });
    }
    Ok(())
}

fn expect_str<'a>(name: &str, args: &'a [Arg], index: usize) -> Result<&'a str, ScriptError> {
    args.get(index).and_then(Arg::as_str).ok_or_else(|| ScriptError::ArgType {
        name: name.to_string(),
        index,
        expected: "a string",
    })
}

/// `print(...)` - tab-joined arguments to the log and captured output
pub struct PrintBuiltin;

impl Builtin for PrintBuiltin {
    fn name(&self) -> &'static str {
        "print"
    }

    fn call(&self, args: &[Arg], ctx: &mut ExecContext<'_>) -> Result<(), ScriptError> {
        let line = args.iter().map(Arg::to_string).collect::<Vec<_>>().join("\t");
        info!(target: "crossdispatch::script", side = %ctx.side(), address = %ctx.address(), "{}", line);
        ctx.emit(line);
        Ok(())
    }
}

/// `log(level, message)` - message at the given tracing level
pub struct LogBuiltin;

impl Builtin for LogBuiltin {
    fn name(&self) -> &'static str {
        "log"
    }

    fn call(&self, args: &[Arg], ctx: &mut ExecContext<'_>) -> Result<(), ScriptError> {
        expect_arity(self.name(), args, 2)?;
        let level = expect_str(self.name(), args, 0)?;
        let message = args[1].to_string();
        let side = ctx.side();

        match level.to_lowercase().as_str() {
            "trace" => trace!(target: "crossdispatch::script", %side, "{}", message),
            "debug" => debug!(target: "crossdispatch::script", %side, "{}", message),
            "info" => info!(target: "crossdispatch::script", %side, "{}", message),
            "warn" | "warning" => warn!(target: "crossdispatch::script", %side, "{}", message),
            "error" => error!(target: "crossdispatch::script", %side, "{}", message),
            _ => {
                return Err(ScriptError::ArgType {
                    name: self.name().to_string(),
                    index: 0,
                    expected: "one of trace, debug, info, warn, error",
                });
            }
        }
        Ok(())
    }
}

/// `error(message)` - raise, aborting the rest of the payload
pub struct ErrorBuiltin;

impl Builtin for ErrorBuiltin {
    fn name(&self) -> &'static str {
        "error"
    }

    fn call(&self, args: &[Arg], _ctx: &mut ExecContext<'_>) -> Result<(), ScriptError> {
        let message = args.iter().map(Arg::to_string).collect::<Vec<_>>().join(" ");
        Err(ScriptError::Raised(message))
    }
}

/// `print_source_name(source)` - echo a host source reference
pub struct SourceNameBuiltin;

impl Builtin for SourceNameBuiltin {
    fn name(&self) -> &'static str {
        "print_source_name"
    }

    fn call(&self, args: &[Arg], ctx: &mut ExecContext<'_>) -> Result<(), ScriptError> {
        expect_arity(self.name(), args, 1)?;
        let line = format!("source: {}", args[0]);
        info!(target: "crossdispatch::script", side = %ctx.side(), "{}", line);
        ctx.emit(line);
        Ok(())
    }
}
