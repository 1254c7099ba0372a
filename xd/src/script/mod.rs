//! Payload execution
//!
//! Received payloads are never evaluated as host code. They are parsed into a
//! flat list of builtin calls and each call is dispatched to a [`Builtin`]
//! registered with the local [`Interpreter`].

mod builtin;
mod command;
mod error;
mod interpreter;
mod parser;

pub use builtin::{Builtin, ErrorBuiltin, LogBuiltin, PrintBuiltin, SourceNameBuiltin};
pub use command::{Command, ExecContext};
pub use error::ScriptError;
pub use interpreter::Interpreter;
pub use parser::{Arg, Call, parse};
