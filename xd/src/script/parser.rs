//! Payload parser
//!
//! Payloads are a flat list of builtin calls:
//!
//! ```text
//! print("hello from python", 42)   # comment
//! log("warn", "low disk"); print_source_name(t.source)
//! ```
//!
//! Statements are separated by `;` or newlines. Arguments are string, integer,
//! float, `true`/`false`/`nil` literals, or bare dotted identifiers that the
//! builtin interprets. `#` and `--` start a comment.

use std::fmt;

use super::error::ScriptError;

/// A single call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    /// Bare identifier or dotted path, e.g. `t.source`
    Ident(String),
}

impl Arg {
    /// Name of the argument's type for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Str(_) => "string",
            Arg::Int(_) => "integer",
            Arg::Float(_) => "float",
            Arg::Bool(_) => "boolean",
            Arg::Nil => "nil",
            Arg::Ident(_) => "identifier",
        }
    }

    /// String contents, if this is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => write!(f, "{}", s),
            Arg::Int(n) => write!(f, "{}", n),
            Arg::Float(x) => write!(f, "{}", x),
            Arg::Bool(b) => write!(f, "{}", b),
            Arg::Nil => write!(f, "nil"),
            Arg::Ident(name) => write!(f, "{}", name),
        }
    }
}

/// One parsed statement
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
    /// 1-based source line of the call
    pub line: usize,
}

/// Parse a payload into its calls
pub fn parse(source: &str) -> Result<Vec<Call>, ScriptError> {
    Parser::new(source).program()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn at_comment(&self) -> bool {
        matches!(
            (self.peek(), self.peek_at(1)),
            (Some('#'), _) | (Some('-'), Some('-'))
        )
    }

    /// Skip spaces, tabs, and comments; stops at newlines
    fn skip_inline_space(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.bump();
                }
                Some(_) if self.at_comment() => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_space_and_newlines(&mut self) {
        loop {
            self.skip_inline_space();
            if self.peek() == Some('\n') {
                self.bump();
            } else {
                return;
            }
        }
    }

    fn program(&mut self) -> Result<Vec<Call>, ScriptError> {
        let mut calls = Vec::new();

        loop {
            loop {
                self.skip_inline_space();
                match self.peek() {
                    Some(';') | Some('\n') => {
                        self.bump();
                    }
                    _ => break,
                }
            }

            if self.peek().is_none() {
                return Ok(calls);
            }

            calls.push(self.call()?);

            self.skip_inline_space();
            match self.peek() {
                None | Some(';') | Some('\n') => {}
                Some(c) => return Err(self.error(format!("expected ';' or newline, found '{}'", c))),
            }
        }
    }

    fn ident(&mut self) -> Result<String, ScriptError> {
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            Some(c) => return Err(self.error(format!("expected identifier, found '{}'", c))),
            None => return Err(self.error("expected identifier, found end of input")),
        }

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(name)
    }

    fn expect(&mut self, expected: char) -> Result<(), ScriptError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn call(&mut self) -> Result<Call, ScriptError> {
        let line = self.line;
        let name = self.ident()?;
        self.skip_inline_space();
        self.expect('(')?;
        let args = self.args()?;
        self.expect(')')?;
        Ok(Call { name, args, line })
    }

    fn args(&mut self) -> Result<Vec<Arg>, ScriptError> {
        let mut args = Vec::new();
        self.skip_space_and_newlines();
        if self.peek() == Some(')') {
            return Ok(args);
        }

        loop {
            args.push(self.expr()?);
            self.skip_space_and_newlines();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    self.skip_space_and_newlines();
                }
                Some(')') => return Ok(args),
                Some(c) => return Err(self.error(format!("expected ',' or ')', found '{}'", c))),
                None => return Err(self.error("unterminated argument list")),
            }
        }
    }

    fn expr(&mut self) -> Result<Arg, ScriptError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.string(q),
            Some(c) if c.is_ascii_digit() => self.number(),
            Some('-') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.path(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self, quote: char) -> Result<Arg, ScriptError> {
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(Arg::Str(value)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '"' | '\'')) => c,
                        Some(c) => return Err(self.error(format!("unknown escape '\\{}'", c))),
                        None => return Err(self.error("unterminated string")),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Arg, ScriptError> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !is_float && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                is_float = true;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }

        if is_float {
            text.parse::<f64>()
                .map(Arg::Float)
                .map_err(|_| self.error(format!("invalid number '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Arg::Int)
                .map_err(|_| self.error(format!("integer out of range '{}'", text)))
        }
    }

    fn path(&mut self) -> Result<Arg, ScriptError> {
        let mut path = self.ident()?;
        while self.peek() == Some('.') {
            self.bump();
            path.push('.');
            path.push_str(&self.ident()?);
        }

        Ok(match path.as_str() {
            "true" => Arg::Bool(true),
            "false" => Arg::Bool(false),
            "nil" | "None" => Arg::Nil,
            _ => Arg::Ident(path),
        })
    }
}
