//! Crate-wide error type.
//!
//! Every fallible entry point in the lexer and interpreter returns
//! `Result<_, Error>`. `Status::Return` is deliberately kept out of this
//! type: a `return` statement is a control-flow signal, not a failure, and
//! unwinds only as far as the enclosing function call (see
//! [`crate::interpreter::Status`]).

use std::fmt::{self, Display};

use colored::Colorize;

/// Coarse category matching the taxonomy in the specification's error
/// handling section: lexical, syntactic, semantic, and structural failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    Semantic,
    Structural,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntactic => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::Structural => "structural error",
        };
        f.write_str(name)
    }
}

/// A single non-recoverable error, tagged with the source line it was
/// raised on. There is no recovery and no continuation after an `Error` is
/// produced; it unwinds straight to the top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub line: u32,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, line: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn lexical(line: u32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, line, message)
    }

    pub fn syntactic(line: u32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntactic, line, message)
    }

    pub fn semantic(line: u32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, line, message)
    }

    pub fn structural(line: u32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, line, message)
    }

    /// Render the error with the offending line highlighted, the way the
    /// teacher's `ParseError` points a caret under a `Span`. We only ever
    /// have a line number (not a column range) to work with here, so the
    /// whole line is highlighted rather than a sub-span.
    pub fn render(&self, source: &str) -> String {
        let lines: Vec<&str> = source.lines().collect();
        let idx = self.line.saturating_sub(1) as usize;
        let Some(line_str) = lines.get(idx) else {
            return format!("{}: {}", self.kind, self.message);
        };

        let margin = format!("{}", self.line).len();
        let fill: String = std::iter::repeat(' ').take(margin).collect();

        format!(
            "{fill} |\n{line} |{line_str}\n{fill} |{underline}\n{fill} = {kind}: {message}",
            line = self.line,
            underline = "^".repeat(line_str.len().max(1)).red(),
            kind = self.kind,
            message = self.message,
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on line {}: {}", self.kind, self.line, self.message)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::structural(0, format!("io error: {value}"))
    }
}
