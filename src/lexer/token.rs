//! The symbol enumeration the lexer emits (spec §3 "Symbol", §6 keyword
//! table). Unlike the teacher's `Token` enum (one struct variant per kind,
//! each carrying its own `position` field) we keep position and lexeme text
//! out of `SymbolKind` and attach them once on `Symbol` — there is exactly
//! one content buffer and one line per symbol regardless of kind, so
//! duplicating that plumbing into every variant would just be noise.

use super::keys::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    // terminators
    Eol,
    Eof,
    Error,

    // commands
    String,
    Stringln,
    KeyCmd,
    Delay,
    Var,
    Hold,
    Release,
    If,
    ElseIf,
    Else,
    EndIf,
    While,
    EndWhile,
    Function,
    EndFunction,
    Return,

    // literals
    True,
    False,
    Number,

    // identifiers
    Variable,
    Name,

    // operators
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Shl,
    Shr,
    LParen,
    RParen,
    Comma,

    // payload tokens
    Key,
    StringPayload,

    Comment,
}

impl SymbolKind {
    pub fn is_terminator(self) -> bool {
        matches!(self, SymbolKind::Eol | SymbolKind::Eof | SymbolKind::Error)
    }
}

/// A lexed symbol: kind, line, the lexeme text (for identifiers, numbers,
/// string payloads, key names), and — for `Key` symbols only — the resolved
/// key enum value.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub content: String,
    pub line: u32,
    pub key: Option<Key>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, line: u32) -> Self {
        Self {
            kind,
            content: String::new(),
            line,
            key: None,
        }
    }

    pub fn with_content(kind: SymbolKind, line: u32, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            line,
            key: None,
        }
    }

    pub fn key(kind: SymbolKind, line: u32, content: impl Into<String>, key: Key) -> Self {
        Self {
            kind,
            content: content.into(),
            line,
            key: Some(key),
        }
    }
}

/// Maps a lowercased `Command`-mode identifier to its keyword kind, if any.
///
/// `"key"` is a crate-only convenience alias (`SymbolKind::KeyCmd`), not
/// part of spec.md's keyword list or the original source's grammar: the
/// normative key-tap statement starts directly with a bare key name (no
/// keyword at all), which this lexer already recognizes via `keys::lookup_key`
/// further down in `lex_command` and emits as a `SymbolKind::Key` symbol.
pub fn lookup_keyword(ident_lower: &str) -> Option<SymbolKind> {
    use SymbolKind::*;
    Some(match ident_lower {
        "string" => String,
        "stringln" => Stringln,
        "key" => KeyCmd,
        "delay" => Delay,
        "var" => Var,
        "hold" => Hold,
        "release" => Release,
        "if" => If,
        "else_if" => ElseIf,
        "else" => Else,
        "end_if" => EndIf,
        "while" => While,
        "end_while" => EndWhile,
        "function" => Function,
        "end_function" => EndFunction,
        "return" => Return,
        "true" => True,
        "false" => False,
        _ => return None,
    })
}
