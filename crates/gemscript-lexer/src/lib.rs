// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Source ingestion for GEMSCRIPT.
//!
//! Turns blueprint source text into a [`Script`]. Lexing is done with
//! logos; [`parse_script`] groups the token stream into statements and
//! nested blocks.
//!
//! # Syntax
//!
//! - One statement per line, tokens separated by whitespace
//! - `//` starts a comment that runs to the end of the line
//! - A line starting with `#` is a pragma; its keyword token is `_pragma`
//! - `[[` opens a block and `]]` closes it; blocks may span lines and
//!   several may follow one another (`]] [[`)
//! - Literals: numbers, `"..."` or `'...'` strings, `true`, `false`, `null`
//!
//! # Examples
//!
//! ```
//! # use gemscript_lexer::parse_script;
//! let script = parse_script("# BLUEPRINT Fish\naddProp energy Number 10\n").unwrap();
//! assert_eq!(script.statements().len(), 2);
//! ```

mod parser;

use logos::Logos;

pub use parser::{parse_script, ParseError};

/// Lexical token of GEMSCRIPT source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")] // Skip horizontal whitespace
#[logos(skip r"//[^\n]*")] // Skip // comments
pub enum Token {
    /// Statement terminator.
    #[token("\n")]
    Newline,

    /// Pragma marker `#`, only valid at the start of a statement.
    #[token("#")]
    Hash,

    /// Block opener `[[`
    #[token("[[")]
    BlockOpen,

    /// Block closer `]]`
    #[token("]]")]
    BlockClose,

    /// Boolean literal
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),

    /// Keyword `null`
    #[token("null")]
    Null,

    /// Number literal (e.g. 5, -3, 0.25, 1e3). Literals outside the f64
    /// range are rejected.
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| {
        lex.slice().parse::<f64>().ok().filter(|n| n.is_finite())
    })]
    Number(f64),

    /// String literal in double or single quotes.
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| unquote(lex.slice()))]
    Str(String),

    /// Dotted object reference (e.g. `agent.Movement.direction`)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| {
        lex.slice().split('.').map(String::from).collect::<Vec<_>>()
    })]
    ObjRef(Vec<String>),

    /// Bare identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn unquote(s: &str) -> Option<String> {
    let content = s.get(1..s.len().saturating_sub(1))?;
    unescape_string(content)
}

/// Unescape the content of a string literal.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                // Unsupported escape or trailing backslash
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}
