//! Canonical source text for scripts.
//!
//! Output is one statement per line, tokens separated by a single space,
//! nested blocks indented two spaces per level and strings double-quoted.
//! Parsing the output yields a script equal to the input.

use std::fmt::Write;

use gemscript_foundation::Value;

use crate::script::Script;
use crate::token::{Statement, Token, PRAGMA};

const INDENT: &str = "  ";

/// Serialize a whole script.
pub fn to_text(script: &Script) -> String {
    let mut out = String::new();
    for statement in script.statements() {
        write_statement(&mut out, script, statement, 0);
    }
    out
}

/// Serialize one statement (and any blocks it opens) at the given level.
pub fn statement_to_text(script: &Script, statement: &Statement, level: usize) -> String {
    let mut out = String::new();
    write_statement(&mut out, script, statement, level);
    out
}

fn write_statement(out: &mut String, script: &Script, statement: &Statement, level: usize) {
    push_indent(out, level);
    for (i, token) in statement.tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_token(out, script, token, level);
    }
    out.push('\n');
}

fn write_token(out: &mut String, script: &Script, token: &Token, level: usize) {
    match token {
        Token::Identifier(name) if name == PRAGMA => out.push('#'),
        Token::Identifier(name) => out.push_str(name),
        Token::ObjRef(parts) => out.push_str(&parts.join(".")),
        Token::Literal(value) => write_literal(out, value),
        Token::Block(id) => {
            out.push_str("[[\n");
            for nested in script.block(*id).unwrap_or(&[]) {
                write_statement(out, script, nested, level + 1);
            }
            push_indent(out, level);
            out.push_str("]]");
        }
    }
}

fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}
