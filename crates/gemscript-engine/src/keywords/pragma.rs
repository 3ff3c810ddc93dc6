//! `#` pragmas: blueprint name, tags and program selection.
//!
//! ```text
//! # BLUEPRINT Fish
//! # TAG isCharControllable true
//! # PROGRAM UPDATE
//! ```
//!
//! A `TAG` without a value is `true`.

use gemscript_ast::{Statement, Token};
use gemscript_foundation::{ProgramKind, Value};
use gemscript_symbols::{SymbolError, SymbolHelper};

use super::{extra_tokens, missing, CompileCx, TokenDiagnostic};
use crate::error::CompileError;

const DIRECTIVES: &[&str] = &["BLUEPRINT", "TAG", "PROGRAM"];

pub(super) fn validate(_helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    let Some(directive) = statement.token(1) else {
        return vec![missing(1, "pragma directive")];
    };
    let Some(directive) = directive.identifier() else {
        return vec![TokenDiagnostic::new(1, SymbolError::noparse("pragma directive must be a name"))];
    };
    if !DIRECTIVES.contains(&directive) {
        return vec![TokenDiagnostic::new(
            1,
            SymbolError::noexist(format!("unknown pragma '{}'", directive)),
        )];
    }

    let mut diagnostics = Vec::new();
    match statement.token(2) {
        None => diagnostics.push(missing(2, "pragma value")),
        Some(token) if token.identifier().is_none() => diagnostics.push(TokenDiagnostic::new(
            2,
            SymbolError::noparse(format!("expected a name, found {}", token.kind().name())),
        )),
        Some(_) => {}
    }
    if directive == "TAG" {
        if let Some(token) = statement.token(3) {
            if token.literal_value().is_none() {
                diagnostics.push(TokenDiagnostic::new(
                    3,
                    SymbolError::noparse("tag value must be a literal"),
                ));
            }
        }
        diagnostics.extend(extra_tokens(statement, 4));
    } else {
        diagnostics.extend(extra_tokens(statement, 3));
    }
    diagnostics
}

pub(super) fn compile(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let directive = statement.token(1).and_then(Token::identifier).unwrap_or_default();
    let value = statement.token(2).and_then(Token::identifier).unwrap_or_default();
    match directive {
        "BLUEPRINT" => cx.set_name(value),
        "TAG" => {
            let tag = statement
                .token(3)
                .and_then(Token::literal_value)
                .cloned()
                .unwrap_or(Value::Boolean(true));
            cx.set_tag(value, tag)
        }
        "PROGRAM" => {
            let kind: ProgramKind = value
                .parse()
                .map_err(|_| CompileError::UnknownProgram(value.to_string()))?;
            cx.set_program(kind)
        }
        _ => Ok(()),
    }
}
