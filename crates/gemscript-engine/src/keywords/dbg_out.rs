//! `dbgOut <literal…>`: log a message for the running agent.

use gemscript_ast::{Statement, Token};
use gemscript_symbols::{SymbolError, SymbolHelper};
use gemscript_vm::Opcode;

use super::{missing, CompileCx, TokenDiagnostic};
use crate::error::CompileError;

pub(super) fn validate(_helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    if statement.len() < 2 {
        return vec![missing(1, "message")];
    }
    statement
        .tokens
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, token)| token.literal_value().is_none())
        .map(|(i, token)| {
            TokenDiagnostic::new(
                i,
                SymbolError::noparse(format!("expected a literal, found {}", token.kind().name())),
            )
        })
        .collect()
}

pub(super) fn compile(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let message = statement
        .args()
        .iter()
        .filter_map(Token::literal_value)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    cx.emit([Opcode::DebugOut(message)])
}
