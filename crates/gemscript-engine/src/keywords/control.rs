//! Block-bearing keywords.
//!
//! ```text
//! ifProp energy greaterThan 5 [[
//!   dbgOut "strong"
//! ]] [[
//!   dbgOut "weak"
//! ]]
//! repeat 3 [[
//!   prop energy sub 1
//! ]]
//! ```

use gemscript_ast::{Statement, Token, TokenKind};
use gemscript_symbols::{SymbolError, SymbolErrorCode, SymbolHelper};
use gemscript_vm::Opcode;

use super::{check_agent_prop, check_method_call, missing, CompileCx, TokenDiagnostic};
use crate::error::CompileError;

/// Diagnostics for the tokens from `start` on, which must all be blocks:
/// at least one, at most `max`.
fn check_blocks(statement: &Statement, start: usize, max: usize) -> Vec<TokenDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = 0;
    for (i, token) in statement.tokens.iter().enumerate().skip(start) {
        if token.kind() != TokenKind::Block {
            diagnostics.push(TokenDiagnostic::new(
                i,
                SymbolError::noparse(format!("expected a block, found {}", token.kind().name())),
            ));
            continue;
        }
        seen += 1;
        if seen > max {
            diagnostics.push(TokenDiagnostic::new(
                i,
                SymbolError::new(SymbolErrorCode::Over, "extra block ignored"),
            ));
        }
    }
    if seen == 0 {
        diagnostics.push(missing(statement.len(), "block"));
    }
    diagnostics
}

/// `ifProp <prop> <method> <args…> [[then]] [[else]]?`
pub(super) fn validate_if_prop(helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    if let Err(diagnostic) = check_agent_prop(helper, statement, 1) {
        return vec![diagnostic];
    }
    let end = statement.first_block_index().unwrap_or(statement.len());
    let mut diagnostics = check_method_call(helper, statement, 2, end);
    diagnostics.extend(check_blocks(statement, end, 2));
    diagnostics
}

pub(super) fn compile_if_prop(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let end = statement.first_block_index().unwrap_or(statement.len());
    let path = cx.agent_prop(statement.token(1))?;
    let (method, args) = cx.method_call(statement, 2, end)?;

    let mut blocks = statement.tokens[end..].iter().filter_map(Token::block);
    let then = blocks
        .next()
        .ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("missing block")))?;
    let otherwise = blocks.next();
    let consequent = cx.compile_block(then)?;
    let alternate = otherwise.map(|block| cx.compile_block(block)).transpose()?;

    cx.emit([
        Opcode::AgentPropToScope(path),
        Opcode::InvokeScoped {
            method,
            args,
            with_agent: false,
        },
        Opcode::ScopePop,
        Opcode::IfTrue {
            consequent,
            alternate,
        },
    ])
}

fn repeat_count(token: &Token) -> Option<u32> {
    let n = token.literal_value()?.as_number()?;
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

/// `repeat <count> [[body]]`
pub(super) fn validate_repeat(_helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    let mut diagnostics = Vec::new();
    match statement.token(1) {
        None => diagnostics.push(missing(1, "repeat count")),
        Some(token) if repeat_count(token).is_none() => diagnostics.push(TokenDiagnostic::new(
            1,
            SymbolError::noparse("repeat count must be a non-negative whole number"),
        )),
        Some(_) => {}
    }
    diagnostics.extend(check_blocks(statement, 2, 1));
    diagnostics
}

pub(super) fn compile_repeat(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let count = statement
        .token(1)
        .and_then(repeat_count)
        .ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("invalid repeat count")))?;
    let body = statement
        .tokens
        .iter()
        .find_map(Token::block)
        .ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("missing block")))?;
    let body = cx.compile_block(body)?;
    cx.emit([Opcode::Repeat { count, body }])
}
