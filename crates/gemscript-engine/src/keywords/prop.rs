//! `setProp` and `prop`: acting on one of the agent's props.

use gemscript_ast::{Statement, Token};
use gemscript_symbols::{SymbolError, SymbolHelper};
use gemscript_vm::Opcode;

use super::{check_agent_prop, check_method_call, extra_tokens, missing, CompileCx, TokenDiagnostic};
use crate::error::CompileError;

/// `setProp <prop> <literal>`
pub(super) fn validate_set_prop(helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    if let Err(diagnostic) = check_agent_prop(helper, statement, 1) {
        return vec![diagnostic];
    }
    let mut diagnostics = Vec::new();
    let kind = helper.cursor().kind;
    match statement.token(2) {
        None => diagnostics.push(missing(2, "value")),
        Some(token) => match (token.literal_value(), kind) {
            (Some(value), Some(kind)) if !kind.accepts(value) => diagnostics.push(TokenDiagnostic::new(
                2,
                SymbolError::noparse(format!("{} prop cannot be set to {}", kind, value.type_name())),
            )),
            (Some(_), _) => {}
            (None, _) => diagnostics.push(TokenDiagnostic::new(
                2,
                SymbolError::noparse(format!("expected a literal, found {}", token.kind().name())),
            )),
        },
    }
    diagnostics.extend(extra_tokens(statement, 3));
    diagnostics
}

pub(super) fn compile_set_prop(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let path = cx.agent_prop(statement.token(1))?;
    let value = statement
        .token(2)
        .and_then(Token::literal_value)
        .cloned()
        .ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("missing value")))?;
    cx.emit([Opcode::SetAgentPropValue(path, value)])
}

/// `prop <prop> <method> <args…>`
pub(super) fn validate_prop(helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    if let Err(diagnostic) = check_agent_prop(helper, statement, 1) {
        return vec![diagnostic];
    }
    check_method_call(helper, statement, 2, statement.len())
}

pub(super) fn compile_prop(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let path = cx.agent_prop(statement.token(1))?;
    let (method, args) = cx.method_call(statement, 2, statement.len())?;
    cx.emit([
        Opcode::AgentPropToScope(path),
        Opcode::InvokeScoped {
            method,
            args,
            with_agent: false,
        },
        Opcode::Pop(1),
        Opcode::ScopePop,
    ])
}
