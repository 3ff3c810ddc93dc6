//! `featCall <Feature> <method> <args…>`
//!
//! Invokes a feature method with the running agent as implicit first
//! argument. The result is discarded.

use gemscript_ast::Statement;
use gemscript_symbols::SymbolHelper;
use gemscript_vm::Opcode;

use super::{check_method_call, missing, CompileCx, TokenDiagnostic};
use crate::error::CompileError;

pub(super) fn validate(helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    if statement.token(1).is_none() {
        return vec![missing(1, "feature name")];
    }
    if let Err(err) = helper.feature_ref(statement.token(1)) {
        return vec![TokenDiagnostic::new(1, err)];
    }
    check_method_call(helper, statement, 2, statement.len())
}

pub(super) fn compile(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    let feature = cx.feature(statement.token(1))?;
    let (method, args) = cx.method_call(statement, 2, statement.len())?;
    cx.emit([
        Opcode::AgentFeatureToScope(feature),
        Opcode::InvokeScoped {
            method,
            args,
            with_agent: true,
        },
        Opcode::Pop(1),
        Opcode::ScopePop,
        Opcode::ScopePop,
    ])
}
