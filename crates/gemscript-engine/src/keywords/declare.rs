//! `addProp` and `useFeature`: DEFINE-program declarations.
//!
//! Both are also read by the symbolize pass, which builds the blueprint's
//! scope before any statement is validated.

use gemscript_ast::{Statement, Token};
use gemscript_foundation::{Path, PropType, Value};
use gemscript_symbols::{SymbolError, SymbolHelper};
use gemscript_vm::Opcode;

use super::{extra_tokens, missing, CompileCx, TokenDiagnostic};
use crate::error::CompileError;

pub(super) fn validate_add_prop(_helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    let mut diagnostics = Vec::new();
    match statement.token(1) {
        None => diagnostics.push(missing(1, "prop name")),
        Some(token) if token.identifier().is_none() => diagnostics.push(TokenDiagnostic::new(
            1,
            SymbolError::noparse(format!("prop name must be a name, found {}", token.kind().name())),
        )),
        Some(_) => {}
    }
    let kind = match statement.token(2) {
        None => {
            diagnostics.push(missing(2, "prop type"));
            None
        }
        Some(token) => match token.identifier().map(str::parse::<PropType>) {
            Some(Ok(kind)) => Some(kind),
            _ => {
                diagnostics.push(TokenDiagnostic::new(
                    2,
                    SymbolError::noparse("prop type must be Number, String or Boolean"),
                ));
                None
            }
        },
    };
    if let (Some(kind), Some(token)) = (kind, statement.token(3)) {
        match token.literal_value() {
            Some(value) if kind.accepts(value) => {}
            Some(value) => diagnostics.push(TokenDiagnostic::new(
                3,
                SymbolError::noparse(format!("default for {} prop cannot be {}", kind, value.type_name())),
            )),
            None => diagnostics.push(TokenDiagnostic::new(
                3,
                SymbolError::noparse("default value must be a literal"),
            )),
        }
    }
    diagnostics.extend(extra_tokens(statement, 4));
    diagnostics
}

/// The prop an `addProp` statement declares, if the statement is well formed.
///
/// Shared by the symbolize pass and the compiler so the scope only lists
/// props whose `AddProp` is actually emitted. A missing default is the
/// type's zero value.
pub(crate) fn prop_declaration(statement: &Statement) -> Option<(&str, PropType, Value)> {
    let name = statement.token(1).and_then(Token::identifier)?;
    let kind = statement
        .token(2)
        .and_then(Token::identifier)
        .and_then(|ty| ty.parse::<PropType>().ok())?;
    let default = match statement.token(3) {
        None => kind.zero(),
        Some(token) => token.literal_value().filter(|value| kind.accepts(value))?.clone(),
    };
    Some((name, kind, default))
}

pub(super) fn compile_add_prop(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    if !cx.in_define() {
        return Err(CompileError::DeclarationOutsideDefine {
            keyword: "addProp".to_string(),
        });
    }
    let Some((name, kind, default)) = prop_declaration(statement) else {
        return Ok(());
    };
    cx.emit([Opcode::AddProp {
        path: Path::from(name),
        kind,
        default,
    }])
}

pub(super) fn validate_use_feature(helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    let mut diagnostics = Vec::new();
    if statement.token(1).is_none() {
        diagnostics.push(missing(1, "feature name"));
    } else if let Err(err) = helper.feature_ref(statement.token(1)) {
        diagnostics.push(TokenDiagnostic::new(1, err));
    }
    diagnostics.extend(extra_tokens(statement, 2));
    diagnostics
}

pub(super) fn compile_use_feature(cx: &mut CompileCx<'_>, statement: &Statement) -> Result<(), CompileError> {
    if !cx.in_define() {
        return Err(CompileError::DeclarationOutsideDefine {
            keyword: "useFeature".to_string(),
        });
    }
    let name = cx.feature(statement.token(1))?;
    cx.emit([Opcode::AddFeature(name)])
}
