//! Keyword dictionary: one compiler unit per keyword.
//!
//! Every keyword pairs a `validate` function, which checks a statement
//! against the blueprint scope through the resolver and reports
//! per-token diagnostics, with a `compile` function that appends opcodes
//! for an already-validated statement.
//!
//! # Design
//!
//! - The table is built once and looked up by keyword name
//! - Validation never touches a live agent; compilation never touches one
//!   either
//! - Block-bearing keywords compile their nested statements into new
//!   blocks of the current program through [`CompileCx::compile_block`]

mod control;
mod dbg_out;
mod declare;
mod feat_call;
mod pragma;
mod prop;

pub(crate) use declare::prop_declaration;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use gemscript_ast::{statement_to_text, BlockId, Script, Statement, Token, PRAGMA};
use gemscript_foundation::{Path, ProgramKind, Value};
use gemscript_symbols::{Severity, SymbolError, SymbolErrorCode, SymbolHelper};
use gemscript_vm::{OpBlock, OpProgram, Opcode};

use crate::error::CompileError;

/// Appends opcodes for a validated statement.
pub type CompileFn = fn(&mut CompileCx<'_>, &Statement) -> Result<(), CompileError>;

/// Checks a statement and returns its diagnostics.
pub type ValidateFn = fn(&mut SymbolHelper<'_>, &Statement) -> Vec<TokenDiagnostic>;

/// A keyword's compiler unit.
#[derive(Clone, Copy)]
pub struct KeywordSpec {
    pub name: &'static str,
    /// Argument names, for help text and editor hints.
    pub args: &'static [&'static str],
    pub compile: CompileFn,
    pub validate: ValidateFn,
}

impl fmt::Debug for KeywordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordSpec")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// All registered keywords.
pub fn keyword_specs() -> &'static [KeywordSpec] {
    static SPECS: OnceLock<Vec<KeywordSpec>> = OnceLock::new();
    SPECS.get_or_init(build_specs)
}

/// Look up a keyword by name.
pub fn keyword_for(name: &str) -> Option<&'static KeywordSpec> {
    keyword_specs().iter().find(|spec| spec.name == name)
}

fn build_specs() -> Vec<KeywordSpec> {
    macro_rules! keyword {
        ($name:expr, [$($arg:expr),*], $module:ident) => {
            KeywordSpec {
                name: $name,
                args: &[$($arg),*],
                compile: $module::compile,
                validate: $module::validate,
            }
        };
        ($name:expr, [$($arg:expr),*], $compile:path, $validate:path) => {
            KeywordSpec {
                name: $name,
                args: &[$($arg),*],
                compile: $compile,
                validate: $validate,
            }
        };
    }

    vec![
        keyword!(PRAGMA, ["directive", "value"], pragma),
        keyword!("addProp", ["name", "type", "default"], declare::compile_add_prop, declare::validate_add_prop),
        keyword!("useFeature", ["feature"], declare::compile_use_feature, declare::validate_use_feature),
        keyword!("setProp", ["prop", "value"], prop::compile_set_prop, prop::validate_set_prop),
        keyword!("prop", ["prop", "method", "args"], prop::compile_prop, prop::validate_prop),
        keyword!("featCall", ["feature", "method", "args"], feat_call),
        keyword!("ifProp", ["prop", "method", "args", "then", "else"], control::compile_if_prop, control::validate_if_prop),
        keyword!("repeat", ["count", "body"], control::compile_repeat, control::validate_repeat),
        keyword!("dbgOut", ["message"], dbg_out),
    ]
}

/// A diagnostic attached to one token of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDiagnostic {
    /// Token index within the statement; may point one past the end for
    /// missing arguments.
    pub token: usize,
    pub error: SymbolError,
}

impl TokenDiagnostic {
    pub fn new(token: usize, error: SymbolError) -> Self {
        Self { token, error }
    }
}

/// A diagnostic reported for a statement of a compiled script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Source text of the statement.
    pub statement: String,
    pub keyword: String,
    pub token: usize,
    pub error: SymbolError,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.error.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] token {}: {} in `{}`",
            self.severity(),
            self.keyword,
            self.token,
            self.error,
            self.statement.lines().next().unwrap_or_default()
        )
    }
}

/// Validate one statement from a clean resolver state.
pub fn validate_statement(helper: &mut SymbolHelper<'_>, statement: &Statement) -> Vec<TokenDiagnostic> {
    helper.reset();
    match statement.keyword() {
        None => vec![TokenDiagnostic::new(
            0,
            SymbolError::noparse("a statement must start with a keyword"),
        )],
        Some(keyword) => match keyword_for(keyword) {
            Some(spec) => (spec.validate)(helper, statement),
            None => vec![TokenDiagnostic::new(
                0,
                SymbolError::noexist(format!("unknown keyword '{}'", keyword)),
            )],
        },
    }
}

/// Validate and wrap diagnostics with statement context.
pub(crate) fn diagnose(
    helper: &mut SymbolHelper<'_>,
    script: &Script,
    statement: &Statement,
    level: usize,
) -> Vec<Diagnostic> {
    let keyword = statement.keyword().unwrap_or_default().to_string();
    validate_statement(helper, statement)
        .into_iter()
        .map(|d| Diagnostic {
            statement: statement_to_text(script, statement, level).trim().to_string(),
            keyword: keyword.clone(),
            token: d.token,
            error: d.error,
        })
        .collect()
}

// === Shared validation helpers ===

/// Resolve the reference at `index` as a prop of the running agent.
pub(crate) fn check_agent_prop(
    helper: &mut SymbolHelper<'_>,
    statement: &Statement,
    index: usize,
) -> Result<(), TokenDiagnostic> {
    let Some(token) = statement.token(index) else {
        return Err(TokenDiagnostic::new(
            index,
            SymbolError::new(SymbolErrorCode::Under, "missing prop reference"),
        ));
    };
    let resolved = helper
        .obj_ref(token)
        .map_err(|err| TokenDiagnostic::new(index, err))?;
    if resolved.agent_path().is_none() {
        return Err(TokenDiagnostic::new(
            index,
            SymbolError::noscope(format!(
                "'{}' belongs to another blueprint",
                resolved.segments.join(".")
            )),
        ));
    }
    if !resolved.is_prop() {
        return Err(TokenDiagnostic::new(
            index,
            SymbolError::noparse(format!("'{}' is a feature, not a prop", resolved.segments.join("."))),
        ));
    }
    Ok(())
}

/// Check the method name at `index` and its arguments up to `end` against
/// the scope the resolver is on. Arguments are only checked once the
/// method resolves.
pub(crate) fn check_method_call(
    helper: &mut SymbolHelper<'_>,
    statement: &Statement,
    index: usize,
    end: usize,
) -> Vec<TokenDiagnostic> {
    if let Err(err) = helper.scope_method(statement.token(index)) {
        return vec![TokenDiagnostic::new(index, err)];
    }
    let mut diagnostics = Vec::new();
    let args = statement.tokens.get(index + 1..end).unwrap_or(&[]);
    for (i, result) in helper.scope_args(args).into_iter().enumerate() {
        if let Err(err) = result {
            diagnostics.push(TokenDiagnostic::new(index + 1 + i, err));
        }
    }
    diagnostics
}

/// `over` warnings for tokens past the last expected one.
pub(crate) fn extra_tokens(statement: &Statement, from: usize) -> Vec<TokenDiagnostic> {
    statement
        .tokens
        .iter()
        .enumerate()
        .skip(from)
        .map(|(i, token)| {
            warn!(position = i, kind = token.kind().name(), "extra token ignored");
            TokenDiagnostic::new(
                i,
                SymbolError::new(
                    SymbolErrorCode::Over,
                    format!("extra {} at position {}", token.kind().name(), i),
                ),
            )
        })
        .collect()
}

/// `under` for a token that must be present.
pub(crate) fn missing(index: usize, what: &str) -> TokenDiagnostic {
    TokenDiagnostic::new(
        index,
        SymbolError::new(SymbolErrorCode::Under, format!("missing {}", what)),
    )
}

// === Compilation ===

/// Programs under construction, keyed by phase.
#[derive(Debug, Default)]
pub(crate) struct BundleDraft {
    pub name: Option<String>,
    pub tags: IndexMap<String, Value>,
    pub programs: BTreeMap<ProgramKind, OpProgram>,
}

/// Compilation state threaded through keyword compilers.
pub struct CompileCx<'a> {
    script: &'a Script,
    helper: SymbolHelper<'a>,
    draft: BundleDraft,
    current: ProgramKind,
    target: gemscript_vm::BlockId,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CompileCx<'a> {
    pub(crate) fn new(script: &'a Script, helper: SymbolHelper<'a>) -> Self {
        Self {
            script,
            helper,
            draft: BundleDraft::default(),
            current: ProgramKind::Define,
            target: gemscript_vm::BlockId::ROOT,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Compile every top-level statement.
    pub(crate) fn compile_script(&mut self) -> Result<(), CompileError> {
        let script = self.script;
        script
            .statements()
            .iter()
            .try_for_each(|statement| self.compile_statement(statement))
    }

    pub(crate) fn finish(self) -> (BundleDraft, Vec<Diagnostic>) {
        (self.draft, self.diagnostics)
    }

    /// Program kind statements are currently appended to.
    pub fn current_program(&self) -> ProgramKind {
        self.current
    }

    /// Nesting depth; 0 at the top level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn in_define(&self) -> bool {
        self.current == ProgramKind::Define && self.depth == 0
    }

    fn program_mut(&mut self) -> &mut OpProgram {
        self.draft.programs.entry(self.current).or_default()
    }

    /// Append opcodes to the block being compiled.
    pub fn emit(&mut self, ops: impl IntoIterator<Item = Opcode>) -> Result<(), CompileError> {
        let target = self.target;
        let block = self
            .program_mut()
            .block_mut(target)
            .ok_or(CompileError::MissingBlock(target.id()))?;
        block.ops.extend(ops);
        Ok(())
    }

    /// Compile a nested statement block into a new block of the current
    /// program.
    pub fn compile_block(&mut self, id: BlockId) -> Result<gemscript_vm::BlockId, CompileError> {
        let script = self.script;
        let statements = script.block(id).ok_or(CompileError::MissingBlock(id.id()))?;
        let block = self.program_mut().add_block(OpBlock::default());
        let saved = std::mem::replace(&mut self.target, block);
        self.depth += 1;
        let result = statements
            .iter()
            .try_for_each(|statement| self.compile_statement(statement));
        self.depth -= 1;
        self.target = saved;
        result.map(|()| block)
    }

    /// Validate a statement, record its diagnostics, and compile it unless
    /// an error-level diagnostic was found.
    pub fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        let diagnostics = diagnose(&mut self.helper, self.script, statement, self.depth);
        let blocked = diagnostics.iter().any(|d| d.severity() == Severity::Error);
        for diagnostic in &diagnostics {
            debug!(
                keyword = %diagnostic.keyword,
                token = diagnostic.token,
                code = %diagnostic.error.code,
                info = %diagnostic.error.info,
                "statement diagnostic"
            );
        }
        self.diagnostics.extend(diagnostics);
        if blocked {
            return Ok(());
        }
        let Some(spec) = statement.keyword().and_then(keyword_for) else {
            return Ok(());
        };
        self.helper.reset();
        (spec.compile)(self, statement)
    }

    /// Switch the program bucket subsequent statements go to.
    pub fn set_program(&mut self, kind: ProgramKind) -> Result<(), CompileError> {
        if self.depth > 0 {
            return Err(CompileError::PragmaInBlock);
        }
        self.current = kind;
        self.target = gemscript_vm::BlockId::ROOT;
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), CompileError> {
        if self.depth > 0 {
            return Err(CompileError::PragmaInBlock);
        }
        self.draft.name = Some(name.to_string());
        Ok(())
    }

    pub fn set_tag(&mut self, name: &str, value: Value) -> Result<(), CompileError> {
        if self.depth > 0 {
            return Err(CompileError::PragmaInBlock);
        }
        self.draft.tags.insert(name.to_string(), value);
        Ok(())
    }

    /// Agent path of a validated prop reference.
    pub fn agent_prop(&mut self, token: Option<&Token>) -> Result<Path, CompileError> {
        let token = token.ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("missing prop reference")))?;
        let resolved = self.helper.obj_ref(token).map_err(CompileError::Unresolved)?;
        match resolved.agent_path() {
            Some(path) if resolved.is_prop() => Ok(path),
            _ => Err(CompileError::Unresolved(SymbolError::noscope(format!(
                "'{}' is not a prop of the running agent",
                resolved.segments.join(".")
            )))),
        }
    }

    /// Resolve a feature name, leaving the resolver on its scope.
    pub fn feature(&mut self, token: Option<&Token>) -> Result<String, CompileError> {
        self.helper.feature_ref(token).map_err(CompileError::Unresolved)?;
        token
            .and_then(Token::identifier)
            .map(str::to_string)
            .ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("missing feature name")))
    }

    /// Method name at `index` plus its literal arguments, truncated to the
    /// declared arity. The resolver must already be on the target scope.
    pub fn method_call(
        &mut self,
        statement: &Statement,
        index: usize,
        end: usize,
    ) -> Result<(String, Vec<Value>), CompileError> {
        let signature = self
            .helper
            .scope_method(statement.token(index))
            .map_err(CompileError::Unresolved)?;
        let name = statement
            .token(index)
            .and_then(Token::identifier)
            .map(str::to_string)
            .ok_or_else(|| CompileError::Unresolved(SymbolError::noparse("missing method name")))?;
        let args = statement
            .tokens
            .get(index + 1..end)
            .unwrap_or(&[])
            .iter()
            .take(signature.arity())
            .filter_map(Token::literal_value)
            .cloned()
            .collect();
        Ok((name, args))
    }
}
