//! Blueprint compilation pipeline.
//!
//! 1. **Symbolize**: read the DEFINE declarations (`addProp`,
//!    `useFeature`) into the blueprint's [`SymbolData`]. Collisions fail
//!    the whole blueprint.
//! 2. **Validate**: check every statement, at every nesting level, with the
//!    resolver. Statements with error diagnostics are skipped.
//! 3. **Compile**: append the opcodes of each valid statement to the
//!    program of its phase.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use gemscript_ast::{Script, Token, PRAGMA};
use gemscript_foundation::ProgramKind;
use gemscript_symbols::{ScopeBuilder, Severity, SymbolData, SymbolHelper};

use crate::bundle::BlueprintBundle;
use crate::error::CompileError;
use crate::feature::FeatureRegistry;
use crate::keywords::{diagnose, prop_declaration, CompileCx, Diagnostic};

/// A compiled bundle together with the diagnostics of skipped or
/// partially-ignored statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileReport {
    pub bundle: BlueprintBundle,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity() == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Build a blueprint's top-level scope from its DEFINE declarations.
///
/// Returns the scope and the used feature names in declaration order.
pub fn symbolize(
    script: &Script,
    features: &FeatureRegistry,
) -> Result<(SymbolData, Vec<String>), CompileError> {
    let mut builder = ScopeBuilder::new();
    let mut used = Vec::new();
    let mut program = ProgramKind::Define;

    for statement in script.statements() {
        let ident = |i: usize| statement.token(i).and_then(Token::identifier);
        match statement.keyword() {
            Some(PRAGMA) if ident(1) == Some("PROGRAM") => {
                if let Some(kind) = ident(2) {
                    program = kind
                        .parse()
                        .map_err(|_| CompileError::UnknownProgram(kind.to_string()))?;
                }
            }
            Some(keyword @ ("addProp" | "useFeature")) if program != ProgramKind::Define => {
                return Err(CompileError::DeclarationOutsideDefine {
                    keyword: keyword.to_string(),
                });
            }
            Some("addProp") => {
                if let Some((name, kind, _)) = prop_declaration(statement) {
                    builder.prop(name, kind)?;
                }
            }
            Some("useFeature") => {
                if let Some(name) = ident(1) {
                    let feature = features
                        .get(name)
                        .ok_or_else(|| CompileError::UnknownFeature(name.to_string()))?;
                    builder.feature(name, feature.symbols()?)?;
                    used.push(name.to_string());
                }
            }
            _ => {}
        }
    }
    Ok((builder.build(), used))
}

/// Compile a script into a blueprint bundle.
///
/// `context` holds the scopes of other registered blueprints, visible to
/// cross-agent references.
///
/// # Errors
///
/// Any [`CompileError`] fails the blueprint as a whole. Statement-level
/// problems are reported in [`CompileReport::diagnostics`] instead.
pub fn compile_blueprint(
    script: &Script,
    features: &FeatureRegistry,
    context: &IndexMap<String, SymbolData>,
) -> Result<CompileReport, CompileError> {
    let (symbols, used) = symbolize(script, features)?;

    let helper = SymbolHelper::new(&symbols).with_context(context);
    let mut cx = CompileCx::new(script, helper);
    cx.compile_script()?;
    let (draft, diagnostics) = cx.finish();

    let name = draft.name.ok_or(CompileError::MissingName)?;
    debug!(
        blueprint = %name,
        programs = draft.programs.len(),
        features = used.len(),
        diagnostics = diagnostics.len(),
        "compiled blueprint"
    );
    Ok(CompileReport {
        bundle: BlueprintBundle {
            name,
            programs: draft.programs,
            symbols,
            tags: draft.tags,
            features: used,
        },
        diagnostics,
    })
}

/// Validate every statement of a script without compiling it.
///
/// Nested blocks are checked too, in arena order.
pub fn validate_script(
    script: &Script,
    features: &FeatureRegistry,
    context: &IndexMap<String, SymbolData>,
) -> Result<Vec<Diagnostic>, CompileError> {
    let (symbols, _) = symbolize(script, features)?;
    let mut helper = SymbolHelper::new(&symbols).with_context(context);
    let mut diagnostics = Vec::new();
    for (_, statements) in script.blocks() {
        for statement in statements {
            diagnostics.extend(diagnose(&mut helper, script, statement, 0));
        }
    }
    Ok(diagnostics)
}
