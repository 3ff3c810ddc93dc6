//! Engine errors.
//!
//! - [`CompileError`]: the blueprint cannot be assembled at all. Nothing is
//!   registered. Per-statement problems are not errors; they are reported
//!   as [`Diagnostic`](crate::Diagnostic)s and the statement is skipped.
//! - [`EngineError`]: failures of the engine facade, wrapping compile and
//!   execution errors.

use thiserror::Error;

use gemscript_lexer::ParseError;
use gemscript_symbols::{DeclarationError, SymbolError};
use gemscript_vm::ExecutionError;

/// Blueprint assembly failures. Any of these blocks registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Source text could not be tokenized.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No `# BLUEPRINT Name` pragma.
    #[error("missing '# BLUEPRINT <name>' pragma")]
    MissingName,

    /// `useFeature` named a feature that is not registered.
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    /// Prop or feature declarations collide.
    #[error("declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// `addProp`/`useFeature` outside the top level of the DEFINE program.
    #[error("'{keyword}' is only allowed at the top level of the DEFINE program")]
    DeclarationOutsideDefine {
        /// The offending keyword.
        keyword: String,
    },

    /// `# PROGRAM` named an unknown program kind.
    #[error("unknown program kind '{0}'")]
    UnknownProgram(String),

    /// A pragma appeared inside a nested block.
    #[error("pragmas are only allowed at the top level")]
    PragmaInBlock,

    /// A block token referenced a block missing from the script.
    #[error("block {0} is missing from the script")]
    MissingBlock(u32),

    /// A feature declared an unparseable method signature.
    #[error("feature '{feature}': {message}")]
    InvalidFeature { feature: String, message: String },

    /// A statement that passed validation failed to resolve while compiling.
    #[error("unresolved reference after validation: {0}")]
    Unresolved(SymbolError),
}

/// Engine facade errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown blueprint '{0}'")]
    UnknownBlueprint(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
