//! Symbol errors.
//!
//! Validation never aborts: each failed check yields a [`SymbolError`]
//! attached to the offending token, and the caller decides whether the
//! statement can still be compiled (see [`SymbolErrorCode::severity`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scope::SymbolData;

/// Category of a resolution failure.
///
/// # Invariant
///
/// The discriminant values must match the `SYMBOL_ERROR_NAMES` indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SymbolErrorCode {
    /// Malformed or unexpected token shape.
    NoParse = 0,
    /// Name does not resolve in the active scope, or an earlier error in
    /// the same statement suppressed this check.
    NoScope = 1,
    /// The scope has no dictionary for the lookup, or the entry is absent.
    NoExist = 2,
    /// More argument tokens than the method declares.
    Over = 3,
    /// Fewer argument tokens than the method declares.
    Under = 4,
    /// Internal inconsistency.
    Debug = 5,
}

const SYMBOL_ERROR_NAMES: &[&str] = &[
    "noparse", // 0: NoParse
    "noscope", // 1: NoScope
    "noexist", // 2: NoExist
    "over",    // 3: Over
    "under",   // 4: Under
    "debug",   // 5: Debug
];

impl SymbolErrorCode {
    pub fn name(self) -> &'static str {
        SYMBOL_ERROR_NAMES[self as usize]
    }

    /// Extra arguments are ignored with a warning; everything else blocks
    /// the statement from compiling.
    pub fn severity(self) -> Severity {
        match self {
            SymbolErrorCode::Over => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for SymbolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Statement still compiles.
    Warning,
    /// Statement is skipped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A typed resolution failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {info}")]
pub struct SymbolError {
    pub code: SymbolErrorCode,
    /// Human-readable explanation.
    pub info: String,
    /// The scope that was active when the check failed, if any.
    pub scope: Option<SymbolData>,
}

impl SymbolError {
    pub fn new(code: SymbolErrorCode, info: impl Into<String>) -> Self {
        Self {
            code,
            info: info.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: &SymbolData) -> Self {
        self.scope = Some(scope.clone());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn noparse(info: impl Into<String>) -> Self {
        Self::new(SymbolErrorCode::NoParse, info)
    }

    pub fn noscope(info: impl Into<String>) -> Self {
        Self::new(SymbolErrorCode::NoScope, info)
    }

    pub fn noexist(info: impl Into<String>) -> Self {
        Self::new(SymbolErrorCode::NoExist, info)
    }
}

/// A name collision found while building a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// A prop with this name is already declared.
    #[error("duplicate prop '{0}'")]
    DuplicateProp(String),

    /// A feature with this name is already used.
    #[error("duplicate feature '{0}'")]
    DuplicateFeature(String),

    /// A method with this name is already declared.
    #[error("duplicate method '{0}'")]
    DuplicateMethod(String),

    /// A prop and a feature would share one name in the same scope.
    #[error("'{0}' is declared as both a prop and a feature")]
    NamespaceCollision(String),

    /// The name is reserved by the resolver.
    #[error("'{0}' is a reserved name")]
    Reserved(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_names() {
        assert_eq!(SymbolErrorCode::NoParse.name(), "noparse");
        assert_eq!(SymbolErrorCode::NoScope.name(), "noscope");
        assert_eq!(SymbolErrorCode::NoExist.name(), "noexist");
        assert_eq!(SymbolErrorCode::Over.name(), "over");
        assert_eq!(SymbolErrorCode::Under.name(), "under");
        assert_eq!(SymbolErrorCode::Debug.name(), "debug");
    }

    #[test]
    fn test_only_over_is_a_warning() {
        assert_eq!(SymbolErrorCode::Over.severity(), Severity::Warning);
        assert_eq!(SymbolErrorCode::Under.severity(), Severity::Error);
    }

    #[test]
    fn test_display() {
        let err = SymbolError::noscope("'Nope' is not a prop or feature");
        assert_eq!(err.to_string(), "noscope: 'Nope' is not a prop or feature");
    }
}
