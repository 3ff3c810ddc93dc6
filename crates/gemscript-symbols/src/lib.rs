//! Symbol tables and reference resolution for GEMSCRIPT.
//!
//! A [`SymbolData`] describes what names exist in a scope: props with
//! their type and methods, callable methods with their argument
//! signatures, and nested feature scopes. A blueprint's top-level scope is
//! its own props plus one nested scope per feature it uses.
//!
//! [`SymbolHelper`] walks statement tokens against those scopes and
//! reports [`SymbolError`]s for editor feedback and compile-time
//! validation.
//!
//! # Design
//!
//! - Scopes are plain data built once by [`ScopeBuilder`] and never
//!   patched; rebuilding a blueprint builds a new table.
//! - Resolution is side-effect free apart from the helper's own cursor, so
//!   it can be called repeatedly from tooling.

pub mod error;
pub mod resolver;
pub mod scope;

pub use error::{DeclarationError, Severity, SymbolError, SymbolErrorCode};
pub use resolver::{RefRoot, Resolved, SymbolHelper, Terminal, AGENT_KEYWORD};
pub use scope::{MethodSignature, ScopeBuilder, SymbolData};
