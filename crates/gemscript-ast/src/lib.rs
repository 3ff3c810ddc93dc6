//! GEMSCRIPT token and statement model.
//!
//! Scripts are sequences of statements; a statement is a sequence of
//! tokens whose first token names a keyword. Tokens are one of four
//! shapes: bare identifiers, dotted object references, literals and
//! blocks of nested statements.
//!
//! # Design
//!
//! Nested blocks are not owned by the token that opens them. A [`Script`]
//! is an arena of blocks addressed by [`BlockId`]; a block token carries
//! only the id. The root block is always id 0.
//!
//! The model is pure data. [`serialize`] turns a script back into
//! canonical source text and [`lines`] flattens it into numbered editor
//! lines.

pub mod lines;
pub mod script;
pub mod serialize;
pub mod token;

pub use lines::{script_to_lines, Page, PageLine, TokenKey};
pub use script::{BlockId, Script};
pub use serialize::{statement_to_text, to_text};
pub use token::{Statement, Token, TokenKind, PRAGMA};
