//! GEMSCRIPT Foundation
//!
//! Primitive types shared by every layer of the scripting engine: literal
//! values, property types and their method table, reference paths, agent
//! identities and program phases.
//!
//! Nothing in this crate has behavior beyond classification and
//! formatting; it exists so the token model, the symbol tables and the
//! stack machine agree on one vocabulary.

pub mod ids;
pub mod program;
pub mod prop_type;
pub mod value;

pub use ids::{AgentId, Path};
pub use program::{ProgramKind, PROGRAM_KINDS};
pub use prop_type::{ArgSpec, ArgType, MethodDecl, PropType};
pub use value::Value;
