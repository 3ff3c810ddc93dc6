//! GEMSCRIPT VM - stack machine for compiled agent programs.
//!
//! A compiled program is an [`OpProgram`]: an arena of opcode blocks with
//! the entry point at block 0. [`Machine`] runs a program against one
//! agent, reached through the [`AgentContext`] trait, with a fresh
//! [`State`] (data stack plus scope stack) per invocation.
//!
//! # Design
//!
//! - Opcodes are plain data interpreted by a single dispatch loop
//! - Conditionals and loops run sub-blocks against the caller's state
//! - Methods backed by programs run in a nested state; their top of
//!   stack is pushed back onto the caller's stack
//! - Errors abort the current invocation only; mutations already applied
//!   to the agent stay in place

pub mod executor;
pub mod opcode;
pub mod program;
pub mod runtime;
pub mod state;

pub use executor::{Machine, MachineLimits, RunOutcome};
pub use opcode::Opcode;
pub use program::{BlockId, OpBlock, OpProgram};
pub use runtime::{AgentContext, ExecutionError, Invocation};
pub use state::{Scopeable, Stackable, State};
