//! Runtime interfaces and errors.
//!
//! [`AgentContext`] is the seam between the machine and the agent it runs
//! against: prop storage, feature decoration and method dispatch all live
//! on the other side of it.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use gemscript_foundation::{AgentId, Path, PropType, Value};

use crate::program::OpProgram;
use crate::state::Scopeable;

/// Errors raised while running a program.
///
/// Any of these aborts the current invocation. Agent mutations made before
/// the failure are kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// Attempted to pop from an empty data stack.
    #[error("stack underflow: tried to pop from empty stack")]
    StackUnderflow,

    /// The data or scope stack reached its configured limit.
    #[error("stack overflow: exceeded maximum depth of {limit}")]
    StackOverflow {
        /// Configured maximum depth.
        limit: usize,
    },

    /// Attempted to pop or read an empty scope stack.
    #[error("scope underflow: scope stack is empty")]
    ScopeUnderflow,

    /// A popped item was not of the kind the opcode requires.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Description of the expected kind.
        expected: &'static str,
        /// Description of what was found.
        found: String,
    },

    /// The agent has no prop at this path.
    #[error("prop not found: {0}")]
    PropNotFound(Path),

    /// The agent does not use this feature, or it is not registered.
    #[error("feature not found: {0}")]
    FeatureNotFound(String),

    /// The scoped object has no such method.
    #[error("method not found: {method} on {target}")]
    MethodNotFound {
        /// The object the method was looked up on.
        target: String,
        /// The method name.
        method: String,
    },

    /// A method was invoked with the wrong number of arguments.
    #[error("argument count mismatch calling {method}: expected {expected}, found {found}")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },

    /// A control opcode referenced a block that does not exist.
    #[error("invalid block reference: block {block}")]
    InvalidBlock {
        /// The missing block index.
        block: u32,
    },

    /// A prop was declared twice on the same agent.
    #[error("duplicate prop: {0}")]
    DuplicateProp(Path),

    /// A feature was added twice to the same agent.
    #[error("duplicate feature: {0}")]
    DuplicateFeature(String),

    /// Nested method programs went deeper than the configured limit.
    #[error("call depth exceeded: limit is {limit}")]
    CallDepthExceeded {
        /// Configured maximum nesting.
        limit: usize,
    },
}

/// Outcome of dispatching a method through [`AgentContext::invoke`].
#[derive(Debug, Clone)]
pub enum Invocation {
    /// The method ran natively and produced this result.
    Value(Option<Value>),
    /// The method is a program; the machine runs it in a nested state.
    Program(Arc<OpProgram>),
}

/// Access to the agent a program runs against.
///
/// Lookups are fail-fast: a missing prop or feature is an error, never a
/// default.
pub trait AgentContext {
    /// Identity of the running agent.
    fn agent_id(&self) -> AgentId;

    fn has_prop(&self, path: &Path) -> bool;

    fn has_feature(&self, name: &str) -> bool;

    /// Current value of a prop.
    fn prop_value(&self, path: &Path) -> Result<Value, ExecutionError>;

    /// Store a prop value, applying the prop's type and bounds.
    fn set_prop_value(&mut self, path: &Path, value: Value) -> Result<(), ExecutionError>;

    /// Declare a new prop on the agent.
    fn add_prop(&mut self, path: Path, kind: PropType, default: Value) -> Result<(), ExecutionError>;

    /// Decorate the agent with a feature's props and per-agent state.
    fn add_feature(&mut self, name: &str) -> Result<(), ExecutionError>;

    /// Dispatch `method` on a scoped object.
    fn invoke(
        &mut self,
        target: &Scopeable,
        method: &str,
        args: &[Value],
    ) -> Result<Invocation, ExecutionError>;

    /// Emit a script debug message.
    fn debug_out(&mut self, message: &str) {
        info!(target: "gemscript::script", agent = %self.agent_id(), "{}", message);
    }
}
