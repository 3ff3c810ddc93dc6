//! Program executor.
//!
//! # Execution Model
//!
//! - One [`State`] per invocation, seeded empty (or with method arguments
//!   for nested calls)
//! - Opcodes run strictly in sequence within a block
//! - `IfTrue` and `Repeat` run their sub-blocks against the same state
//! - Program-backed methods run in a nested state; call depth is bounded
//!
//! The machine is idle between calls to [`Machine::run`]; it keeps no
//! state across invocations other than its limits.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use gemscript_foundation::{Path, Value};

use crate::opcode::Opcode;
use crate::program::{BlockId, OpProgram};
use crate::runtime::{AgentContext, ExecutionError, Invocation};
use crate::state::{Scopeable, Stackable, State};


/// Maximum depth of the data stack and the scope stack.
pub const MAX_STACK_DEPTH: usize = 1024;

/// Maximum nesting of program-backed method calls.
pub const MAX_CALL_DEPTH: usize = 64;

/// Resource limits for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineLimits {
    pub max_stack_depth: usize,
    pub max_call_depth: usize,
}

impl Default for MachineLimits {
    fn default() -> Self {
        Self {
            max_stack_depth: MAX_STACK_DEPTH,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// Result of a completed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Data stack left behind by the program.
    pub stack: Vec<Stackable>,
    /// Number of opcodes dispatched, including sub-blocks and nested calls.
    pub executed: usize,
}

impl RunOutcome {
    pub fn top(&self) -> Option<&Stackable> {
        self.stack.last()
    }
}

/// Runs compiled programs against one agent at a time.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    limits: MachineLimits,
    depth: usize,
    executed: usize,
}

impl Machine {
    pub fn new(limits: MachineLimits) -> Self {
        Self {
            limits,
            depth: 0,
            executed: 0,
        }
    }

    pub fn limits(&self) -> MachineLimits {
        self.limits
    }

    /// Run `program` against the agent behind `ctx`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionError`] raised. Agent mutations made
    /// before the error are not rolled back.
    pub fn run(
        &mut self,
        program: &OpProgram,
        ctx: &mut dyn AgentContext,
    ) -> Result<RunOutcome, ExecutionError> {
        self.run_with_stack(program, ctx, Vec::new())
    }

    /// Run `program` with `initial` already on the data stack.
    pub fn run_with_stack(
        &mut self,
        program: &OpProgram,
        ctx: &mut dyn AgentContext,
        initial: Vec<Stackable>,
    ) -> Result<RunOutcome, ExecutionError> {
        self.depth = 0;
        self.executed = 0;
        let mut state = State::with_limit(self.limits.max_stack_depth);
        for item in initial {
            state.push(item)?;
        }
        let result = self.execute_block(program, BlockId::ROOT, &mut state, ctx);
        if let Err(err) = &result {
            debug!(agent = %ctx.agent_id(), error = %err, executed = self.executed, "invocation aborted");
        }
        result?;
        Ok(RunOutcome {
            stack: state.stack,
            executed: self.executed,
        })
    }

    fn execute_block(
        &mut self,
        program: &OpProgram,
        block_id: BlockId,
        state: &mut State,
        ctx: &mut dyn AgentContext,
    ) -> Result<(), ExecutionError> {
        let block = program
            .block(block_id)
            .ok_or(ExecutionError::InvalidBlock {
                block: block_id.id(),
            })?;
        for op in &block.ops {
            trace!(op = op.name(), stack = state.stack.len(), scope = state.scope.len(), "dispatch");
            self.executed += 1;
            self.step(op, program, state, ctx)?;
        }
        Ok(())
    }

    fn step(
        &mut self,
        op: &Opcode,
        program: &OpProgram,
        state: &mut State,
        ctx: &mut dyn AgentContext,
    ) -> Result<(), ExecutionError> {
        match op {
            Opcode::Push(value) => state.push(Stackable::Value(value.clone()))?,
            Opcode::PushAgent => state.push(Stackable::Agent(ctx.agent_id()))?,
            Opcode::PushAgentProp(path) => {
                require_prop(ctx, path)?;
                state.push(Stackable::Prop(path.clone()))?;
            }
            Opcode::PushAgentPropValue(path) => {
                let value = ctx.prop_value(path)?;
                state.push(Stackable::Value(value))?;
            }
            Opcode::Pop(n) => {
                for _ in 0..*n {
                    state.pop()?;
                }
            }
            Opcode::Dup => {
                let top = state.peek()?.clone();
                state.push(top)?;
            }
            Opcode::PopAgentPropValue(path) => {
                let item = state.pop()?;
                let value = value_of(item, ctx)?;
                ctx.set_prop_value(path, value)?;
            }
            Opcode::SetAgentPropValue(path, value) => ctx.set_prop_value(path, value.clone())?,
            Opcode::StackToScope => {
                let item = state.pop()?;
                state.push_scope(Scopeable::try_from(item)?)?;
            }
            Opcode::ScopeToStack => {
                let scope = state.pop_scope()?;
                state.push(scope.into())?;
            }
            Opcode::ScopePop => {
                state.pop_scope()?;
            }
            Opcode::AgentToScope => state.push_scope(Scopeable::Agent(ctx.agent_id()))?,
            Opcode::AgentPropToScope(path) => {
                require_prop(ctx, path)?;
                state.push_scope(Scopeable::Prop(path.clone()))?;
            }
            Opcode::AgentFeatureToScope(name) => {
                if !ctx.has_feature(name) {
                    return Err(ExecutionError::FeatureNotFound(name.clone()));
                }
                state.push_scope(Scopeable::Agent(ctx.agent_id()))?;
                state.push_scope(Scopeable::Feature(name.clone()))?;
            }
            Opcode::ScopedProp(name) => {
                let path = scoped_path(state.peek_scope()?, name)?;
                require_prop(ctx, &path)?;
                state.push(Stackable::Prop(path))?;
            }
            Opcode::ScopedPropValue(name) => {
                let path = scoped_path(state.peek_scope()?, name)?;
                let value = ctx.prop_value(&path)?;
                state.push(Stackable::Value(value))?;
            }
            Opcode::InvokeScoped {
                method,
                args,
                with_agent,
            } => {
                let target = state.peek_scope()?.clone();
                let result = self.invoke(&target, method, args, *with_agent, ctx)?;
                state.push(result)?;
            }
            Opcode::AddProp {
                path,
                kind,
                default,
            } => ctx.add_prop(path.clone(), *kind, default.clone())?,
            Opcode::AddFeature(name) => ctx.add_feature(name)?,
            Opcode::IfTrue {
                consequent,
                alternate,
            } => {
                let test = value_of(state.pop()?, ctx)?;
                if test.truthy() {
                    self.execute_block(program, *consequent, state, ctx)?;
                } else if let Some(alternate) = alternate {
                    self.execute_block(program, *alternate, state, ctx)?;
                }
            }
            Opcode::Repeat { count, body } => {
                for _ in 0..*count {
                    self.execute_block(program, *body, state, ctx)?;
                }
            }
            Opcode::DebugOut(message) => ctx.debug_out(message),
        }
        Ok(())
    }

    /// Dispatch a scoped method and return the item to push.
    fn invoke(
        &mut self,
        target: &Scopeable,
        method: &str,
        args: &[Value],
        with_agent: bool,
        ctx: &mut dyn AgentContext,
    ) -> Result<Stackable, ExecutionError> {
        match ctx.invoke(target, method, args)? {
            Invocation::Value(result) => Ok(Stackable::Value(result.unwrap_or(Value::Null))),
            Invocation::Program(body) => {
                if self.depth >= self.limits.max_call_depth {
                    return Err(ExecutionError::CallDepthExceeded {
                        limit: self.limits.max_call_depth,
                    });
                }
                let mut nested = State::with_limit(self.limits.max_stack_depth);
                if with_agent {
                    nested.push(Stackable::Agent(ctx.agent_id()))?;
                }
                for arg in args {
                    nested.push(Stackable::Value(arg.clone()))?;
                }
                trace!(%target, method, depth = self.depth + 1, "enter method program");
                self.depth += 1;
                let result = self.execute_block(&body, BlockId::ROOT, &mut nested, ctx);
                self.depth -= 1;
                result?;
                Ok(nested.stack.pop().unwrap_or(Stackable::Value(Value::Null)))
            }
        }
    }
}

fn require_prop(ctx: &dyn AgentContext, path: &Path) -> Result<(), ExecutionError> {
    if ctx.has_prop(path) {
        Ok(())
    } else {
        Err(ExecutionError::PropNotFound(path.clone()))
    }
}

/// Path of a prop named relative to the top of the scope stack.
fn scoped_path(scope: &Scopeable, name: &str) -> Result<Path, ExecutionError> {
    match scope {
        Scopeable::Agent(_) => Ok(Path::new(vec![name.to_string()])),
        Scopeable::Feature(feature) => Ok(Path::feature_prop(feature, name)),
        Scopeable::Prop(path) => Err(ExecutionError::TypeMismatch {
            expected: "agent or feature in scope",
            found: format!("prop {}", path),
        }),
    }
}

/// Read a stack item as data. Prop references read through to their value.
fn value_of(item: Stackable, ctx: &dyn AgentContext) -> Result<Value, ExecutionError> {
    match item {
        Stackable::Value(value) => Ok(value),
        Stackable::Prop(path) => ctx.prop_value(&path),
        other => Err(ExecutionError::TypeMismatch {
            expected: "value or prop",
            found: other.to_string(),
        }),
    }
}
