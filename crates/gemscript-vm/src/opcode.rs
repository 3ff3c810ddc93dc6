//! Opcode definitions.

use serde::{Deserialize, Serialize};

use gemscript_foundation::{Path, PropType, Value};

use crate::program::BlockId;

/// One unit of stack machine behavior.
///
/// Every parameter is fixed at compile time. Opcodes hold no mutable
/// state; everything they change lives in the machine [`State`](crate::State)
/// or on the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    // === Stack ===
    /// Push a literal.
    Push(Value),
    /// Push the running agent.
    PushAgent,
    /// Push a reference to one of the agent's props.
    PushAgentProp(Path),
    /// Push the current value of one of the agent's props.
    PushAgentPropValue(Path),
    /// Discard the top `n` items.
    Pop(usize),
    /// Duplicate the top item.
    Dup,

    // === Agent props ===
    /// Pop a value (or prop reference, by its value) into an agent prop.
    PopAgentPropValue(Path),
    /// Set an agent prop directly from a literal.
    SetAgentPropValue(Path, Value),

    // === Stack <-> scope ===
    /// Move the top of stack onto the scope stack. Must be an agent,
    /// prop reference or feature.
    StackToScope,
    /// Move the top of the scope stack onto the data stack.
    ScopeToStack,
    /// Drop the top of the scope stack.
    ScopePop,
    /// Push the running agent onto the scope stack.
    AgentToScope,
    /// Push one of the agent's props onto the scope stack.
    AgentPropToScope(Path),
    /// Push the agent and then one of its features onto the scope stack.
    AgentFeatureToScope(String),

    // === Scoped indirection ===
    /// Push a reference to a prop of the top-of-scope agent or feature.
    ScopedProp(String),
    /// Push the value of a prop of the top-of-scope agent or feature.
    ScopedPropValue(String),
    /// Invoke a method on the top-of-scope object and push its result.
    ///
    /// With `with_agent`, methods backed by a program receive the running
    /// agent as an implicit first argument.
    InvokeScoped {
        method: String,
        args: Vec<Value>,
        with_agent: bool,
    },

    // === Declarations ===
    /// Add a prop to the agent.
    AddProp {
        path: Path,
        kind: PropType,
        default: Value,
    },
    /// Decorate the agent with a registered feature.
    AddFeature(String),

    // === Control ===
    /// Pop a test value; run `consequent` if truthy, else `alternate`.
    IfTrue {
        consequent: BlockId,
        alternate: Option<BlockId>,
    },
    /// Run `body` a fixed number of times.
    Repeat { count: u32, body: BlockId },
    /// Emit a debug message for the agent.
    DebugOut(String),
}

impl Opcode {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Push(_) => "push",
            Opcode::PushAgent => "pushAgent",
            Opcode::PushAgentProp(_) => "pushAgentProp",
            Opcode::PushAgentPropValue(_) => "pushAgentPropValue",
            Opcode::Pop(_) => "pop",
            Opcode::Dup => "dupe",
            Opcode::PopAgentPropValue(_) => "popAgentPropValue",
            Opcode::SetAgentPropValue(..) => "setAgentPropValue",
            Opcode::StackToScope => "stackToScope",
            Opcode::ScopeToStack => "scopeToStack",
            Opcode::ScopePop => "scopePop",
            Opcode::AgentToScope => "agentToScope",
            Opcode::AgentPropToScope(_) => "agentPropToScope",
            Opcode::AgentFeatureToScope(_) => "agentFeatureToScope",
            Opcode::ScopedProp(_) => "scopedProp",
            Opcode::ScopedPropValue(_) => "scopedPropValue",
            Opcode::InvokeScoped { .. } => "invokeScoped",
            Opcode::AddProp { .. } => "addProp",
            Opcode::AddFeature(_) => "addFeature",
            Opcode::IfTrue { .. } => "ifTrue",
            Opcode::Repeat { .. } => "repeat",
            Opcode::DebugOut(_) => "dbgOut",
        }
    }

    /// Items this opcode removes from the data stack.
    pub fn pops(&self) -> usize {
        match self {
            Opcode::Pop(n) => *n,
            Opcode::Dup
            | Opcode::PopAgentPropValue(_)
            | Opcode::StackToScope
            | Opcode::IfTrue { .. } => 1,
            _ => 0,
        }
    }

    /// Items this opcode adds to the data stack.
    pub fn pushes(&self) -> usize {
        match self {
            Opcode::Push(_)
            | Opcode::PushAgent
            | Opcode::PushAgentProp(_)
            | Opcode::PushAgentPropValue(_)
            | Opcode::ScopeToStack
            | Opcode::ScopedProp(_)
            | Opcode::ScopedPropValue(_)
            | Opcode::InvokeScoped { .. } => 1,
            Opcode::Dup => 2,
            _ => 0,
        }
    }

    /// Net change to the data stack depth, not counting sub-blocks.
    pub fn stack_effect(&self) -> isize {
        self.pushes() as isize - self.pops() as isize
    }

    /// Sub-blocks this opcode may run.
    pub fn blocks(&self) -> Vec<BlockId> {
        match self {
            Opcode::IfTrue {
                consequent,
                alternate,
            } => std::iter::once(*consequent).chain(*alternate).collect(),
            Opcode::Repeat { body, .. } => vec![*body],
            _ => Vec::new(),
        }
    }
}
