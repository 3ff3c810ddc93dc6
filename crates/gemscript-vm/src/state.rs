//! Per-invocation machine state.

use std::fmt;

use serde::{Deserialize, Serialize};

use gemscript_foundation::{AgentId, Path, Value};

use crate::runtime::ExecutionError;

/// An item on the data stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stackable {
    /// Plain data.
    Value(Value),
    /// An agent.
    Agent(AgentId),
    /// A reference to a prop on the running agent.
    Prop(Path),
    /// A feature of the running agent.
    Feature(String),
}

impl Stackable {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stackable::Value(_) => "value",
            Stackable::Agent(_) => "agent",
            Stackable::Prop(_) => "prop",
            Stackable::Feature(_) => "feature",
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Stackable::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Stackable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stackable::Value(v) => write!(f, "{}", v),
            Stackable::Agent(id) => write!(f, "{}", id),
            Stackable::Prop(path) => write!(f, "prop {}", path),
            Stackable::Feature(name) => write!(f, "feature {}", name),
        }
    }
}

/// An item on the scope stack: something methods and props can be looked
/// up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scopeable {
    Agent(AgentId),
    Prop(Path),
    Feature(String),
}

impl Scopeable {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scopeable::Agent(_) => "agent",
            Scopeable::Prop(_) => "prop",
            Scopeable::Feature(_) => "feature",
        }
    }
}

impl fmt::Display for Scopeable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scopeable::Agent(id) => write!(f, "{}", id),
            Scopeable::Prop(path) => write!(f, "prop {}", path),
            Scopeable::Feature(name) => write!(f, "feature {}", name),
        }
    }
}

impl From<Scopeable> for Stackable {
    fn from(scope: Scopeable) -> Self {
        match scope {
            Scopeable::Agent(id) => Stackable::Agent(id),
            Scopeable::Prop(path) => Stackable::Prop(path),
            Scopeable::Feature(name) => Stackable::Feature(name),
        }
    }
}

impl TryFrom<Stackable> for Scopeable {
    type Error = ExecutionError;

    fn try_from(item: Stackable) -> Result<Self, Self::Error> {
        match item {
            Stackable::Agent(id) => Ok(Scopeable::Agent(id)),
            Stackable::Prop(path) => Ok(Scopeable::Prop(path)),
            Stackable::Feature(name) => Ok(Scopeable::Feature(name)),
            Stackable::Value(v) => Err(ExecutionError::TypeMismatch {
                expected: "agent, prop or feature",
                found: format!("{} {}", v.type_name(), v),
            }),
        }
    }
}

/// Data stack and scope stack for one program invocation.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub stack: Vec<Stackable>,
    pub scope: Vec<Scopeable>,
    limit: Option<usize>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// State whose stacks may hold at most `limit` items each.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn check_room(&self, len: usize) -> Result<(), ExecutionError> {
        match self.limit {
            Some(limit) if len >= limit => Err(ExecutionError::StackOverflow { limit }),
            _ => Ok(()),
        }
    }

    pub fn push(&mut self, item: Stackable) -> Result<(), ExecutionError> {
        self.check_room(self.stack.len())?;
        self.stack.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Stackable, ExecutionError> {
        self.stack.pop().ok_or(ExecutionError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<&Stackable, ExecutionError> {
        self.stack.last().ok_or(ExecutionError::StackUnderflow)
    }

    pub fn push_scope(&mut self, scope: Scopeable) -> Result<(), ExecutionError> {
        self.check_room(self.scope.len())?;
        self.scope.push(scope);
        Ok(())
    }

    pub fn pop_scope(&mut self) -> Result<Scopeable, ExecutionError> {
        self.scope.pop().ok_or(ExecutionError::ScopeUnderflow)
    }

    pub fn peek_scope(&self) -> Result<&Scopeable, ExecutionError> {
        self.scope.last().ok_or(ExecutionError::ScopeUnderflow)
    }
}
