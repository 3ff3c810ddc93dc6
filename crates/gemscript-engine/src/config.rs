//! Engine configuration.

use serde::{Deserialize, Serialize};

use gemscript_vm::executor::{MAX_CALL_DEPTH, MAX_STACK_DEPTH};
use gemscript_vm::MachineLimits;

/// Tunables for program execution.
///
/// Deserializable so hosts can load it from their own config files;
/// missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum depth of the data stack and of the scope stack.
    pub max_stack_depth: usize,
    /// Maximum nesting of program-backed method calls.
    pub max_call_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: MAX_STACK_DEPTH,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn limits(&self) -> MachineLimits {
        MachineLimits {
            max_stack_depth: self.max_stack_depth,
            max_call_depth: self.max_call_depth,
        }
    }
}
